use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use news_core::persist::keys;
use news_core::{ApiClient, AuthStore, LocalStore, ProfileStore, ProfileUpdate, StoreError};

fn api(server: &MockServer, local: &LocalStore) -> ApiClient {
    ApiClient::new(server.uri(), Client::new(), local.clone())
}

#[tokio::test]
async fn login_accepts_token_field_variants_and_persists_identity() {
    // Backends disagree on the token field name; all spellings must work.
    for field in ["token", "accessToken", "jwt", "access_token"] {
        let server = MockServer::start().await;
        let mut body = json!({ "id": 7 });
        body[field] = json!("tok-1");
        Mock::given(method("POST"))
            .and(path("/auth/authenticate"))
            .and(body_json(json!({ "username": "alice", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let local = LocalStore::in_memory();
        let auth = AuthStore::load(Some(api(&server, &local)), local.clone()).await;
        let session = auth.login("alice", "pw").await.expect("login");
        assert_eq!(session.token, "tok-1");
        assert_eq!(session.user_id, "7");

        let token: Option<String> = local.get(keys::JWT, None).await;
        assert_eq!(token.as_deref(), Some("tok-1"));
        let user_id: Option<String> = local.get(keys::USER_ID, None).await;
        assert_eq!(user_id.as_deref(), Some("7"));
        assert!(auth.is_logged_in().await);
    }
}

#[tokio::test]
async fn login_rejects_responses_without_token_or_user_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7 })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "tok-1" })))
        .mount(&server)
        .await;

    let local = LocalStore::in_memory();
    let auth = AuthStore::load(Some(api(&server, &local)), local.clone()).await;

    let err = auth.login("alice", "pw").await.expect_err("no token");
    assert!(matches!(err, StoreError::NoToken));

    let err = auth.login("alice", "pw").await.expect_err("no user id");
    assert!(matches!(err, StoreError::NoUserId));

    assert!(!auth.is_logged_in().await);
    let token: Option<String> = local.get(keys::JWT, None).await;
    assert_eq!(token, None, "failed logins persist nothing");
}

#[tokio::test]
async fn logout_clears_session_and_persisted_keys() {
    let local = LocalStore::in_memory();
    local.set(keys::JWT, &"tok-1".to_string()).await;
    local.set(keys::USERNAME, &"alice".to_string()).await;
    local.set(keys::USER_ID, &"7".to_string()).await;

    let auth = AuthStore::load(None, local.clone()).await;
    assert!(auth.is_logged_in().await, "session restored from persistence");

    auth.logout().await;
    assert!(!auth.is_logged_in().await);
    for key in [keys::JWT, keys::USERNAME, keys::USER_ID] {
        let value: Option<String> = local.get(key, None).await;
        assert_eq!(value, None, "{key} should be cleared");
    }
}

#[tokio::test]
async fn bearer_token_is_attached_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let local = LocalStore::in_memory();
    local.set(keys::JWT, &"tok-1".to_string()).await;
    let news = api(&server, &local).fetch_news().await.expect("authorized");
    assert!(news.is_empty());
}

#[tokio::test]
async fn profile_requires_identity_then_fetches_and_updates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "Alice",
            "username": "alice"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "Alicia",
            "username": "alice",
            "profileImage": "https://example.com/a.png"
        })))
        .mount(&server)
        .await;

    let local = LocalStore::in_memory();
    let profile = ProfileStore::new(Some(api(&server, &local)), local.clone());

    // Identity is checked before any network call.
    let err = profile.fetch_profile().await.expect_err("not logged in");
    assert!(matches!(err, StoreError::NotLoggedIn));

    local.set(keys::USER_ID, &"7".to_string()).await;
    let user = profile.fetch_profile().await.expect("fetch");
    assert_eq!(user.name.as_deref(), Some("Alice"));
    assert_eq!(
        profile.profile_image_url().await,
        news_core::profile::DEFAULT_PROFILE_IMAGE
    );

    let updated = profile
        .update_profile(&ProfileUpdate {
            name: "Alicia".into(),
            surname: String::new(),
            username: "alice".into(),
            email: String::new(),
        })
        .await
        .expect("update");
    assert_eq!(updated.name.as_deref(), Some("Alicia"));
    assert_eq!(
        profile.profile_image_url().await,
        "https://example.com/a.png"
    );
}
