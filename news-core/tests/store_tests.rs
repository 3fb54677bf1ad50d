use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use news_core::{
    ApiClient, ConnectionState, LocalStore, NewsDraft, NewsStore, Snapshot, StoreEvent, UiState,
    VoteDir,
};

fn store_with_api(server: &MockServer, local: LocalStore) -> NewsStore {
    let api = ApiClient::new(server.uri(), Client::new(), local.clone());
    NewsStore::new(Some(api), local, Snapshot::bundled(), "tester-1".into())
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_news_replaces_state_and_connects() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/news",
        json!([
            { "id": 1, "topic": "Old", "short": "s", "reportedAt": "2025-01-01T00:00:00Z" },
            { "id": "n9", "topic": "New", "shortDetail": "s", "reportedAt": "2025-06-01T00:00:00Z" }
        ]),
    )
    .await;
    mount_json(&server, "/comments", json!([])).await;
    mount_json(&server, "/votes", json!([])).await;
    mount_json(&server, "/userComments", json!([])).await;

    let store = store_with_api(&server, LocalStore::in_memory());
    let mut events = store.subscribe();
    store.fetch_news().await;

    assert_eq!(store.connection().await, ConnectionState::Connected);
    let ui = UiState::default();
    let news = store.filtered_news(&ui).await;
    assert_eq!(news.len(), 2);
    // Sorted by reportedAt descending, numeric id coerced to string.
    assert_eq!(news[0].id, "n9");
    assert_eq!(news[1].id, "1");

    let mut saw_connected = false;
    while let Ok(evt) = events.try_recv() {
        if matches!(evt, StoreEvent::ConnectionChanged(ConnectionState::Connected)) {
            saw_connected = true;
        }
    }
    assert!(saw_connected, "subscribers should learn about the transition");
}

#[tokio::test]
async fn failed_fetch_falls_back_to_snapshot_fully_populated() {
    // /news works, /votes does not: the store must not keep a half-applied
    // server state.
    let server = MockServer::start().await;
    mount_json(&server, "/news", json!([{ "id": "api-1", "topic": "From API" }])).await;
    mount_json(&server, "/comments", json!([])).await;
    mount_json(&server, "/userComments", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/votes"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = store_with_api(&server, LocalStore::in_memory());
    store.fetch_news().await;

    assert_eq!(store.connection().await, ConnectionState::Degraded);
    let ui = UiState::default();
    let news = store.filtered_news(&ui).await;
    assert!(!news.is_empty(), "fallback must populate the news list");
    assert!(
        news.iter().all(|n| n.id != "api-1"),
        "no partial server data may leak into the fallback state"
    );
    // Snapshot votes came along too.
    assert!(store.votes_for("n1").await.up > 0);
}

#[tokio::test]
async fn unreachable_api_degrades_and_stays_degraded_until_explicit_refresh() {
    let server = MockServer::start().await;
    // First fetch succeeds, afterwards the server "goes away".
    for route in ["/news", "/comments", "/votes", "/userComments"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }

    let store = store_with_api(&server, LocalStore::in_memory());
    store.fetch_news().await;
    assert_eq!(store.connection().await, ConnectionState::Connected);

    store.fetch_news().await;
    assert_eq!(store.connection().await, ConnectionState::Degraded);

    // No background recovery: still degraded until someone calls fetch_news.
    assert_eq!(store.connection().await, ConnectionState::Degraded);
}

#[tokio::test]
async fn vote_creates_then_overwrites_one_record() {
    let server = MockServer::start().await;
    mount_json(&server, "/news", json!([{ "id": "n1", "topic": "t" }])).await;
    mount_json(&server, "/comments", json!([])).await;
    mount_json(&server, "/userComments", json!([])).await;

    // Votes collection over time: empty at fetch, then the created vote, then
    // the overwritten one.
    Mock::given(method("GET"))
        .and(path("/votes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/votes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!([{ "id": "sv1", "newsId": "n1", "dir": 1, "userId": "tester-1" }]),
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/votes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!([{ "id": "sv1", "newsId": "n1", "dir": -1, "userId": "tester-1" }]),
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/votes"))
        .and(body_json(json!({ "newsId": "n1", "dir": 1, "userId": "tester-1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(
            json!({ "id": "sv1", "newsId": "n1", "dir": 1, "userId": "tester-1" }),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/votes/sv1"))
        .and(body_json(json!({ "dir": -1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with_api(&server, LocalStore::in_memory());
    store.fetch_news().await;

    store.vote("n1", VoteDir::NotFake).await.expect("first vote");
    store.vote("n1", VoteDir::Fake).await.expect("second vote");

    let tally = store.votes_for("n1").await;
    assert_eq!((tally.up, tally.down), (0, 1), "overwrite, not accumulation");
    assert_eq!(tally.my_vote, Some(VoteDir::Fake));
}

#[tokio::test]
async fn add_news_posts_and_reconciles_with_server() {
    let server = MockServer::start().await;
    mount_json(&server, "/comments", json!([])).await;
    mount_json(&server, "/votes", json!([])).await;
    mount_json(&server, "/userComments", json!([])).await;

    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!([{ "id": "n1", "topic": "Seed", "reportedAt": "2025-01-01T00:00:00Z" }]),
        ))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "n1", "topic": "Seed", "reportedAt": "2025-01-01T00:00:00Z" },
            { "id": "srv-2", "topic": "Created", "reportedAt": "2025-07-01T00:00:00Z" }
        ])))
        .mount(&server)
        .await;

    // The server wraps the created record, which must be unwrapped.
    Mock::given(method("POST"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "srv-2", "topic": "Created", "reportedAt": "2025-07-01T00:00:00Z" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with_api(&server, LocalStore::in_memory());
    store.fetch_news().await;

    let created = store
        .add_news(NewsDraft {
            topic: "Created".into(),
            ..Default::default()
        })
        .await
        .expect("create news");
    assert_eq!(created.id, "srv-2");

    let ui = UiState::default();
    let news = store.filtered_news(&ui).await;
    assert_eq!(news.len(), 2);
    assert_eq!(news[0].id, "srv-2", "newest item first after reconcile");
    assert_eq!(store.connection().await, ConnectionState::Connected);
}

#[tokio::test]
async fn comment_crud_round_trip_against_api() {
    let server = MockServer::start().await;
    mount_json(&server, "/news", json!([{ "id": "n1", "topic": "t" }])).await;
    mount_json(&server, "/comments", json!([])).await;
    mount_json(&server, "/votes", json!([])).await;
    mount_json(&server, "/userComments", json!([])).await;

    Mock::given(method("POST"))
        .and(path("/userComments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 41,
            "newsId": "n1",
            "author": "You",
            "text": "first",
            "createdAt": "2025-05-01T10:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/userComments/41"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/userComments/41"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with_api(&server, LocalStore::in_memory());
    store.fetch_news().await;

    let saved = store.add_comment("n1", "first", None).await.expect("add");
    assert_eq!(saved.id, "41");
    assert_eq!(store.comments_for("n1").await.len(), 1);

    store.edit_comment("41", "edited").await.expect("edit");
    let comments = store.comments_for("n1").await;
    assert_eq!(comments[0].text, "edited");
    assert!(comments[0].updated_at.is_some());

    store.delete_comment("41").await.expect("delete");
    assert!(store.comments_for("n1").await.is_empty());
}
