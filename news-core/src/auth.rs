use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::api::ApiClient;
use crate::error::StoreError;
use crate::models::NewUser;
use crate::persist::{keys, LocalStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub user_id: String,
}

/// Session token lifecycle. No refresh and no expiry tracking: a stale token
/// simply fails server-side on the next request.
#[derive(Clone)]
pub struct AuthStore {
    api: Option<ApiClient>,
    local: LocalStore,
    session: Arc<RwLock<Option<Session>>>,
}

impl AuthStore {
    /// Restores any persisted session from local storage.
    pub async fn load(api: Option<ApiClient>, local: LocalStore) -> Self {
        let token: Option<String> = local.get(keys::JWT, None).await;
        let username: Option<String> = local.get(keys::USERNAME, None).await;
        let user_id: Option<String> = local.get(keys::USER_ID, None).await;
        let session = match (token, username, user_id) {
            (Some(token), Some(username), Some(user_id)) => Some(Session {
                token,
                username,
                user_id,
            }),
            _ => None,
        };
        Self {
            api,
            local,
            session: Arc::new(RwLock::new(session)),
        }
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// Authenticates and persists the identity. The token field name varies
    /// between backends, so several spellings are accepted; an answer without a
    /// token or user id is rejected outright.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, StoreError> {
        let api = self.api.as_ref().ok_or(StoreError::NoApi)?;
        let body = api.authenticate(username, password).await?;
        let token = extract_token(&body).ok_or(StoreError::NoToken)?;
        let user_id = extract_user_id(&body).ok_or(StoreError::NoUserId)?;

        let session = Session {
            token: token.clone(),
            username: username.to_string(),
            user_id: user_id.clone(),
        };
        self.local.set(keys::JWT, &token).await;
        self.local.set(keys::USERNAME, &username).await;
        self.local.set(keys::USER_ID, &user_id).await;
        *self.session.write().await = Some(session.clone());
        info!(%username, "logged in");
        Ok(session)
    }

    pub async fn register(&self, new_user: &NewUser) -> Result<Value, StoreError> {
        let api = self.api.as_ref().ok_or(StoreError::NoApi)?;
        api.register(new_user).await
    }

    /// Clears the in-memory session and every persisted identity key.
    pub async fn logout(&self) {
        *self.session.write().await = None;
        self.local.remove(keys::JWT).await;
        self.local.remove(keys::USERNAME).await;
        self.local.remove(keys::USER_ID).await;
        info!("logged out");
    }
}

fn extract_token(body: &Value) -> Option<String> {
    ["token", "accessToken", "jwt", "access_token"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::to_owned)
        .or_else(|| {
            body.pointer("/data/token")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
}

fn extract_user_id(body: &Value) -> Option<String> {
    match body.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
