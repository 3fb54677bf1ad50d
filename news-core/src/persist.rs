use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Keys used by the stores. Everything is a JSON-serialized blob, one file per key.
pub mod keys {
    pub const USER_ID: &str = "user_id";
    pub const JWT: &str = "jwt";
    pub const USERNAME: &str = "username";
    pub const USER_NEWS: &str = "user_news";
    pub const VOTES: &str = "votes";
    pub const USER_COMMENTS: &str = "user_comments";
}

/// Typed get/set wrapper around durable key-value storage.
///
/// Reads never fail: a missing file, an unreadable file or malformed JSON all
/// resolve to the caller-supplied fallback, after trying the `.json.tmp`
/// sibling left behind by an interrupted write. Writes go through a temp file
/// and a rename so a crash cannot leave a half-written value.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: Option<PathBuf>,
    mem: Arc<RwLock<HashMap<String, Value>>>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            mem: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        if let Err(err) = tokio::fs::create_dir_all(&dir).await {
            warn!(error = %err, path = %dir.display(), "failed to create storage dir");
        }
        Self {
            dir: Some(dir),
            mem: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(format!("{key}.json")))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let Some(path) = self.path_for(key) else {
            let mem = self.mem.read().await;
            return match mem.get(key) {
                Some(value) => serde_json::from_value(value.clone()).unwrap_or(fallback),
                None => fallback,
            };
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => value,
                Err(err) => {
                    warn!(error = %err, path = %path.display(), "failed to parse JSON, trying tmp fallback");
                    let tmp = path.with_extension("json.tmp");
                    match tokio::fs::read(&tmp).await {
                        Ok(tmp_bytes) => serde_json::from_slice(&tmp_bytes).unwrap_or(fallback),
                        Err(_) => fallback,
                    }
                }
            },
            Err(_) => fallback,
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_value(value) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, key, "failed to serialize value for persistence");
                return;
            }
        };

        let Some(path) = self.path_for(key) else {
            self.mem.write().await.insert(key.to_string(), json);
            return;
        };

        let bytes = match serde_json::to_vec_pretty(&json) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, key, "failed to serialize value for persistence");
                return;
            }
        };
        if let Some(parent) = path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        let tmp = path.with_extension("json.tmp");
        if let Err(err) = tokio::fs::write(&tmp, &bytes).await {
            warn!(error = %err, path = %tmp.display(), "failed to write temp file");
            return;
        }
        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            warn!(error = %err, path = %path.display(), "failed to persist value");
        }
    }

    pub async fn remove(&self, key: &str) {
        if let Some(path) = self.path_for(key) {
            let _ = tokio::fs::remove_file(&path).await;
            let _ = tokio::fs::remove_file(path.with_extension("json.tmp")).await;
        } else {
            self.mem.write().await.remove(key);
        }
    }
}

/// Returns the client pseudo-identity, generating and persisting it on first use.
///
/// This stands in for authentication when no account system is in play; it is
/// not cryptographically meaningful. Logging in overwrites it with the server's
/// user id.
pub async fn client_user_id(store: &LocalStore) -> String {
    let existing: Option<String> = store.get(keys::USER_ID, None).await;
    if let Some(id) = existing {
        return id;
    }
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    let id = format!("user-{suffix}");
    store.set(keys::USER_ID, &id).await;
    debug!(%id, "generated client user id");
    id
}
