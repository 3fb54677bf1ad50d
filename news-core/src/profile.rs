use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api::ApiClient;
use crate::error::StoreError;
use crate::models::{ProfileUpdate, UserProfile};
use crate::persist::{keys, LocalStore};

pub const DEFAULT_PROFILE_IMAGE: &str = "/default-profile.png";

#[derive(Debug, Default)]
struct ProfileState {
    user: Option<UserProfile>,
    error: Option<String>,
}

/// User profile fetch/update. Requires a persisted user id; everything else is
/// delegated to the API client.
#[derive(Clone)]
pub struct ProfileStore {
    api: Option<ApiClient>,
    local: LocalStore,
    inner: Arc<RwLock<ProfileState>>,
}

impl ProfileStore {
    pub fn new(api: Option<ApiClient>, local: LocalStore) -> Self {
        Self {
            api,
            local,
            inner: Arc::new(RwLock::new(ProfileState::default())),
        }
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.inner.read().await.user.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.error.clone()
    }

    pub async fn profile_image_url(&self) -> String {
        self.inner
            .read()
            .await
            .user
            .as_ref()
            .and_then(|u| u.profile_image.clone())
            .unwrap_or_else(|| DEFAULT_PROFILE_IMAGE.to_string())
    }

    async fn current_user_id(&self) -> Result<String, StoreError> {
        let user_id: Option<String> = self.local.get(keys::USER_ID, None).await;
        user_id.ok_or(StoreError::NotLoggedIn)
    }

    pub async fn fetch_profile(&self) -> Result<UserProfile, StoreError> {
        let user_id = self.current_user_id().await?;
        let api = self.api.as_ref().ok_or(StoreError::NoApi)?;
        match api.fetch_user(&user_id).await {
            Ok(user) => {
                let mut state = self.inner.write().await;
                state.user = Some(user.clone());
                state.error = None;
                Ok(user)
            }
            Err(err) => {
                self.inner.write().await.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, StoreError> {
        let user_id = self.current_user_id().await?;
        let api = self.api.as_ref().ok_or(StoreError::NoApi)?;
        match api.update_user(&user_id, update).await {
            Ok(user) => {
                let mut state = self.inner.write().await;
                state.user = Some(user.clone());
                state.error = None;
                Ok(user)
            }
            Err(err) => {
                self.inner.write().await.error = Some(err.to_string());
                Err(err)
            }
        }
    }
}
