use chrono::{DateTime, Utc};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::StoreError;
use crate::models::{
    CommentItem, NewComment, NewUser, NewsDraft, NewsItem, ProfileUpdate, RawNewsItem, UserProfile,
    VoteDir, VoteItem,
};
use crate::persist::{keys, LocalStore};

/// Thin request wrapper around the configured API base.
///
/// The bearer token is re-read from local persistence on every request, so a
/// login in one store is picked up by the next call without any wiring. No
/// retry, no backoff; failures propagate to the caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    client: Client,
    local: LocalStore,
}

impl ApiClient {
    pub fn new(base: impl Into<String>, client: Client, local: LocalStore) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            base,
            client,
            local,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json");
        let token: Option<String> = self.local.get(keys::JWT, None).await;
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request
    }

    fn check_status(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status,
                url: response.url().to_string(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        let response = self.request(Method::GET, path).await.send().await?;
        let response = Self::check_status(response)?;
        Ok(response.json().await?)
    }

    pub async fn fetch_news(&self) -> Result<Vec<NewsItem>, StoreError> {
        let raw: Vec<RawNewsItem> = self.get_json("/news").await?;
        let items = raw
            .into_iter()
            .filter_map(|record| {
                let item = record.normalize();
                if item.is_none() {
                    warn!("dropping news record without id");
                }
                item
            })
            .collect();
        Ok(items)
    }

    pub async fn fetch_comments(&self) -> Result<Vec<CommentItem>, StoreError> {
        self.get_json("/comments").await
    }

    pub async fn fetch_user_comments(&self) -> Result<Vec<CommentItem>, StoreError> {
        self.get_json("/userComments").await
    }

    pub async fn fetch_votes(&self) -> Result<Vec<VoteItem>, StoreError> {
        self.get_json("/votes").await
    }

    /// POSTs a draft and returns the server's canonical record. Some backends
    /// wrap the created record in `{ "data": ... }`; both shapes are accepted.
    pub async fn create_news(&self, draft: &NewsDraft) -> Result<NewsItem, StoreError> {
        let response = self
            .request(Method::POST, "/news")
            .await
            .json(draft)
            .send()
            .await?;
        let response = Self::check_status(response)?;
        let body: Value = response.json().await?;
        let record = match body.get("data") {
            Some(inner) if !inner.is_null() => inner.clone(),
            _ => body,
        };
        let raw: RawNewsItem = serde_json::from_value(record)?;
        raw.normalize().ok_or(StoreError::MissingId)
    }

    pub async fn create_vote(
        &self,
        news_id: &str,
        dir: VoteDir,
        user_id: &str,
    ) -> Result<VoteItem, StoreError> {
        let response = self
            .request(Method::POST, "/votes")
            .await
            .json(&json!({ "newsId": news_id, "dir": i8::from(dir), "userId": user_id }))
            .send()
            .await?;
        let response = Self::check_status(response)?;
        Ok(response.json().await?)
    }

    pub async fn update_vote(&self, vote_id: &str, dir: VoteDir) -> Result<(), StoreError> {
        let response = self
            .request(Method::PATCH, &format!("/votes/{vote_id}"))
            .await
            .json(&json!({ "dir": i8::from(dir) }))
            .send()
            .await?;
        Self::check_status(response)?;
        Ok(())
    }

    pub async fn create_comment(&self, comment: &NewComment) -> Result<CommentItem, StoreError> {
        let response = self
            .request(Method::POST, "/userComments")
            .await
            .json(comment)
            .send()
            .await?;
        let response = Self::check_status(response)?;
        Ok(response.json().await?)
    }

    pub async fn update_comment(
        &self,
        comment_id: &str,
        text: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let response = self
            .request(Method::PATCH, &format!("/userComments/{comment_id}"))
            .await
            .json(&json!({ "text": text, "updatedAt": updated_at }))
            .send()
            .await?;
        Self::check_status(response)?;
        Ok(())
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, &format!("/userComments/{comment_id}"))
            .await
            .send()
            .await?;
        Self::check_status(response)?;
        Ok(())
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Value, StoreError> {
        let response = self
            .request(Method::POST, "/auth/authenticate")
            .await
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        let response = Self::check_status(response)?;
        Ok(response.json().await?)
    }

    pub async fn register(&self, new_user: &NewUser) -> Result<Value, StoreError> {
        let response = self
            .request(Method::POST, "/auth/register")
            .await
            .json(new_user)
            .send()
            .await?;
        let response = Self::check_status(response)?;
        Ok(response.json().await?)
    }

    pub async fn fetch_user(&self, user_id: &str) -> Result<UserProfile, StoreError> {
        self.get_json(&format!("/users/{user_id}")).await
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, StoreError> {
        let response = self
            .request(Method::PUT, &format!("/users/{user_id}"))
            .await
            .json(update)
            .send()
            .await?;
        let response = Self::check_status(response)?;
        Ok(response.json().await?)
    }
}
