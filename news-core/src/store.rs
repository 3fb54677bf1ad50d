use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::StoreError;
use crate::models::{
    CommentItem, NewComment, NewsDraft, NewsItem, NewsStatus, VoteDir, VoteItem, VoteTally,
};
use crate::persist::{keys, LocalStore};
use crate::snapshot::Snapshot;
use crate::ui_state::UiState;

/// Where the store's data currently originates.
///
/// `Connected -> Degraded` happens on any fetch failure. The reverse transition
/// only happens through an explicit, successful [`NewsStore::fetch_news`]; the
/// store never retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    Connected,
    #[default]
    Degraded,
}

#[derive(Debug, Clone)]
pub enum StoreEvent {
    NewsChanged,
    VotesChanged,
    CommentsChanged,
    ConnectionChanged(ConnectionState),
}

#[derive(Debug, Default)]
struct StoreState {
    news: Vec<NewsItem>,
    seed_comments: Vec<CommentItem>,
    user_comments: Vec<CommentItem>,
    votes: Vec<VoteItem>,
    connection: ConnectionState,
}

/// In-memory list of news, comments and votes, reconciled against the remote
/// API with a bundled snapshot plus local persistence as fallback.
///
/// Cloning is cheap; clones share state. Consumers subscribe to change events
/// rather than polling. All dependencies are injected, so tests run against an
/// in-memory [`LocalStore`] and a mock server.
#[derive(Clone)]
pub struct NewsStore {
    inner: Arc<RwLock<StoreState>>,
    api: Option<ApiClient>,
    local: LocalStore,
    snapshot: Snapshot,
    user_id: String,
    events: broadcast::Sender<StoreEvent>,
}

impl NewsStore {
    pub fn new(
        api: Option<ApiClient>,
        local: LocalStore,
        snapshot: Snapshot,
        user_id: String,
    ) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            inner: Arc::new(RwLock::new(StoreState::default())),
            api,
            local,
            snapshot,
            user_id,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn connection(&self) -> ConnectionState {
        self.inner.read().await.connection
    }

    fn publish(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }

    /// Fetches all four collections in parallel and replaces the in-memory
    /// state atomically. Any failure degrades to the bundled snapshot merged
    /// with local persistence; the state is never left partially populated.
    pub async fn fetch_news(&self) {
        if let Some(api) = &self.api {
            let (news, seed_comments, votes, user_comments) = tokio::join!(
                api.fetch_news(),
                api.fetch_comments(),
                api.fetch_votes(),
                api.fetch_user_comments(),
            );
            match (news, seed_comments, votes, user_comments) {
                (Ok(mut news), Ok(seed_comments), Ok(votes), Ok(user_comments)) => {
                    sort_by_reported_at_desc(&mut news);
                    let changed = {
                        let mut state = self.inner.write().await;
                        state.news = news;
                        state.seed_comments = seed_comments;
                        state.votes = votes;
                        state.user_comments = user_comments;
                        let changed = state.connection != ConnectionState::Connected;
                        state.connection = ConnectionState::Connected;
                        changed
                    };
                    self.publish(StoreEvent::NewsChanged);
                    if changed {
                        info!("connected to {}", api.base());
                        self.publish(StoreEvent::ConnectionChanged(ConnectionState::Connected));
                    }
                    return;
                }
                (news, seed_comments, votes, user_comments) => {
                    let first_err = news
                        .err()
                        .map(|e| e.to_string())
                        .or_else(|| seed_comments.err().map(|e| e.to_string()))
                        .or_else(|| votes.err().map(|e| e.to_string()))
                        .or_else(|| user_comments.err().map(|e| e.to_string()))
                        .unwrap_or_default();
                    warn!(error = %first_err, "API not reachable, falling back to snapshot (read-only)");
                }
            }
        }
        self.load_fallback().await;
    }

    async fn load_fallback(&self) {
        let snapshot = self.snapshot.clone();
        let user_news: Vec<NewsItem> = self.local.get(keys::USER_NEWS, Vec::new()).await;
        let mut news = user_news;
        news.extend(snapshot.news);
        sort_by_reported_at_desc(&mut news);
        let votes = self.local.get(keys::VOTES, snapshot.votes).await;
        let user_comments = self
            .local
            .get(keys::USER_COMMENTS, snapshot.user_comments)
            .await;

        let changed = {
            let mut state = self.inner.write().await;
            state.news = news;
            state.seed_comments = snapshot.comments;
            state.votes = votes;
            state.user_comments = user_comments;
            let changed = state.connection != ConnectionState::Degraded;
            state.connection = ConnectionState::Degraded;
            changed
        };
        self.publish(StoreEvent::NewsChanged);
        if changed {
            self.publish(StoreEvent::ConnectionChanged(ConnectionState::Degraded));
        }
    }

    /// Creates a news item. Connected: the server record is canonical and a
    /// full re-fetch reconciles afterwards. Degraded: the item gets a
    /// timestamp-derived id and lands in local persistence. Either way the item
    /// is merged into memory immediately, newest id winning on collision.
    pub async fn add_news(&self, draft: NewsDraft) -> Result<NewsItem, StoreError> {
        let connected = self.connection().await == ConnectionState::Connected;
        let created = match (&self.api, connected) {
            (Some(api), true) => api.create_news(&draft).await?,
            _ => {
                let now = Utc::now();
                let reporter = match draft.reporter_name {
                    Some(name) if !name.is_empty() => name,
                    _ => self.local_author().await,
                };
                let item = NewsItem {
                    id: now.timestamp_millis().to_string(),
                    topic: draft.topic,
                    short_detail: draft.short_detail,
                    full_detail: draft.full_detail,
                    reporter_name: reporter,
                    reported_at: draft.reported_at.unwrap_or(now),
                    image_url: draft.image_url,
                    link: draft.link,
                };
                let mut user_news: Vec<NewsItem> = self.local.get(keys::USER_NEWS, Vec::new()).await;
                user_news.insert(0, item.clone());
                self.local.set(keys::USER_NEWS, &user_news).await;
                item
            }
        };

        {
            let mut state = self.inner.write().await;
            merge_unique_by_id(&mut state.news, created.clone());
            sort_by_reported_at_desc(&mut state.news);
        }
        self.publish(StoreEvent::NewsChanged);

        // Reflect canonical server data; a failure here degrades like any fetch.
        if connected {
            self.fetch_news().await;
        }
        Ok(created)
    }

    /// Records this client's vote, overwriting any previous direction for the
    /// same item. Look-up-then-write: the find and the write are separate round
    /// trips, so two near-simultaneous votes can still race (last write wins).
    pub async fn vote(&self, news_id: &str, dir: VoteDir) -> Result<(), StoreError> {
        let existing = {
            let state = self.inner.read().await;
            state
                .votes
                .iter()
                .find(|v| v.news_id == news_id && v.user_id == self.user_id)
                .cloned()
        };
        let connected = self.connection().await == ConnectionState::Connected;

        match (&self.api, connected) {
            (Some(api), true) => {
                match existing {
                    None => {
                        let saved = api.create_vote(news_id, dir, &self.user_id).await?;
                        self.inner.write().await.votes.push(saved);
                    }
                    Some(vote) => {
                        api.update_vote(&vote.id, dir).await?;
                        let mut state = self.inner.write().await;
                        if let Some(v) = state.votes.iter_mut().find(|v| v.id == vote.id) {
                            v.dir = dir;
                        }
                    }
                }
                // Reconcile with concurrent writers from other clients.
                match api.fetch_votes().await {
                    Ok(votes) => self.inner.write().await.votes = votes,
                    Err(err) => warn!(error = %err, "vote recorded but refresh failed"),
                }
            }
            _ => {
                let mut state = self.inner.write().await;
                match state
                    .votes
                    .iter_mut()
                    .find(|v| v.news_id == news_id && v.user_id == self.user_id)
                {
                    None => {
                        let vote = VoteItem {
                            id: local_vote_id(),
                            news_id: news_id.to_string(),
                            dir,
                            user_id: self.user_id.clone(),
                        };
                        state.votes.push(vote);
                    }
                    Some(vote) => vote.dir = dir,
                }
                drop(state);
                self.persist_votes().await;
            }
        }
        self.publish(StoreEvent::VotesChanged);
        Ok(())
    }

    pub async fn add_comment(
        &self,
        news_id: &str,
        text: &str,
        image_url: Option<String>,
    ) -> Result<CommentItem, StoreError> {
        let connected = self.connection().await == ConnectionState::Connected;
        let payload = NewComment {
            news_id: news_id.to_string(),
            author: self.local_author().await,
            text: text.to_string(),
            image_url,
            created_at: Utc::now(),
        };

        let saved = match (&self.api, connected) {
            (Some(api), true) => api.create_comment(&payload).await?,
            _ => CommentItem {
                id: Utc::now().timestamp_millis().to_string(),
                news_id: payload.news_id,
                author: payload.author,
                text: payload.text,
                image_url: payload.image_url,
                created_at: payload.created_at,
                updated_at: None,
            },
        };

        self.inner.write().await.user_comments.push(saved.clone());
        if !connected {
            self.persist_user_comments().await;
        }
        self.publish(StoreEvent::CommentsChanged);
        Ok(saved)
    }

    /// A failed remote edit surfaces as an error; the in-memory change is only
    /// applied after the server accepted it, but there is no rollback of the
    /// earlier optimistic state elsewhere (last write wins).
    pub async fn edit_comment(&self, comment_id: &str, text: &str) -> Result<(), StoreError> {
        let connected = self.connection().await == ConnectionState::Connected;
        let now = Utc::now();
        if let (Some(api), true) = (&self.api, connected) {
            api.update_comment(comment_id, text, now).await?;
        }

        {
            let mut state = self.inner.write().await;
            if let Some(comment) = state
                .user_comments
                .iter_mut()
                .find(|c| c.id == comment_id)
            {
                comment.text = text.to_string();
                comment.updated_at = Some(now);
            }
        }
        if !connected {
            self.persist_user_comments().await;
        }
        self.publish(StoreEvent::CommentsChanged);
        Ok(())
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Result<(), StoreError> {
        let connected = self.connection().await == ConnectionState::Connected;
        if let (Some(api), true) = (&self.api, connected) {
            api.delete_comment(comment_id).await?;
        }

        self.inner
            .write()
            .await
            .user_comments
            .retain(|c| c.id != comment_id);
        if !connected {
            self.persist_user_comments().await;
        }
        self.publish(StoreEvent::CommentsChanged);
        Ok(())
    }

    /// Whether a comment was written by this client (seed comments are read-only).
    pub async fn is_user_comment(&self, comment_id: &str) -> bool {
        self.inner
            .read()
            .await
            .user_comments
            .iter()
            .any(|c| c.id == comment_id)
    }

    pub async fn news_item(&self, news_id: &str) -> Option<NewsItem> {
        let state = self.inner.read().await;
        state.news.iter().find(|n| n.id == news_id).cloned()
    }

    pub async fn status_for(&self, news_id: &str) -> NewsStatus {
        let state = self.inner.read().await;
        status_of(&state.votes, news_id)
    }

    pub async fn votes_for(&self, news_id: &str) -> VoteTally {
        let state = self.inner.read().await;
        let mut tally = VoteTally::default();
        for vote in state.votes.iter().filter(|v| v.news_id == news_id) {
            match vote.dir {
                VoteDir::NotFake => tally.up += 1,
                VoteDir::Fake => tally.down += 1,
            }
            if vote.user_id == self.user_id {
                tally.my_vote = Some(vote.dir);
            }
        }
        tally
    }

    /// Seed and user comments for one item, newest first.
    pub async fn comments_for(&self, news_id: &str) -> Vec<CommentItem> {
        let state = self.inner.read().await;
        let mut comments: Vec<CommentItem> = state
            .seed_comments
            .iter()
            .chain(state.user_comments.iter())
            .filter(|c| c.news_id == news_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        comments
    }

    pub async fn filtered_news(&self, ui: &UiState) -> Vec<NewsItem> {
        let state = self.inner.read().await;
        let needle = ui.search().to_lowercase();
        state
            .news
            .iter()
            .filter(|n| ui.filter().matches(status_of(&state.votes, &n.id)))
            .filter(|n| {
                needle.is_empty()
                    || n.topic.to_lowercase().contains(&needle)
                    || n.short_detail.to_lowercase().contains(&needle)
                    || n.reporter_name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    pub async fn paged_news(&self, ui: &UiState) -> Vec<NewsItem> {
        let filtered = self.filtered_news(ui).await;
        let start = ui.start_index().min(filtered.len());
        let end = ui.end_index().min(filtered.len());
        filtered[start..end].to_vec()
    }

    pub async fn total_pages(&self, ui: &UiState) -> usize {
        let len = self.filtered_news(ui).await.len();
        ui.total_pages(len)
    }

    async fn local_author(&self) -> String {
        let username: Option<String> = self.local.get(keys::USERNAME, None).await;
        username.unwrap_or_else(|| "You".to_string())
    }

    async fn persist_votes(&self) {
        let votes = self.inner.read().await.votes.clone();
        self.local.set(keys::VOTES, &votes).await;
    }

    async fn persist_user_comments(&self) {
        let user_comments = self.inner.read().await.user_comments.clone();
        self.local.set(keys::USER_COMMENTS, &user_comments).await;
    }
}

fn status_of(votes: &[VoteItem], news_id: &str) -> NewsStatus {
    let mut up = 0usize;
    let mut down = 0usize;
    for vote in votes.iter().filter(|v| v.news_id == news_id) {
        match vote.dir {
            VoteDir::NotFake => up += 1,
            VoteDir::Fake => down += 1,
        }
    }
    if up > down {
        NewsStatus::NonFake
    } else if down > up {
        NewsStatus::Fake
    } else {
        NewsStatus::Neutral
    }
}

// Stable sort: equal timestamps keep their insertion order.
fn sort_by_reported_at_desc(news: &mut [NewsItem]) {
    news.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
}

fn merge_unique_by_id(news: &mut Vec<NewsItem>, item: NewsItem) {
    news.retain(|n| n.id != item.id);
    news.insert(0, item);
}

fn local_vote_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}
