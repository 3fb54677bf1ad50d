use serde::Deserialize;
use tracing::warn;

use crate::models::{CommentItem, NewsItem, RawNewsItem, VoteItem};

const SEED_JSON: &str = include_str!("../assets/db.json");

/// Static fallback document: seed collections served when the remote API is
/// unreachable. Local persistence is merged on top of these by the store.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub news: Vec<NewsItem>,
    pub comments: Vec<CommentItem>,
    pub votes: Vec<VoteItem>,
    pub user_comments: Vec<CommentItem>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    news: Vec<RawNewsItem>,
    #[serde(default)]
    comments: Vec<CommentItem>,
    #[serde(default)]
    votes: Vec<VoteItem>,
    #[serde(default, rename = "userComments")]
    user_comments: Vec<CommentItem>,
}

impl Snapshot {
    /// The document bundled into the binary. Validity is covered by tests, so a
    /// parse failure here can only mean a broken build; it degrades to empty
    /// collections rather than aborting.
    pub fn bundled() -> Self {
        Self::from_json(SEED_JSON).unwrap_or_else(|err| {
            warn!(error = %err, "bundled snapshot failed to parse");
            Self::default()
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let raw: RawSnapshot = serde_json::from_str(raw)?;
        Ok(Self {
            news: raw
                .news
                .into_iter()
                .filter_map(RawNewsItem::normalize)
                .collect(),
            comments: raw.comments,
            votes: raw.votes,
            user_comments: raw.user_comments,
        })
    }
}
