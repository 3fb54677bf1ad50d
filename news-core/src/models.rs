use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Upstream collections mix numeric and string ids; everything is a string in memory.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Num(i64),
    Str(String),
}

impl From<IdRepr> for String {
    fn from(id: IdRepr) -> Self {
        match id {
            IdRepr::Num(n) => n.to_string(),
            IdRepr::Str(s) => s,
        }
    }
}

pub(crate) fn id_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    IdRepr::deserialize(de).map(String::from)
}

pub(crate) fn opt_id_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<IdRepr>::deserialize(de).map(|id| id.map(String::from))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub topic: String,
    pub short_detail: String,
    pub full_detail: String,
    pub reporter_name: String,
    pub reported_at: DateTime<Utc>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// Wire shape of a news record. Upstream backends disagree on field names
/// (`short` vs `shortDetail`, `reporter` vs `reporterName`, three spellings of
/// the timestamp), so every field is optional here and the aliases are resolved
/// exactly once, in [`RawNewsItem::normalize`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNewsItem {
    #[serde(default, deserialize_with = "opt_id_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, rename = "shortDetail", alias = "short")]
    pub short_detail: Option<String>,
    #[serde(default, rename = "fullDetail", alias = "detail", alias = "details")]
    pub full_detail: Option<String>,
    #[serde(default, rename = "reporterName", alias = "reporter")]
    pub reporter_name: Option<String>,
    #[serde(default, rename = "reportedAt", alias = "dateTime", alias = "date")]
    pub reported_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "imageUrl", alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl RawNewsItem {
    /// Returns `None` when the record carries no id; an undated record sorts last.
    pub fn normalize(self) -> Option<NewsItem> {
        Some(NewsItem {
            id: self.id?,
            topic: self.topic.unwrap_or_default(),
            short_detail: self.short_detail.unwrap_or_default(),
            full_detail: self.full_detail.unwrap_or_default(),
            reporter_name: self.reporter_name.unwrap_or_else(|| "Unknown".to_string()),
            reported_at: self.reported_at.unwrap_or(DateTime::UNIX_EPOCH),
            image_url: self.image_url,
            link: self.link,
        })
    }
}

/// Payload for creating a news item; the id is assigned by the server or, in
/// degraded mode, derived from the current timestamp.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDraft {
    pub topic: String,
    pub short_detail: String,
    pub full_detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentItem {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub news_id: String,
    #[serde(default = "unknown_author")]
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(alias = "dateTime")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn unknown_author() -> String {
    "Unknown".to_string()
}

/// Comment payload before the backend assigns an id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub news_id: String,
    pub author: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Vote direction, serialized as the integer the backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum VoteDir {
    NotFake,
    Fake,
}

impl From<VoteDir> for i8 {
    fn from(dir: VoteDir) -> Self {
        match dir {
            VoteDir::NotFake => 1,
            VoteDir::Fake => -1,
        }
    }
}

impl TryFrom<i8> for VoteDir {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteDir::NotFake),
            -1 => Ok(VoteDir::Fake),
            other => Err(format!("invalid vote direction {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteItem {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub news_id: String,
    pub dir: VoteDir,
    pub user_id: String,
}

/// Derived classification of a news item from the net sign of its votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsStatus {
    Fake,
    NonFake,
    Neutral,
}

impl fmt::Display for NewsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NewsStatus::Fake => "fake",
            NewsStatus::NonFake => "non-fake",
            NewsStatus::Neutral => "neutral",
        };
        write!(f, "{label}")
    }
}

/// Aggregate vote view for one news item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteTally {
    pub up: usize,
    pub down: usize,
    pub my_vote: Option<VoteDir>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(deserialize_with = "opt_id_string")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    pub email: String,
}
