pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod persist;
pub mod profile;
pub mod snapshot;
pub mod store;
pub mod ui_state;

pub use api::ApiClient;
pub use auth::{AuthStore, Session};
pub use config::AppConfig;
pub use error::StoreError;
pub use models::{
    CommentItem, NewUser, NewsDraft, NewsItem, NewsStatus, ProfileUpdate, UserProfile, VoteDir,
    VoteItem, VoteTally,
};
pub use persist::{client_user_id, LocalStore};
pub use profile::ProfileStore;
pub use snapshot::Snapshot;
pub use store::{ConnectionState, NewsStore, StoreEvent};
pub use ui_state::{StatusFilter, UiState};
