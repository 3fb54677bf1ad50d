use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{url} returned status {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("server response missing record id")]
    MissingId,
    #[error("no API base configured")]
    NoApi,
    #[error("no token in authentication response")]
    NoToken,
    #[error("no user id in authentication response")]
    NoUserId,
    #[error("not logged in")]
    NotLoggedIn,
}
