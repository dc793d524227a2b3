//! Error type for a single HTTP exchange (transport, status, body, or storage).

use thiserror::Error;

/// Error returned by one request: curl failure, HTTP error, unusable body, or
/// local storage failure. Kept typed so retry classification can inspect it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Response status was not 200.
    #[error("HTTP {0}")]
    Http(u32),
    /// Body was not the JSON shape the endpoint documents.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    /// Body parsed but a required value was missing or null.
    #[error("unexpected response: {0}")]
    Malformed(String),
    /// Request URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    /// Disk/storage write failed (e.g. disk full, file already exists). Not retried.
    #[error("storage: {0}")]
    Io(#[from] std::io::Error),
    /// A sibling in the same fail-fast group failed first.
    #[error("cancelled")]
    Cancelled,
    /// The worker running the request panicked or was torn down.
    #[error("worker failed: {0}")]
    Worker(String),
}

impl FetchError {
    /// HTTP status carried by this error, if it is a status error.
    pub fn status(&self) -> Option<u32> {
        match self {
            FetchError::Http(code) => Some(*code),
            _ => None,
        }
    }
}
