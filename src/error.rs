use std::sync::Arc;

use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the client.
///
/// The enum is `Clone` so the outcome of one authentication flow can be
/// handed to every caller that was waiting on it; non-clonable sources are
/// wrapped in `Arc`.
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("http error: {0}")]
    Http(Arc<reqwest::Error>),
    #[error("unexpected status {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("json error: {0}")]
    Json(Arc<serde_json::Error>),
    #[error("io error: {0}")]
    Io(Arc<std::io::Error>),
}

impl Error {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(Arc::new(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(Arc::new(e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(Arc::new(e))
    }
}
