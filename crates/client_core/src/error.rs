use shared::error::FieldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {path}")]
    Status { status: u16, path: String },
    #[error("session expired; log in again")]
    SessionExpired,
    #[error("request rejected: {0}")]
    Field(#[from] FieldError),
    #[error("unexpected response shape from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
