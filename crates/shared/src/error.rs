use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Form field a server-side rejection is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Recipient,
    Content,
    Username,
    Password,
    #[serde(other)]
    Other,
}

/// `{ field, error }` body returned by the send and login endpoints on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldErrorBody {
    #[serde(default)]
    pub field: Option<FieldName>,
    pub error: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field:?}: {message}")]
pub struct FieldError {
    pub field: FieldName,
    pub message: String,
}

impl FieldError {
    pub fn new(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl From<FieldErrorBody> for FieldError {
    fn from(value: FieldErrorBody) -> Self {
        Self {
            field: value.field.unwrap_or(FieldName::Other),
            message: value.error,
        }
    }
}

/// Body the server sends with status 440 once the idle session timed out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExpiredBody {
    pub session_expired: bool,
}
