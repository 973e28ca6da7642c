use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::domain::{MessageId, ThreadId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    pub sender_name: String,
    pub recipient_name: String,
    pub content: String,
    pub timestamp: DateTime<FixedOffset>,
    pub is_sender: bool,
}

impl MessagePayload {
    /// Name of the participant on the other side, relative to the viewer.
    pub fn counterpart_name(&self) -> &str {
        if self.is_sender {
            &self.recipient_name
        } else {
            &self.sender_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadPayload {
    pub thread_id: ThreadId,
    #[serde(default)]
    pub messages: Vec<MessagePayload>,
}

impl ThreadPayload {
    pub fn first(&self) -> Option<&MessagePayload> {
        self.messages.first()
    }

    pub fn latest(&self) -> Option<&MessagePayload> {
        self.messages.last()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatestThreadsResponse {
    #[serde(default)]
    pub threads: Vec<ThreadPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserSummary {
    /// "Last, First", the format message payloads carry names in.
    pub fn comma_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSearchResponse {
    #[serde(default)]
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub recipient: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ThreadId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    #[serde(rename = "UserName")]
    pub username: String,
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "LastName")]
    pub last_name: String,
    #[serde(rename = "Password")]
    pub password: String,
}
