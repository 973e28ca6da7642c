use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ThreadId);
id_newtype!(MessageId);

/// Which side of a conversation a message was written from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    pub fn from_is_sender(is_sender: bool) -> Self {
        if is_sender {
            Self::Sent
        } else {
            Self::Received
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Received => "received",
        }
    }
}

/// Views the web application can move between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Login,
    Registration,
    Inbox,
    Compose { reply_to: Option<ThreadId> },
    /// Server-provided redirect target that does not map to a known view.
    External(String),
}

impl Navigation {
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login/".to_string(),
            Self::Registration => "/registration/".to_string(),
            Self::Inbox => "/messages/".to_string(),
            Self::Compose { reply_to: None } => "/new_message/".to_string(),
            Self::Compose {
                reply_to: Some(thread_id),
            } => format!("/new_message/?reply_to={thread_id}"),
            Self::External(path) => path.clone(),
        }
    }

    /// Maps a server redirect path (e.g. `redirect_url` from login) onto a view.
    pub fn from_path(path: &str) -> Self {
        match path.trim() {
            "/" | "/login/" => Self::Login,
            "/registration/" => Self::Registration,
            "/messages/" => Self::Inbox,
            "/new_message/" => Self::Compose { reply_to: None },
            other => Self::External(other.to_string()),
        }
    }
}
