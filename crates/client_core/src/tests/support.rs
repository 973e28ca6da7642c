//! In-memory `MessagingApi` used by the engine tests.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::DateTime;
use shared::{
    domain::{Navigation, ThreadId},
    error::FieldError,
    protocol::{
        LoginRequest, LoginResponse, MessagePayload, RegistrationRequest, SendMessageRequest,
        ThreadPayload, UserSummary,
    },
};

use crate::{
    error::{ClientError, Result},
    transport::MessagingApi,
};

#[derive(Default)]
pub struct FakeApi {
    pub threads: Mutex<Vec<ThreadPayload>>,
    pub latest_delays: Mutex<VecDeque<Duration>>,
    pub latest_expired: AtomicBool,
    pub latest_calls: AtomicUsize,
    pub users: Mutex<Vec<UserSummary>>,
    pub search_delays: Mutex<HashMap<String, Duration>>,
    pub searches: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<SendMessageRequest>>,
    pub send_rejection: Mutex<Option<FieldError>>,
    pub send_unavailable: AtomicBool,
    pub logins: Mutex<Vec<LoginRequest>>,
    pub registrations: Mutex<Vec<RegistrationRequest>>,
    pub logout_fails: AtomicBool,
    pub logout_calls: AtomicUsize,
}

impl FakeApi {
    pub fn with_threads(threads: Vec<ThreadPayload>) -> Self {
        let api = Self::default();
        api.set_threads(threads);
        api
    }

    pub fn set_threads(&self, threads: Vec<ThreadPayload>) {
        *self.threads.lock().expect("threads") = threads;
    }

    pub fn push_latest_delay(&self, delay: Duration) {
        self.latest_delays.lock().expect("delays").push_back(delay);
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().expect("searches").clone()
    }

    pub fn sent(&self) -> Vec<SendMessageRequest> {
        self.sent.lock().expect("sent").clone()
    }
}

pub fn message(
    sender: &str,
    recipient: &str,
    content: &str,
    timestamp: &str,
    is_sender: bool,
) -> MessagePayload {
    MessagePayload {
        id: None,
        sender_name: sender.to_string(),
        recipient_name: recipient.to_string(),
        content: content.to_string(),
        timestamp: DateTime::parse_from_rfc3339(timestamp).expect("timestamp"),
        is_sender,
    }
}

pub fn thread(id: i64, messages: Vec<MessagePayload>) -> ThreadPayload {
    ThreadPayload {
        thread_id: ThreadId(id),
        messages,
    }
}

pub fn user(username: &str, first_name: &str, last_name: &str) -> UserSummary {
    UserSummary {
        username: username.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    }
}

#[async_trait]
impl MessagingApi for FakeApi {
    async fn prime_csrf(&self) -> Result<()> {
        Ok(())
    }

    async fn latest_threads(&self) -> Result<Vec<ThreadPayload>> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.threads.lock().expect("threads").clone();
        let delay = self.latest_delays.lock().expect("delays").pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.latest_expired.load(Ordering::SeqCst) {
            return Err(ClientError::SessionExpired);
        }
        Ok(snapshot)
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>> {
        self.searches
            .lock()
            .expect("searches")
            .push(query.to_string());
        let delay = self
            .search_delays
            .lock()
            .expect("search delays")
            .get(query)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let needle = query.to_lowercase();
        Ok(self
            .users
            .lock()
            .expect("users")
            .iter()
            .filter(|u| {
                u.username.to_lowercase().contains(&needle)
                    || u.first_name.to_lowercase().contains(&needle)
                    || u.last_name.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<()> {
        if self.send_unavailable.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 502,
                path: "/api/messages/send/".to_string(),
            });
        }
        if let Some(rejection) = self.send_rejection.lock().expect("rejection").clone() {
            return Err(ClientError::Field(rejection));
        }
        self.sent.lock().expect("sent").push(request.clone());
        Ok(())
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.logins.lock().expect("logins").push(request.clone());
        if request.password == "secret" {
            Ok(LoginResponse {
                success: true,
                redirect_url: Some("/messages/".to_string()),
                error: None,
            })
        } else {
            Err(ClientError::Field(FieldError::new(
                shared::error::FieldName::Username,
                "Invalid username or password",
            )))
        }
    }

    async fn register(&self, request: &RegistrationRequest) -> Result<Navigation> {
        self.registrations
            .lock()
            .expect("registrations")
            .push(request.clone());
        if request.username == "taken" {
            Ok(Navigation::Registration)
        } else {
            Ok(Navigation::Login)
        }
    }

    async fn logout(&self) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 500,
                path: "/logout/".to_string(),
            });
        }
        Ok(())
    }
}
