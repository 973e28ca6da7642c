//! New-message view: recipient autocomplete, reply pre-fill and sending.

use std::sync::Arc;

use shared::{
    domain::{Navigation, ThreadId},
    error::{FieldError, FieldName},
    protocol::SendMessageRequest,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    autocomplete::Autocomplete,
    error::{ClientError, Result},
    scheduler::Scheduler,
    transport::MessagingApi,
    ClientEvent,
};

pub const MAX_CONTENT_CHARS: usize = 1024;

pub fn too_long_message() -> String {
    format!("Message is too long. Maximum length is {MAX_CONTENT_CHARS} characters.")
}

/// Reads `reply_to` from a compose URL such as `/new_message/?reply_to=12`.
pub fn parse_reply_to(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "reply_to")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeView {
    pub recipient: String,
    pub recipient_locked: bool,
    pub content: String,
    pub char_count: usize,
    pub recipient_error: Option<String>,
    pub content_error: Option<String>,
    /// Content is within the length limit. Empty fields are checked on
    /// submit, not here.
    pub send_enabled: bool,
    pub reply_to: Option<ThreadId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Recipient or content was empty; nothing was sent.
    Incomplete,
    /// Content is over [`MAX_CONTENT_CHARS`]; nothing was sent.
    TooLong,
    Sent,
    Rejected(FieldError),
}

#[derive(Debug, Default)]
struct ComposeState {
    recipient_locked: bool,
    content: String,
    recipient_error: Option<String>,
    content_error: Option<String>,
    reply_to: Option<ThreadId>,
}

impl ComposeState {
    fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

pub struct ComposeFlow {
    api: Arc<dyn MessagingApi>,
    recipient: Arc<Autocomplete>,
    state: Mutex<ComposeState>,
    events: broadcast::Sender<ClientEvent>,
}

impl ComposeFlow {
    pub fn new(
        api: Arc<dyn MessagingApi>,
        scheduler: Scheduler,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        let recipient = Autocomplete::new(Arc::clone(&api), scheduler, events.clone());
        Self {
            api,
            recipient,
            state: Mutex::new(ComposeState::default()),
            events,
        }
    }

    pub fn recipient(&self) -> &Arc<Autocomplete> {
        &self.recipient
    }

    /// Prepares the view. With a reply target, the original thread's
    /// counterpart is looked up and the recipient is filled in and locked.
    pub async fn load(&self, reply_to: Option<&str>) -> Result<()> {
        let Some(raw) = reply_to else {
            self.publish().await;
            return Ok(());
        };
        let thread_id = match raw.parse::<i64>() {
            Ok(id) => ThreadId(id),
            Err(_) => {
                warn!(reply_to = raw, "compose: ignoring non-numeric reply target");
                self.publish().await;
                return Ok(());
            }
        };
        self.state.lock().await.reply_to = Some(thread_id);

        let threads = self.api.latest_threads().await.inspect_err(|err| {
            error!(thread_id = thread_id.0, error = %err, "compose: error fetching message details");
            self.report(format!("Unable to load the message being replied to: {err}"));
        })?;
        let counterpart = threads
            .iter()
            .find(|thread| thread.thread_id == thread_id)
            .and_then(|thread| thread.first())
            .map(|first| first.counterpart_name().to_string());
        let Some(counterpart) = counterpart else {
            debug!(thread_id = thread_id.0, "compose: reply target not among latest threads");
            self.publish().await;
            return Ok(());
        };

        let last_name = counterpart.split(',').next().unwrap_or_default().trim();
        let users = self.api.search_users(last_name).await.inspect_err(|err| {
            error!(error = %err, "compose: error fetching user details");
            self.report(format!("Unable to look up the reply recipient: {err}"));
        })?;
        match users.iter().find(|user| user.comma_name() == counterpart) {
            Some(user) => {
                info!(
                    thread_id = thread_id.0,
                    recipient = %user.username,
                    "compose: reply recipient resolved"
                );
                self.recipient.set_value(&user.username).await;
                self.state.lock().await.recipient_locked = true;
            }
            None => debug!(thread_id = thread_id.0, "compose: no user matches reply counterpart"),
        }
        self.publish().await;
        Ok(())
    }

    pub async fn on_recipient_input(&self, value: &str) {
        if self.state.lock().await.recipient_locked {
            return;
        }
        self.recipient.on_input(value).await;
        self.publish().await;
    }

    pub async fn on_content_input(&self, value: &str) {
        {
            let mut state = self.state.lock().await;
            state.content = value.to_string();
            state.content_error = (state.char_count() > MAX_CONTENT_CHARS).then(too_long_message);
        }
        self.publish().await;
    }

    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let recipient = self.recipient.value().await;
        let request = {
            let mut state = self.state.lock().await;
            if recipient.is_empty() || state.content.is_empty() {
                return Ok(SubmitOutcome::Incomplete);
            }
            if state.char_count() > MAX_CONTENT_CHARS {
                state.content_error = Some(too_long_message());
                drop(state);
                warn!("compose: refusing to send over-long message");
                self.publish().await;
                return Ok(SubmitOutcome::TooLong);
            }
            SendMessageRequest {
                recipient,
                content: state.content.clone(),
                reply_to: state.reply_to,
            }
        };

        match self.api.send_message(&request).await {
            Ok(()) => {
                info!(reply_to = ?request.reply_to, "compose: message sent");
                let _ = self.events.send(ClientEvent::Navigate(Navigation::Inbox));
                Ok(SubmitOutcome::Sent)
            }
            Err(ClientError::Field(rejection)) => {
                warn!(field = ?rejection.field, "compose: server rejected message");
                {
                    let mut state = self.state.lock().await;
                    match rejection.field {
                        FieldName::Recipient => {
                            state.recipient_error = Some(rejection.message.clone())
                        }
                        FieldName::Content => state.content_error = Some(rejection.message.clone()),
                        _ => {}
                    }
                }
                self.publish().await;
                Ok(SubmitOutcome::Rejected(rejection))
            }
            Err(err) => {
                error!(error = %err, "compose: failed to send message");
                self.report(format!("Unable to send message: {err}"));
                Err(err)
            }
        }
    }

    /// Empties content and errors; a locked recipient survives.
    pub async fn clear(&self) {
        let locked = {
            let mut state = self.state.lock().await;
            state.content.clear();
            state.content_error = None;
            state.recipient_error = None;
            state.recipient_locked
        };
        if !locked {
            self.recipient.set_value("").await;
        }
        self.publish().await;
    }

    pub async fn snapshot(&self) -> ComposeView {
        let recipient = self.recipient.value().await;
        let state = self.state.lock().await;
        let char_count = state.char_count();
        ComposeView {
            recipient,
            recipient_locked: state.recipient_locked,
            content: state.content.clone(),
            char_count,
            recipient_error: state.recipient_error.clone(),
            content_error: state.content_error.clone(),
            send_enabled: char_count <= MAX_CONTENT_CHARS,
            reply_to: state.reply_to,
        }
    }

    fn report(&self, message: String) {
        let _ = self.events.send(ClientEvent::Error(message));
    }

    async fn publish(&self) {
        let snapshot = self.snapshot().await;
        let _ = self.events.send(ClientEvent::ComposeUpdated(snapshot));
    }
}

#[cfg(test)]
#[path = "tests/compose_tests.rs"]
mod tests;
