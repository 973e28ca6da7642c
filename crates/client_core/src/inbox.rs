//! Inbox polling and thread rendering.
//!
//! The engine owns the preview list, the selected thread and the open thread
//! view. A repeating poll upserts previews by thread id and re-renders the
//! open thread when it shows up in a response. Responses are applied in the
//! order they arrive; nothing is sequence-checked.

use std::{sync::Arc, time::Duration};

use shared::{
    domain::{Direction, Navigation, ThreadId},
    protocol::{MessagePayload, ThreadPayload},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    error::{ClientError, Result},
    format::{format_name, format_timestamp, snippet},
    scheduler::{ScheduledTask, Scheduler},
    transport::MessagingApi,
    ClientEvent,
};

pub const POLL_INTERVAL: Duration = Duration::from_millis(5000);
pub const NO_MESSAGES_PLACEHOLDER: &str = "No messages to display";

/// List-view summary of one thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub thread_id: ThreadId,
    /// Display name of the participant who is not the viewer.
    pub participant: String,
    pub snippet: String,
    pub time: String,
    /// Latest message time in epoch milliseconds; the only sort key.
    pub sort_key: i64,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadEntry {
    pub direction: Direction,
    pub sender: String,
    pub time: String,
    /// Raw message text. Render layers insert it as text, never as markup.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ThreadView {
    /// No thread has been opened yet.
    #[default]
    Closed,
    /// A thread was opened but had nothing to show.
    Empty,
    Messages {
        entries: Vec<ThreadEntry>,
        /// Index of the entry the view should be scrolled to.
        scroll_to: usize,
    },
}

impl ThreadView {
    pub fn entries(&self) -> &[ThreadEntry] {
        match self {
            Self::Messages { entries, .. } => entries,
            _ => &[],
        }
    }
}

/// Snapshot of everything the inbox screen shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboxView {
    pub previews: Vec<Preview>,
    pub selected: Option<ThreadId>,
    pub reply_visible: bool,
    pub thread: ThreadView,
}

pub fn build_preview(thread: &ThreadPayload) -> Option<Preview> {
    let first = thread.first()?;
    let latest = thread.latest()?;
    Some(Preview {
        thread_id: thread.thread_id,
        participant: format_name(first.counterpart_name()),
        snippet: snippet(&latest.content),
        time: format_timestamp(&latest.timestamp),
        sort_key: latest.timestamp.timestamp_millis(),
        selected: false,
    })
}

/// Upserts one preview per non-empty thread, then re-sorts newest first.
///
/// Previews for threads missing from `threads` are left in place.
pub fn reconcile_previews(
    previews: &mut Vec<Preview>,
    threads: &[ThreadPayload],
    selected: Option<ThreadId>,
) {
    for thread in threads {
        let Some(mut fresh) = build_preview(thread) else {
            continue;
        };
        fresh.selected = selected == Some(thread.thread_id);
        match previews.iter_mut().find(|p| p.thread_id == thread.thread_id) {
            Some(existing) => *existing = fresh,
            None => previews.push(fresh),
        }
    }
    sort_previews(previews);
}

pub fn sort_previews(previews: &mut [Preview]) {
    // Stable: equal timestamps keep their current relative order.
    previews.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
}

/// Builds the thread view, oldest message first.
pub fn render_thread(messages: &[MessagePayload]) -> ThreadView {
    if messages.is_empty() {
        return ThreadView::Empty;
    }
    let mut ordered: Vec<&MessagePayload> = messages.iter().collect();
    ordered.sort_by_key(|message| message.timestamp);
    let entries: Vec<ThreadEntry> = ordered
        .into_iter()
        .map(|message| ThreadEntry {
            direction: Direction::from_is_sender(message.is_sender),
            sender: format_name(&message.sender_name),
            time: format_timestamp(&message.timestamp),
            content: message.content.clone(),
        })
        .collect();
    let scroll_to = entries.len() - 1;
    ThreadView::Messages { entries, scroll_to }
}

pub struct InboxEngine {
    api: Arc<dyn MessagingApi>,
    scheduler: Scheduler,
    poll_interval: Duration,
    view: Mutex<InboxView>,
    events: broadcast::Sender<ClientEvent>,
}

impl InboxEngine {
    pub fn new(
        api: Arc<dyn MessagingApi>,
        scheduler: Scheduler,
        events: broadcast::Sender<ClientEvent>,
    ) -> Arc<Self> {
        Self::with_poll_interval(api, scheduler, events, POLL_INTERVAL)
    }

    pub fn with_poll_interval(
        api: Arc<dyn MessagingApi>,
        scheduler: Scheduler,
        events: broadcast::Sender<ClientEvent>,
        poll_interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            scheduler,
            poll_interval,
            view: Mutex::new(InboxView::default()),
            events,
        })
    }

    /// Polls now and then every interval until the handle is dropped.
    pub fn start(self: &Arc<Self>) -> ScheduledTask {
        info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            "inbox: polling started"
        );
        let engine = Arc::clone(self);
        self.scheduler
            .schedule_repeating(self.poll_interval, move || {
                let engine = Arc::clone(&engine);
                async move { engine.poll_once().await }
            })
    }

    pub async fn poll_once(&self) {
        match self.api.latest_threads().await {
            Ok(threads) => self.on_fetch_success(threads).await,
            Err(err) => self.on_fetch_error(err),
        }
    }

    pub async fn on_fetch_success(&self, threads: Vec<ThreadPayload>) {
        let (previews, rendered) = {
            let mut view = self.view.lock().await;
            let selected = view.selected;
            reconcile_previews(&mut view.previews, &threads, selected);

            let open_thread = selected.and_then(|id| {
                threads
                    .iter()
                    .find(|t| t.thread_id == id && !t.messages.is_empty())
            });
            let rendered = open_thread.map(|thread| {
                view.thread = render_thread(&thread.messages);
                view.thread.clone()
            });
            (view.previews.clone(), rendered)
        };

        debug!(
            threads = threads.len(),
            previews = previews.len(),
            "inbox: previews reconciled"
        );
        let _ = self.events.send(ClientEvent::PreviewsUpdated(previews));
        if let Some(thread) = rendered {
            let _ = self.events.send(ClientEvent::ThreadRendered(thread));
        }
    }

    fn on_fetch_error(&self, err: ClientError) {
        if err.is_session_expired() {
            warn!("inbox: session expired while polling");
            let _ = self.events.send(ClientEvent::SessionExpired);
            let _ = self.events.send(ClientEvent::Navigate(Navigation::Login));
            return;
        }
        warn!(error = %err, "inbox: poll failed; waiting for next tick");
    }

    /// Opens a thread: moves the highlight, reveals reply, then fetches and
    /// renders it. A fetch that returns after the selection moved elsewhere
    /// is discarded.
    pub async fn select_thread(&self, thread_id: ThreadId) -> Result<()> {
        let previews = {
            let mut view = self.view.lock().await;
            view.selected = Some(thread_id);
            view.reply_visible = true;
            for preview in &mut view.previews {
                preview.selected = preview.thread_id == thread_id;
            }
            view.previews.clone()
        };
        info!(thread_id = thread_id.0, "inbox: thread selected");
        let _ = self.events.send(ClientEvent::SelectionChanged {
            thread_id: Some(thread_id),
            reply_visible: true,
        });
        let _ = self.events.send(ClientEvent::PreviewsUpdated(previews));

        let threads = match self.api.latest_threads().await {
            Ok(threads) => threads,
            Err(err) => {
                error!(thread_id = thread_id.0, error = %err, "inbox: failed to load selected thread");
                return Err(err);
            }
        };
        let Some(thread) = threads.into_iter().find(|t| t.thread_id == thread_id) else {
            debug!(thread_id = thread_id.0, "inbox: selected thread missing from response");
            return Ok(());
        };

        let rendered = {
            let mut view = self.view.lock().await;
            if view.selected != Some(thread_id) {
                debug!(thread_id = thread_id.0, "inbox: selection moved; dropping stale thread");
                return Ok(());
            }
            view.thread = render_thread(&thread.messages);
            view.thread.clone()
        };
        let _ = self.events.send(ClientEvent::ThreadRendered(rendered));
        Ok(())
    }

    pub async fn snapshot(&self) -> InboxView {
        self.view.lock().await.clone()
    }

    pub fn new_message(&self) -> Navigation {
        let target = Navigation::Compose { reply_to: None };
        let _ = self.events.send(ClientEvent::Navigate(target.clone()));
        target
    }

    /// Compose view pre-addressed to the open thread, if one is selected.
    pub async fn reply(&self) -> Option<Navigation> {
        let selected = self.view.lock().await.selected?;
        let target = Navigation::Compose {
            reply_to: Some(selected),
        };
        let _ = self.events.send(ClientEvent::Navigate(target.clone()));
        Some(target)
    }

    /// Ends the session. On failure the view stays as it is.
    pub async fn logout(&self) -> Result<()> {
        match self.api.logout().await {
            Ok(()) => {
                info!("inbox: logged out");
                let _ = self.events.send(ClientEvent::Navigate(Navigation::Login));
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "inbox: error logging out");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/inbox_tests.rs"]
mod tests;
