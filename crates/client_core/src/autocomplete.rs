//! Username search-as-you-type for the recipient field.
//!
//! Input is debounced; a superseded debounce is canceled, but a search that
//! has already been sent is never aborted. Results are applied as they
//! arrive, so a slow early search can overwrite a faster later one.

use std::{sync::Arc, time::Duration};

use shared::protocol::UserSummary;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error};

use crate::{
    scheduler::{Debouncer, Scheduler},
    transport::MessagingApi,
    ClientEvent,
};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub username: String,
    pub label: String,
}

impl From<&UserSummary> for Suggestion {
    fn from(user: &UserSummary) -> Self {
        Self {
            username: user.username.clone(),
            label: format!(
                "{}, {} ({})",
                user.last_name, user.first_name, user.username
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutocompleteView {
    pub value: String,
    pub suggestions: Vec<Suggestion>,
    pub open: bool,
}

impl AutocompleteView {
    fn close(&mut self) {
        self.open = false;
        self.suggestions.clear();
    }
}

pub struct Autocomplete {
    api: Arc<dyn MessagingApi>,
    scheduler: Scheduler,
    debouncer: Debouncer,
    view: Mutex<AutocompleteView>,
    events: broadcast::Sender<ClientEvent>,
}

impl Autocomplete {
    pub fn new(
        api: Arc<dyn MessagingApi>,
        scheduler: Scheduler,
        events: broadcast::Sender<ClientEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            debouncer: Debouncer::new(scheduler.clone(), SEARCH_DEBOUNCE),
            scheduler,
            view: Mutex::new(AutocompleteView::default()),
            events,
        })
    }

    pub async fn on_input(self: &Arc<Self>, value: &str) {
        let snapshot = {
            let mut view = self.view.lock().await;
            view.value = value.to_string();
            if value.is_empty() {
                view.close();
            }
            view.clone()
        };

        self.publish(snapshot);
        if value.is_empty() {
            self.debouncer.cancel();
            return;
        }

        let engine = Arc::clone(self);
        self.debouncer.trigger(async move { engine.search_current().await });
    }

    /// Sends a search for whatever the field holds once typing paused.
    async fn search_current(self: Arc<Self>) {
        let query = self.view.lock().await.value.clone();
        if query.chars().count() < MIN_QUERY_CHARS {
            debug!(query_len = query.len(), "autocomplete: query too short");
            return;
        }

        let engine = Arc::clone(&self);
        self.scheduler.spawn_detached(async move {
            match engine.api.search_users(&query).await {
                Ok(users) => engine.apply_results(&users).await,
                Err(err) => error!(
                    query = %query,
                    error = %err,
                    "autocomplete: error fetching user suggestions"
                ),
            }
        });
    }

    pub async fn apply_results(&self, users: &[UserSummary]) {
        let snapshot = {
            let mut view = self.view.lock().await;
            if users.is_empty() {
                view.close();
            } else {
                view.suggestions = users.iter().map(Suggestion::from).collect();
                view.open = true;
            }
            view.clone()
        };
        self.publish(snapshot);
    }

    pub async fn select(&self, username: &str) {
        let snapshot = {
            let mut view = self.view.lock().await;
            view.value = username.to_string();
            view.close();
            view.clone()
        };
        self.publish(snapshot);
    }

    pub async fn click_outside(&self) {
        let snapshot = {
            let mut view = self.view.lock().await;
            view.close();
            view.clone()
        };
        self.publish(snapshot);
    }

    /// Replaces the value without searching, e.g. when a reply pre-fills it.
    pub async fn set_value(&self, value: &str) {
        self.debouncer.cancel();
        let snapshot = {
            let mut view = self.view.lock().await;
            view.value = value.to_string();
            view.close();
            view.clone()
        };
        self.publish(snapshot);
    }

    pub async fn value(&self) -> String {
        self.view.lock().await.value.clone()
    }

    pub async fn snapshot(&self) -> AutocompleteView {
        self.view.lock().await.clone()
    }

    fn publish(&self, snapshot: AutocompleteView) {
        let _ = self.events.send(ClientEvent::SuggestionsUpdated(snapshot));
    }
}

#[cfg(test)]
#[path = "tests/autocomplete_tests.rs"]
mod tests;
