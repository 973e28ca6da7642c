//! Client engine for the messaging web application: inbox polling and
//! thread rendering, compose flow with recipient autocomplete, and the
//! login/registration forms. Views observe engine state through
//! [`ClientEvent`]s; nothing reads state back out of a rendered view.

use shared::domain::{Navigation, ThreadId};
use tokio::sync::broadcast;

pub mod autocomplete;
pub mod compose;
pub mod config;
pub mod cookie;
pub mod error;
pub mod format;
pub mod inbox;
pub mod markup;
pub mod scheduler;
pub mod session;
pub mod transport;
pub mod validation;

pub use autocomplete::{Autocomplete, AutocompleteView, Suggestion};
pub use compose::{ComposeFlow, ComposeView, SubmitOutcome};
pub use config::{load_settings, ClientSettings};
pub use error::{ClientError, Result};
pub use inbox::{InboxEngine, InboxView, Preview, ThreadEntry, ThreadView};
pub use scheduler::{Debouncer, ScheduledTask, Scheduler};
pub use session::{Banner, BannerKind, BannerSlot, Flash, LoginFlow, RegistrationFlow};
pub use transport::{HttpMessagingApi, MessagingApi};
pub use validation::{FieldState, FormConfig, FormController, FormSnapshot, LiveForm};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub enum ClientEvent {
    PreviewsUpdated(Vec<Preview>),
    ThreadRendered(ThreadView),
    SelectionChanged {
        thread_id: Option<ThreadId>,
        reply_visible: bool,
    },
    SuggestionsUpdated(AutocompleteView),
    FormUpdated(FormSnapshot),
    ComposeUpdated(ComposeView),
    Banner(Option<Banner>),
    Navigate(Navigation),
    SessionExpired,
    Error(String),
}

pub fn event_channel() -> broadcast::Sender<ClientEvent> {
    let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    events
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
