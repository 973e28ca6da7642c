//! Login and registration pages: form submission, flash messages and the
//! warning banner that hides itself after a few seconds.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use shared::{
    domain::Navigation,
    protocol::{LoginRequest, RegistrationRequest},
};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    error::ClientError,
    scheduler::{ScheduledTask, Scheduler},
    transport::MessagingApi,
    validation::{fields, FormConfig, LiveForm},
    ClientEvent,
};

pub const BANNER_DURATION: Duration = Duration::from_millis(3000);
pub const FLASH_DURATION: Duration = Duration::from_millis(5000);
pub const UNKNOWN_ERROR: &str = "An unknown error occurred.";
pub const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Warning,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            message: message.into(),
        }
    }
}

/// One-shot messages the server hands to the login page after a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    RegistrationSucceeded,
    SessionExpired,
}

impl Flash {
    pub fn message(self) -> &'static str {
        match self {
            Self::RegistrationSucceeded => "Registration successful!",
            Self::SessionExpired => "Your session has expired. Please log in again.",
        }
    }

    pub fn from_message(message: &str) -> Option<Self> {
        [Self::RegistrationSucceeded, Self::SessionExpired]
            .into_iter()
            .find(|flash| flash.message() == message.trim())
    }

    fn banner(self) -> Banner {
        match self {
            Self::RegistrationSucceeded => Banner::success(self.message()),
            Self::SessionExpired => Banner::warning(self.message()),
        }
    }
}

/// The page's single banner. A new banner replaces the visible one and
/// restarts the hide timer.
pub struct BannerSlot {
    scheduler: Scheduler,
    current: Arc<Mutex<Option<Banner>>>,
    hide: Mutex<Option<ScheduledTask>>,
    events: broadcast::Sender<ClientEvent>,
}

impl BannerSlot {
    pub fn new(scheduler: Scheduler, events: broadcast::Sender<ClientEvent>) -> Self {
        Self {
            scheduler,
            current: Arc::new(Mutex::new(None)),
            hide: Mutex::new(None),
            events,
        }
    }

    pub fn show(&self, banner: Banner, duration: Duration) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(banner.clone());
        let _ = self.events.send(ClientEvent::Banner(Some(banner)));

        let current = Arc::clone(&self.current);
        let events = self.events.clone();
        let task = self.scheduler.schedule_once(duration, async move {
            current.lock().unwrap_or_else(PoisonError::into_inner).take();
            let _ = events.send(ClientEvent::Banner(None));
        });
        *self.hide.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    pub fn current(&self) -> Option<Banner> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub struct LoginFlow {
    api: Arc<dyn MessagingApi>,
    form: LiveForm,
    banner: BannerSlot,
    events: broadcast::Sender<ClientEvent>,
}

impl LoginFlow {
    pub fn new(
        api: Arc<dyn MessagingApi>,
        scheduler: Scheduler,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            api,
            form: LiveForm::new(FormConfig::login(), scheduler.clone(), events.clone()),
            banner: BannerSlot::new(scheduler, events.clone()),
            events,
        }
    }

    pub fn form(&self) -> &LiveForm {
        &self.form
    }

    pub fn banner(&self) -> Option<Banner> {
        self.banner.current()
    }

    /// Loads the login page so the server sets the CSRF cookie, then shows
    /// the flash message it handed over, if any.
    pub async fn load(&self, flash: Option<&str>) -> crate::Result<()> {
        self.api.prime_csrf().await?;
        if let Some(message) = flash {
            self.show_flash(message);
        }
        Ok(())
    }

    /// Unknown flash text is ignored.
    pub fn show_flash(&self, message: &str) -> bool {
        match Flash::from_message(message) {
            Some(flash) => {
                self.banner.show(flash.banner(), FLASH_DURATION);
                true
            }
            None => false,
        }
    }

    /// Posts the trimmed credentials. Every failure ends up in the banner.
    pub async fn submit(&self) -> Option<Navigation> {
        let snapshot = self.form.snapshot().await;
        if !snapshot.submit_enabled {
            debug!("login: submit ignored while the form is invalid");
            return None;
        }
        let request = LoginRequest {
            username: snapshot.value(fields::USERNAME).trim().to_string(),
            password: snapshot.value(fields::PASSWORD).trim().to_string(),
        };

        match self.api.login(&request).await {
            Ok(response) if response.success => {
                let target = Navigation::from_path(
                    response
                        .redirect_url
                        .as_deref()
                        .unwrap_or(&Navigation::Inbox.path()),
                );
                info!(username = %request.username, target = %target.path(), "login: succeeded");
                let _ = self.events.send(ClientEvent::Navigate(target.clone()));
                Some(target)
            }
            Ok(response) => {
                let message = response.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                warn!(username = %request.username, "login: rejected");
                self.banner.show(Banner::warning(message), BANNER_DURATION);
                None
            }
            Err(ClientError::Field(rejection)) => {
                warn!(username = %request.username, field = ?rejection.field, "login: rejected");
                self.banner
                    .show(Banner::warning(rejection.message), BANNER_DURATION);
                None
            }
            Err(err) => {
                error!(error = %err, "login: request failed");
                self.banner.show(Banner::warning(UNKNOWN_ERROR), BANNER_DURATION);
                None
            }
        }
    }

    pub fn go_to_registration(&self) -> Navigation {
        let _ = self.events.send(ClientEvent::Navigate(Navigation::Registration));
        Navigation::Registration
    }
}

pub struct RegistrationFlow {
    api: Arc<dyn MessagingApi>,
    form: LiveForm,
    banner: BannerSlot,
    events: broadcast::Sender<ClientEvent>,
}

impl RegistrationFlow {
    pub fn new(
        api: Arc<dyn MessagingApi>,
        scheduler: Scheduler,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            api,
            form: LiveForm::new(
                FormConfig::registration(),
                scheduler.clone(),
                events.clone(),
            ),
            banner: BannerSlot::new(scheduler, events.clone()),
            events,
        }
    }

    pub fn form(&self) -> &LiveForm {
        &self.form
    }

    pub fn banner(&self) -> Option<Banner> {
        self.banner.current()
    }

    /// The server answers with a redirect to the login page on success and
    /// re-renders the registration page otherwise.
    pub async fn submit(&self) -> Option<Navigation> {
        let snapshot = self.form.snapshot().await;
        if !snapshot.submit_enabled {
            debug!("registration: submit ignored while the form is invalid");
            return None;
        }
        let request = RegistrationRequest {
            username: snapshot.value(fields::USERNAME).to_string(),
            first_name: snapshot.value(fields::FIRST_NAME).to_string(),
            last_name: snapshot.value(fields::LAST_NAME).to_string(),
            password: snapshot.value(fields::PASSWORD).to_string(),
        };

        match self.api.register(&request).await {
            Ok(Navigation::Login) => {
                info!(username = %request.username, "registration: account created");
                self.banner.show(
                    Flash::RegistrationSucceeded.banner(),
                    FLASH_DURATION,
                );
                let _ = self.events.send(ClientEvent::Navigate(Navigation::Login));
                Some(Navigation::Login)
            }
            Ok(landed_on) => {
                warn!(
                    username = %request.username,
                    landed_on = %landed_on.path(),
                    "registration: server did not accept the account"
                );
                self.banner
                    .show(Banner::warning(REGISTRATION_FAILED), FLASH_DURATION);
                None
            }
            Err(err) => {
                error!(error = %err, "registration: request failed");
                self.banner.show(Banner::warning(UNKNOWN_ERROR), BANNER_DURATION);
                None
            }
        }
    }

    pub fn go_to_login(&self) -> Navigation {
        let _ = self.events.send(ClientEvent::Navigate(Navigation::Login));
        Navigation::Login
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
