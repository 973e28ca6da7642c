//! Declarative per-field validation with debounced live checking.
//!
//! Each field carries an ordered rule list; the first failing rule's message
//! is shown. An empty value is always reported first, as "<placeholder> is
//! required.". Submit is enabled only when every field is non-empty and
//! passes every rule.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError},
    time::Duration,
};

use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::{
    scheduler::{ScheduledTask, Scheduler},
    ClientEvent,
};

pub const VALIDATION_DEBOUNCE: Duration = Duration::from_millis(300);

pub mod fields {
    pub const USERNAME: &str = "UserName";
    pub const PASSWORD: &str = "Password";
    pub const FIRST_NAME: &str = "FirstName";
    pub const LAST_NAME: &str = "LastName";
}

pub type Check = fn(&str) -> bool;

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub check: Check,
    pub message: &'static str,
}

impl FieldRule {
    pub const fn new(check: Check, message: &'static str) -> Self {
        Self { check, message }
    }
}

#[derive(Debug, Clone)]
pub struct FieldConfig {
    pub id: &'static str,
    pub placeholder: &'static str,
    pub rules: Vec<FieldRule>,
}

impl FieldConfig {
    /// Message for the first problem with `value`, if any.
    pub fn first_error(&self, value: &str) -> Option<String> {
        if value.is_empty() {
            return Some(format!("{} is required.", self.placeholder));
        }
        self.rules
            .iter()
            .find(|rule| !(rule.check)(value))
            .map(|rule| rule.message.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct FormConfig {
    pub fields: Vec<FieldConfig>,
}

const EDGE_SPACE_MESSAGE: &str = "Field cannot start or end with a space.";

fn starts_with_ascii_letter(value: &str) -> bool {
    value.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn no_edge_whitespace(value: &str) -> bool {
    !value.starts_with(char::is_whitespace) && !value.ends_with(char::is_whitespace)
}

fn no_whitespace(value: &str) -> bool {
    !value.chars().any(char::is_whitespace)
}

fn not_empty(value: &str) -> bool {
    !value.is_empty()
}

/// ASCII letters plus the Latin-1 letter ranges (À-Ö, Ø-ö, ø-ÿ).
fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, 'À'..='Ö' | 'Ø'..='ö' | 'ø'..='ÿ')
}

fn latin_letters_only(value: &str) -> bool {
    !value.is_empty() && value.chars().all(is_latin_letter)
}

fn password_field() -> FieldConfig {
    FieldConfig {
        id: fields::PASSWORD,
        placeholder: "Password",
        rules: vec![
            FieldRule::new(no_edge_whitespace, EDGE_SPACE_MESSAGE),
            FieldRule::new(no_whitespace, "Password cannot contain any spaces."),
        ],
    }
}

fn name_field(
    id: &'static str,
    placeholder: &'static str,
    required: &'static str,
    letters_only: &'static str,
) -> FieldConfig {
    FieldConfig {
        id,
        placeholder,
        rules: vec![
            FieldRule::new(not_empty, required),
            FieldRule::new(no_edge_whitespace, EDGE_SPACE_MESSAGE),
            FieldRule::new(latin_letters_only, letters_only),
        ],
    }
}

impl FormConfig {
    pub fn login() -> Self {
        Self {
            fields: vec![
                FieldConfig {
                    id: fields::USERNAME,
                    placeholder: "User Name",
                    rules: vec![
                        FieldRule::new(
                            starts_with_ascii_letter,
                            "User name must start with an English letter.",
                        ),
                        FieldRule::new(no_edge_whitespace, EDGE_SPACE_MESSAGE),
                    ],
                },
                password_field(),
            ],
        }
    }

    pub fn registration() -> Self {
        Self {
            fields: vec![
                FieldConfig {
                    id: fields::USERNAME,
                    placeholder: "User Name",
                    rules: vec![
                        FieldRule::new(
                            starts_with_ascii_letter,
                            "Username must start with an English letter.",
                        ),
                        FieldRule::new(no_edge_whitespace, EDGE_SPACE_MESSAGE),
                    ],
                },
                name_field(
                    fields::FIRST_NAME,
                    "First Name",
                    "First name is required.",
                    "First name can only contain letters.",
                ),
                name_field(
                    fields::LAST_NAME,
                    "Last Name",
                    "Last name is required.",
                    "Last name can only contain letters.",
                ),
                password_field(),
            ],
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.id == id)
    }
}

/// Whether a debounced check is waiting to run for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldState {
    #[default]
    Idle,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// A check was queued for this field.
    Scheduled,
    /// A check was already queued; this keystroke does not queue another.
    Dropped,
    UnknownField,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FieldSlot {
    value: String,
    state: FieldState,
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSnapshot {
    pub id: &'static str,
    pub value: String,
    pub state: FieldState,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    pub fields: Vec<FieldSnapshot>,
    pub submit_enabled: bool,
}

impl FormSnapshot {
    pub fn field(&self, id: &str) -> Option<&FieldSnapshot> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn value(&self, id: &str) -> &str {
        self.field(id).map(|field| field.value.as_str()).unwrap_or("")
    }
}

/// Owns field values, per-field pending state and errors for one form.
#[derive(Debug, Clone)]
pub struct FormController {
    config: FormConfig,
    slots: Vec<FieldSlot>,
    submit_enabled: bool,
}

impl FormController {
    pub fn new(config: FormConfig) -> Self {
        let slots = vec![FieldSlot::default(); config.fields.len()];
        Self {
            config,
            slots,
            submit_enabled: false,
        }
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn field_id(&self, id: &str) -> Option<&'static str> {
        self.config.position(id).map(|i| self.config.fields[i].id)
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        let i = self.config.position(id)?;
        Some(&self.slots[i].value)
    }

    pub fn error(&self, id: &str) -> Option<&str> {
        let i = self.config.position(id)?;
        self.slots[i].error.as_deref()
    }

    pub fn state(&self, id: &str) -> Option<FieldState> {
        let i = self.config.position(id)?;
        Some(self.slots[i].state)
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    /// Records the new value and queues a check unless one is pending.
    pub fn on_input(&mut self, id: &str, value: impl Into<String>) -> InputOutcome {
        let Some(i) = self.config.position(id) else {
            return InputOutcome::UnknownField;
        };
        let slot = &mut self.slots[i];
        slot.value = value.into();
        match slot.state {
            FieldState::Pending => InputOutcome::Dropped,
            FieldState::Idle => {
                slot.state = FieldState::Pending;
                InputOutcome::Scheduled
            }
        }
    }

    /// Runs the queued check for a field and returns it to idle.
    pub fn finish_pending(&mut self, id: &str) {
        if self.validate_field(id).is_some() {
            if let Some(i) = self.config.position(id) {
                self.slots[i].state = FieldState::Idle;
            }
        }
    }

    /// Validates on focus loss; skipped while a check is pending.
    pub fn on_blur(&mut self, id: &str) -> bool {
        match self.state(id) {
            Some(FieldState::Idle) => self.validate_field(id).is_some(),
            _ => false,
        }
    }

    /// Shows the field's first error, or re-evaluates the whole form when
    /// the field is clean. `None` for unknown fields.
    pub fn validate_field(&mut self, id: &str) -> Option<bool> {
        let i = self.config.position(id)?;
        let error = self.config.fields[i].first_error(&self.slots[i].value);
        let valid = error.is_none();
        self.slots[i].error = error;
        if valid {
            self.validate_all();
        } else {
            self.submit_enabled = false;
        }
        Some(valid)
    }

    /// Enables submit iff every field is non-empty and passes every rule.
    pub fn validate_all(&mut self) -> bool {
        self.submit_enabled = self
            .config
            .fields
            .iter()
            .zip(&self.slots)
            .all(|(field, slot)| field.first_error(&slot.value).is_none());
        self.submit_enabled
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = FieldSlot::default();
        }
        self.submit_enabled = false;
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            fields: self
                .config
                .fields
                .iter()
                .zip(&self.slots)
                .map(|(field, slot)| FieldSnapshot {
                    id: field.id,
                    value: slot.value.clone(),
                    state: slot.state,
                    error: slot.error.clone(),
                })
                .collect(),
            submit_enabled: self.submit_enabled,
        }
    }
}

/// A [`FormController`] driven by input events, with checks run after the
/// debounce delay.
pub struct LiveForm {
    controller: Arc<Mutex<FormController>>,
    scheduler: Scheduler,
    delay: Duration,
    pending: StdMutex<HashMap<&'static str, ScheduledTask>>,
    events: broadcast::Sender<ClientEvent>,
}

impl LiveForm {
    pub fn new(
        config: FormConfig,
        scheduler: Scheduler,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self::with_delay(config, scheduler, events, VALIDATION_DEBOUNCE)
    }

    pub fn with_delay(
        config: FormConfig,
        scheduler: Scheduler,
        events: broadcast::Sender<ClientEvent>,
        delay: Duration,
    ) -> Self {
        Self {
            controller: Arc::new(Mutex::new(FormController::new(config))),
            scheduler,
            delay,
            pending: StdMutex::new(HashMap::new()),
            events,
        }
    }

    pub async fn input(&self, id: &str, value: impl Into<String>) -> InputOutcome {
        let (outcome, field_id, snapshot) = {
            let mut controller = self.controller.lock().await;
            let outcome = controller.on_input(id, value);
            (outcome, controller.field_id(id), controller.snapshot())
        };
        let _ = self.events.send(ClientEvent::FormUpdated(snapshot));

        if let (InputOutcome::Scheduled, Some(field_id)) = (outcome, field_id) {
            let controller = Arc::clone(&self.controller);
            let events = self.events.clone();
            let task = self.scheduler.schedule_once(self.delay, async move {
                let snapshot = {
                    let mut controller = controller.lock().await;
                    controller.finish_pending(field_id);
                    controller.snapshot()
                };
                let _ = events.send(ClientEvent::FormUpdated(snapshot));
            });
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(field_id, task);
        } else if outcome == InputOutcome::Dropped {
            debug!(field = id, "validation: check already pending; input dropped");
        }
        outcome
    }

    pub async fn blur(&self, id: &str) -> bool {
        let (validated, snapshot) = {
            let mut controller = self.controller.lock().await;
            (controller.on_blur(id), controller.snapshot())
        };
        if validated {
            let _ = self.events.send(ClientEvent::FormUpdated(snapshot));
        }
        validated
    }

    pub async fn clear(&self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        let snapshot = {
            let mut controller = self.controller.lock().await;
            controller.clear();
            controller.snapshot()
        };
        let _ = self.events.send(ClientEvent::FormUpdated(snapshot));
    }

    pub async fn snapshot(&self) -> FormSnapshot {
        self.controller.lock().await.snapshot()
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
