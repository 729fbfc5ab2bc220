use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde::Deserialize;

use super::timer::Timer;
use super::transport::Transport;
use super::validation::{ContactPattern, FieldValidator, MinLength, ValidationError};
use crate::contracts::FormView;
use crate::feedback::StatusMessage;

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for FormId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "form-{}", self.0)
    }
}

/// Stable identifier of a form field, matching the input's DOM id.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const NAME: FieldKey = FieldKey::new("name");
    pub const CONTACT: FieldKey = FieldKey::new("contact");

    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubmissionTicket(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct HideTicket(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// Validation outcome and display status of one input.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldState {
    pub value: String,
    pub is_valid: bool,
    pub error_message: Option<String>,
}

impl FieldState {
    pub fn valid(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            is_valid: true,
            error_message: None,
        }
    }

    pub fn invalid(value: impl Into<String>, error: &ValidationError) -> Self {
        Self {
            value: value.into(),
            is_valid: false,
            error_message: Some(error.message().to_string()),
        }
    }
}

/// Field values captured at submit time and handed to the transport.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormSnapshot {
    values: BTreeMap<FieldKey, String>,
}

impl FormSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: FieldKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        self.values.iter().map(|(key, value)| (*key, value.as_str()))
    }
}

impl FromIterator<(FieldKey, String)> for FormSnapshot {
    fn from_iter<I: IntoIterator<Item = (FieldKey, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// User-facing texts. Every string can be overridden from configuration.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormMessages {
    pub name_too_short: String,
    pub invalid_contact: String,
    pub fix_errors: String,
    pub sending: String,
    pub success: String,
    pub failure: String,
}

impl Default for FormMessages {
    fn default() -> Self {
        Self {
            name_too_short: "name too short".to_string(),
            invalid_contact: "invalid email or phone".to_string(),
            fix_errors: "Please fix the errors in the form".to_string(),
            sending: "Sending your request...".to_string(),
            success: "Thank you! Your request has been received. We will contact you within 15 minutes."
                .to_string(),
            failure: "Something went wrong while sending. Please try again or call us."
                .to_string(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormOptions {
    pub validate_on_input: bool,
    pub clear_on_success: bool,
    pub auto_hide: Duration,
    pub messages: FormMessages,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_on_input: true,
            clear_on_success: true,
            auto_hide: Duration::from_secs(5),
            messages: FormMessages::default(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormStateSnapshot {
    pub submit_state: SubmitState,
    pub submit_count: u32,
    pub is_valid: bool,
    pub fields: BTreeMap<FieldKey, FieldState>,
    pub status: Option<StatusMessage>,
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid submit state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    #[error("form submit is already in progress")]
    AlreadySubmitting,
}

pub type FormResult<T> = Result<T, FormError>;

pub(super) type SyncFieldValidatorFn = Arc<dyn Fn(&str) -> Result<(), ValidationError> + Send + Sync>;

pub(super) struct FormState {
    pub(super) id: FormId,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) fields: BTreeMap<FieldKey, FieldState>,
    pub(super) status: Option<StatusMessage>,
    pub(super) next_ticket: u64,
    pub(super) in_flight: Option<SubmissionTicket>,
    pub(super) pending_hide: Option<HideTicket>,
}

impl FormState {
    pub(super) fn issue_ticket(&mut self) -> u64 {
        self.next_ticket = self.next_ticket.saturating_add(1);
        self.next_ticket
    }
}

/// Owns the contact form's field and submission state and renders every
/// change through the injected [`FormView`].
///
/// The controller is a cheap handle: clones share the same state, so UI
/// callbacks can each hold their own copy.
#[derive(Clone)]
pub struct FormController {
    pub(super) options: Arc<FormOptions>,
    pub(super) state: Arc<RwLock<FormState>>,
    pub(super) validators: Arc<RwLock<BTreeMap<FieldKey, Vec<SyncFieldValidatorFn>>>>,
    pub(super) required_fields: Arc<RwLock<BTreeSet<FieldKey>>>,
    pub(super) view: Arc<dyn FormView>,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) timer: Arc<dyn Timer>,
}

impl FormController {
    pub fn new(
        options: FormOptions,
        view: Arc<dyn FormView>,
        transport: Arc<dyn Transport>,
        timer: Arc<dyn Timer>,
    ) -> Self {
        Self {
            options: Arc::new(options),
            state: Arc::new(RwLock::new(FormState {
                id: FormId::next(),
                submit_state: SubmitState::Idle,
                submit_count: 0,
                fields: BTreeMap::new(),
                status: None,
                next_ticket: 0,
                in_flight: None,
                pending_hide: None,
            })),
            validators: Arc::new(RwLock::new(BTreeMap::new())),
            required_fields: Arc::new(RwLock::new(BTreeSet::new())),
            view,
            transport,
            timer,
        }
    }

    /// Builds the landing page's contact form: a required `name` of at least
    /// two characters and a required `contact` holding a phone or email.
    pub fn contact_form(
        options: FormOptions,
        view: Arc<dyn FormView>,
        transport: Arc<dyn Transport>,
        timer: Arc<dyn Timer>,
    ) -> FormResult<Self> {
        let name_message = options.messages.name_too_short.clone();
        let contact_message = options.messages.invalid_contact.clone();
        let controller = Self::new(options, view, transport, timer);
        controller.register_field_validator(FieldKey::NAME, MinLength::new(2, name_message))?;
        controller
            .register_field_validator(FieldKey::CONTACT, ContactPattern::new(contact_message))?;
        controller.register_required_field(FieldKey::NAME)?;
        controller.register_required_field(FieldKey::CONTACT)?;
        Ok(controller)
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn register_field_validator<V>(&self, key: FieldKey, validator: V) -> FormResult<()>
    where
        V: FieldValidator + 'static,
    {
        let validator = Arc::new(validator);
        let wrapped: SyncFieldValidatorFn = Arc::new(move |value: &str| validator.validate(value));
        let mut validators = write_lock(&self.validators, "registering field validator")?;
        validators.entry(key).or_default().push(wrapped);
        Ok(())
    }

    pub fn register_required_field(&self, key: FieldKey) -> FormResult<()> {
        let mut required = write_lock(&self.required_fields, "registering required field")?;
        required.insert(key);
        Ok(())
    }

    pub fn unregister_required_field(&self, key: FieldKey) -> FormResult<()> {
        let mut required = write_lock(&self.required_fields, "unregistering required field")?;
        required.remove(&key);
        Ok(())
    }

    pub fn is_required(&self, key: FieldKey) -> FormResult<bool> {
        Ok(read_lock(&self.required_fields, "reading required fields")?.contains(&key))
    }

    /// Runs every validator registered for `key` against `value` without
    /// touching form state or the view.
    pub fn check_field(&self, key: FieldKey, value: &str) -> FormResult<FieldState> {
        let validators = read_lock(&self.validators, "reading field validators")?
            .get(&key)
            .cloned()
            .unwrap_or_default();
        for validator in validators {
            if let Err(error) = validator(value) {
                return Ok(FieldState::invalid(value, &error));
            }
        }
        Ok(FieldState::valid(value))
    }

    /// Handles an input event: stores the value, validates it and renders
    /// the field error (or clears it).
    pub fn input(&self, key: FieldKey, value: impl Into<String>) -> FormResult<FieldState> {
        let value = value.into();
        let field = self.check_field(key, &value)?;
        {
            let mut state = write_lock(&self.state, "storing field input")?;
            if state.submit_state == SubmitState::Failed {
                transition_submit_state(&mut state, SubmitState::Idle)?;
            }
            state.fields.insert(key, field.clone());
        }

        if self.options.validate_on_input {
            self.render_field(key, &field);
        }
        Ok(field)
    }

    pub fn field(&self, key: FieldKey) -> FormResult<Option<FieldState>> {
        Ok(read_lock(&self.state, "reading field state")?
            .fields
            .get(&key)
            .cloned())
    }

    pub fn submit_state(&self) -> FormResult<SubmitState> {
        Ok(read_lock(&self.state, "reading submit state")?.submit_state)
    }

    pub fn status(&self) -> FormResult<Option<StatusMessage>> {
        Ok(read_lock(&self.state, "reading status message")?
            .status
            .clone())
    }

    /// Captures the current value of every required or entered field.
    pub fn submission_snapshot(&self) -> FormResult<FormSnapshot> {
        let required = read_lock(&self.required_fields, "reading required fields for snapshot")?
            .clone();
        let state = read_lock(&self.state, "capturing submission snapshot")?;
        let mut snapshot = state
            .fields
            .iter()
            .map(|(key, field)| (*key, field.value.clone()))
            .collect::<FormSnapshot>();
        for key in required {
            if !snapshot.contains(key) {
                snapshot.insert(key, String::new());
            }
        }
        Ok(snapshot)
    }

    pub fn snapshot(&self) -> FormResult<FormStateSnapshot> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormStateSnapshot {
            submit_state: state.submit_state,
            submit_count: state.submit_count,
            is_valid: state.fields.values().all(|field| field.is_valid),
            fields: state.fields.clone(),
            status: state.status.clone(),
        })
    }

    /// Clears every field and message, invalidates any pending auto-hide or
    /// in-flight submission, and returns to `Idle`.
    pub fn reset(&self) -> FormResult<()> {
        let keys = self.known_field_keys()?;
        {
            let mut state = write_lock(&self.state, "resetting form")?;
            state.fields.clear();
            state.status = None;
            state.pending_hide = None;
            state.in_flight = None;
            transition_submit_state(&mut state, SubmitState::Idle)?;
            tracing::debug!(form = %state.id, "form reset");
        }

        self.view.clear_inputs();
        for key in keys {
            self.view.clear_field_error(key);
        }
        self.view.hide_status();
        Ok(())
    }

    pub(super) fn render_field(&self, key: FieldKey, field: &FieldState) {
        match &field.error_message {
            Some(message) => self.view.show_field_error(key, message),
            None => self.view.clear_field_error(key),
        }
    }

    pub(super) fn known_field_keys(&self) -> FormResult<BTreeSet<FieldKey>> {
        let mut keys = BTreeSet::new();
        keys.extend(
            read_lock(&self.validators, "reading validator keys")?
                .keys()
                .copied(),
        );
        keys.extend(
            read_lock(&self.required_fields, "reading required field keys")?
                .iter()
                .copied(),
        );
        keys.extend(
            read_lock(&self.state, "reading known keys from field state")?
                .fields
                .keys()
                .copied(),
        );
        Ok(keys)
    }
}

pub(super) fn transition_submit_state(
    state: &mut FormState,
    next: SubmitState,
) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    tracing::trace!(form = %state.id, from = ?current, to = ?next, "submit state transition");
    state.submit_state = next;
    Ok(())
}

pub(crate) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(crate) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
