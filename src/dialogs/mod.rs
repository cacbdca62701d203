//! Modal forms that submit a single request.
//!
//! Every dialog runs the same state machine: `Closed → Editing → Submitting`
//! and then either `Done` (auto-closing after a short confirmation) or back
//! to `Editing` with an inline error and the entered data intact.

pub mod contact;
pub mod listing;
pub mod registration;
pub mod tour;

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::api::Backend;
use crate::error::{ClientError, Result};

pub use contact::ContactForm;
pub use listing::ListingForm;
pub use registration::{RegistrationForm, RegistrationStep};
pub use tour::TourForm;

/// A single invalid field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All invalid fields of a form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Record `message` for `field` when the value is blank.
    pub fn require(&mut self, field: &'static str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn merge(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|error| error.message.as_str()).collect();
        f.write_str(&messages.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_valid_email(value: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
        })
        .is_match(value.trim())
}

pub fn is_valid_phone(value: &str) -> bool {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE
        .get_or_init(|| Regex::new(r"^\+?[0-9][0-9 ().-]{6,19}$").expect("phone pattern is valid"))
        .is_match(value.trim())
}

/// Validate an email field: required and well-formed.
pub(crate) fn check_email(errors: &mut ValidationErrors, value: &str) {
    if value.trim().is_empty() {
        errors.add("email", "Email is required.");
    } else if !is_valid_email(value) {
        errors.add("email", "Please enter a valid email address.");
    }
}

/// Optional text: `None` when blank.
pub(crate) fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A form a dialog can submit
#[async_trait]
pub trait Form: Send + Sync {
    type Output: Send;

    /// Local presence and format checks.
    fn validate(&self) -> std::result::Result<(), ValidationErrors>;

    /// Issue the single request for this form.
    async fn submit(&self, backend: &dyn Backend) -> Result<Self::Output>;

    /// How long the confirmation stays up before the dialog closes.
    fn confirmation_delay(&self) -> Duration;

    fn success_message(&self) -> &'static str;
}

/// Lifecycle of a dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Editing { error: Option<String> },
    Submitting,
    Done { message: &'static str },
}

/// A form plus its dialog state
pub struct Dialog<F: Form> {
    form: F,
    state: DialogState,
}

impl<F: Form> Dialog<F> {
    pub fn new(form: F) -> Self {
        Self {
            form,
            state: DialogState::Closed,
        }
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != DialogState::Closed
    }

    pub fn open(&mut self) {
        if self.state == DialogState::Closed || matches!(self.state, DialogState::Done { .. }) {
            self.state = DialogState::Editing { error: None };
        }
    }

    pub fn close(&mut self) {
        self.state = DialogState::Closed;
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    pub fn into_form(self) -> F {
        self.form
    }

    /// Validate and submit. Exactly one request is made when validation passes.
    pub async fn submit(&mut self, backend: &dyn Backend) -> Result<F::Output> {
        if !matches!(self.state, DialogState::Editing { .. }) {
            return Err(ClientError::DialogNotEditing);
        }

        if let Err(errors) = self.form.validate() {
            debug!("Form rejected locally: {errors}");
            self.state = DialogState::Editing {
                error: Some(errors.to_string()),
            };
            return Err(errors.into());
        }

        self.state = DialogState::Submitting;
        match self.form.submit(backend).await {
            Ok(output) => {
                info!("{}", self.form.success_message());
                self.state = DialogState::Done {
                    message: self.form.success_message(),
                };
                Ok(output)
            }
            Err(err) => {
                warn!("Form submission failed: {err}");
                self.state = DialogState::Editing {
                    error: Some(err.user_message()),
                };
                Err(err)
            }
        }
    }

    /// Hold the confirmation for the form's delay, then close.
    pub async fn auto_close(&mut self) {
        if !matches!(self.state, DialogState::Done { .. }) {
            return;
        }
        tokio::time::sleep(self.form.confirmation_delay()).await;
        self.close();
    }
}
