use std::time::Duration;

use async_trait::async_trait;

use crate::api::types::BrokerRegistration;
use crate::api::Backend;
use crate::dialogs::{check_email, is_valid_phone, optional, Form, ValidationErrors};
use crate::error::Result;

const MIN_PASSWORD_LEN: usize = 8;

/// Steps of the broker signup wizard, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStep {
    Account,
    Agency,
    Contact,
}

impl RegistrationStep {
    pub const ALL: [RegistrationStep; 3] = [
        RegistrationStep::Account,
        RegistrationStep::Agency,
        RegistrationStep::Contact,
    ];

    pub fn index(self) -> usize {
        match self {
            RegistrationStep::Account => 0,
            RegistrationStep::Agency => 1,
            RegistrationStep::Contact => 2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RegistrationStep::Account => "Account details",
            RegistrationStep::Agency => "Agency information",
            RegistrationStep::Contact => "Contact details",
        }
    }

    fn following(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    fn preceding(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

/// Multi-step broker signup
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationForm {
    step: RegistrationStep,
    pub name: String,
    pub email: String,
    pub password: String,
    pub agency: String,
    pub license_number: String,
    pub phone: String,
    pub office_address: String,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self {
            step: RegistrationStep::Account,
            name: String::new(),
            email: String::new(),
            password: String::new(),
            agency: String::new(),
            license_number: String::new(),
            phone: String::new(),
            office_address: String::new(),
        }
    }
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> RegistrationStep {
        self.step
    }

    pub fn is_final_step(&self) -> bool {
        self.step.following().is_none()
    }

    /// Advance if the current step validates.
    pub fn next(&mut self) -> std::result::Result<RegistrationStep, ValidationErrors> {
        self.validate_step(self.step)?;
        if let Some(following) = self.step.following() {
            self.step = following;
        }
        Ok(self.step)
    }

    /// Go back one step. Entered data is kept.
    pub fn back(&mut self) -> RegistrationStep {
        if let Some(preceding) = self.step.preceding() {
            self.step = preceding;
        }
        self.step
    }

    pub fn validate_step(&self, step: RegistrationStep) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match step {
            RegistrationStep::Account => {
                errors.require("name", &self.name, "Full name is required.");
                check_email(&mut errors, &self.email);
                if self.password.chars().count() < MIN_PASSWORD_LEN {
                    errors.add(
                        "password",
                        format!("Password must be at least {MIN_PASSWORD_LEN} characters."),
                    );
                }
            }
            RegistrationStep::Agency => {
                errors.require("agency", &self.agency, "Agency name is required.");
                let license = self.license_number.trim();
                if license.is_empty() {
                    errors.add("licenseNumber", "License number is required.");
                } else if !(5..=20).contains(&license.len())
                    || !license.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                {
                    errors.add("licenseNumber", "Please enter a valid license number.");
                }
            }
            RegistrationStep::Contact => {
                if self.phone.trim().is_empty() {
                    errors.add("phone", "Phone number is required.");
                } else if !is_valid_phone(&self.phone) {
                    errors.add("phone", "Please enter a valid phone number.");
                }
            }
        }
        errors.into_result()
    }

    pub fn to_registration(&self) -> BrokerRegistration {
        BrokerRegistration {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            agency: self.agency.trim().to_string(),
            license_number: self.license_number.trim().to_string(),
            phone: self.phone.trim().to_string(),
            office_address: optional(&self.office_address),
        }
    }
}

#[async_trait]
impl Form for RegistrationForm {
    type Output = ();

    /// Only the final step can be submitted; every step is checked again.
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !self.is_final_step() {
            errors.add("step", "Please complete every step before submitting.");
            return Err(errors);
        }
        for step in RegistrationStep::ALL {
            if let Err(step_errors) = self.validate_step(step) {
                errors.merge(step_errors);
            }
        }
        errors.into_result()
    }

    async fn submit(&self, backend: &dyn Backend) -> Result<()> {
        backend.register_broker(&self.to_registration()).await
    }

    fn confirmation_delay(&self) -> Duration {
        Duration::from_secs(5)
    }

    fn success_message(&self) -> &'static str {
        "Registration received. An admin will review your broker account."
    }
}
