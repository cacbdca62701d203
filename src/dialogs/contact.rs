use std::time::Duration;

use async_trait::async_trait;

use crate::api::types::ContactRequest;
use crate::api::Backend;
use crate::dialogs::{check_email, is_valid_phone, optional, Form, ValidationErrors};
use crate::error::Result;
use crate::models::Apartment;

const MIN_MESSAGE_LEN: usize = 10;

/// Inquiry to the broker of a listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactForm {
    pub apartment_id: String,
    pub broker_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl ContactForm {
    /// Blank form for `apartment`, with a starter message.
    pub fn for_apartment(apartment: &Apartment) -> Self {
        let subject = if apartment.title.is_empty() {
            "this apartment".to_string()
        } else {
            apartment.title.clone()
        };
        Self {
            apartment_id: apartment.id.clone(),
            broker_id: apartment.broker_id.clone(),
            message: format!("Hi, I'm interested in {subject}. Is it still available?"),
            ..Self::default()
        }
    }

    pub fn to_request(&self) -> ContactRequest {
        ContactRequest {
            apartment_id: self.apartment_id.clone(),
            broker_id: self.broker_id.clone(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: optional(&self.phone),
            message: self.message.trim().to_string(),
        }
    }
}

#[async_trait]
impl Form for ContactForm {
    type Output = ();

    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name, "Name is required.");
        check_email(&mut errors, &self.email);
        if !self.phone.trim().is_empty() && !is_valid_phone(&self.phone) {
            errors.add("phone", "Please enter a valid phone number.");
        }
        if self.message.trim().chars().count() < MIN_MESSAGE_LEN {
            errors.add(
                "message",
                format!("Message must be at least {MIN_MESSAGE_LEN} characters."),
            );
        }
        errors.into_result()
    }

    async fn submit(&self, backend: &dyn Backend) -> Result<()> {
        backend.contact_broker(&self.to_request()).await
    }

    fn confirmation_delay(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn success_message(&self) -> &'static str {
        "Your message has been sent to the broker."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{apartment, FakeBackend};
    use crate::dialogs::{Dialog, DialogState};
    use crate::error::ClientError;
    use std::sync::atomic::Ordering;

    fn filled() -> ContactForm {
        let mut form = ContactForm::for_apartment(&apartment("a1", 2100, 2));
        form.name = "Riley".to_string();
        form.email = "riley@example.com".to_string();
        form
    }

    #[test]
    fn starter_message_mentions_listing() {
        let form = ContactForm::for_apartment(&apartment("a1", 2100, 2));
        assert!(form.message.contains("Apartment a1"));
        assert_eq!(form.broker_id.as_deref(), Some("broker-1"));
    }

    #[tokio::test]
    async fn invalid_form_makes_no_request() {
        let backend = FakeBackend::default();
        let mut form = filled();
        form.email = "riley.example.com".to_string();
        form.phone = "12".to_string();
        let mut dialog = Dialog::new(form);
        dialog.open();

        let err = dialog.submit(&backend).await.unwrap_err();
        match err {
            ClientError::Validation(errors) => {
                assert!(errors.has("email"));
                assert!(errors.has("phone"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(backend.contact_requests.lock().unwrap().is_empty());
        assert!(matches!(dialog.state(), DialogState::Editing { error: Some(_) }));
    }

    #[tokio::test(start_paused = true)]
    async fn success_confirms_then_closes() {
        let backend = FakeBackend::default();
        let mut dialog = Dialog::new(filled());
        dialog.open();

        dialog.submit(&backend).await.unwrap();
        assert_eq!(backend.contact_requests.lock().unwrap().len(), 1);
        assert!(matches!(dialog.state(), DialogState::Done { .. }));

        let started = tokio::time::Instant::now();
        dialog.auto_close().await;
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        assert_eq!(dialog.state(), &DialogState::Closed);
    }

    #[tokio::test]
    async fn failure_keeps_entered_data() {
        let backend = FakeBackend::default();
        backend.fail_mutations.store(true, Ordering::SeqCst);
        let mut dialog = Dialog::new(filled());
        dialog.open();

        assert!(dialog.submit(&backend).await.is_err());
        assert_eq!(
            dialog.state(),
            &DialogState::Editing {
                error: Some("backend unavailable".to_string())
            }
        );
        assert_eq!(dialog.form().name, "Riley");
        assert_eq!(backend.contact_requests.lock().unwrap().len(), 1);

        backend.fail_mutations.store(false, Ordering::SeqCst);
        dialog.submit(&backend).await.unwrap();
        assert_eq!(backend.contact_requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn closed_dialog_refuses_submit() {
        let backend = FakeBackend::default();
        let mut dialog = Dialog::new(filled());

        assert!(matches!(
            dialog.submit(&backend).await,
            Err(ClientError::DialogNotEditing)
        ));
        assert!(backend.contact_requests.lock().unwrap().is_empty());
    }
}
