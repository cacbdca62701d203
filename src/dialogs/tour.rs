use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};

use crate::api::types::TourRequest;
use crate::api::Backend;
use crate::dialogs::{check_email, is_valid_phone, optional, Form, ValidationErrors};
use crate::error::Result;

/// Bookable tour slots
pub const TIME_SLOTS: [&str; 8] = [
    "9:00 AM", "10:00 AM", "11:00 AM", "12:00 PM", "1:00 PM", "2:00 PM", "3:00 PM", "4:00 PM",
];

/// Tour booking for a listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourForm {
    pub apartment_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub notes: String,
}

impl TourForm {
    pub fn new(apartment_id: impl Into<String>) -> Self {
        Self {
            apartment_id: apartment_id.into(),
            ..Self::default()
        }
    }

    fn validate_on(&self, today: NaiveDate) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name, "Name is required.");
        check_email(&mut errors, &self.email);
        if !self.phone.trim().is_empty() && !is_valid_phone(&self.phone) {
            errors.add("phone", "Please enter a valid phone number.");
        }
        match self.date {
            None => errors.add("date", "Please pick a date."),
            Some(date) if date < today => errors.add("date", "Tour date cannot be in the past."),
            Some(_) => {}
        }
        match self.time_slot.as_deref() {
            None => errors.add("timeSlot", "Please pick a time."),
            Some(slot) if !TIME_SLOTS.contains(&slot) => {
                errors.add("timeSlot", "Please pick one of the available times.")
            }
            Some(_) => {}
        }
        errors.into_result()
    }

    /// Request body; `None` until date and slot are chosen.
    pub fn to_request(&self) -> Option<TourRequest> {
        Some(TourRequest {
            apartment_id: self.apartment_id.clone(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: optional(&self.phone),
            date: self.date?,
            time_slot: self.time_slot.clone()?,
            notes: self.notes.trim().to_string(),
        })
    }
}

#[async_trait]
impl Form for TourForm {
    type Output = ();

    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        self.validate_on(Local::now().date_naive())
    }

    async fn submit(&self, backend: &dyn Backend) -> Result<()> {
        let mut errors = ValidationErrors::new();
        let Some(request) = self.to_request() else {
            errors.add("date", "Please pick a date and time.");
            return Err(errors.into());
        };
        backend.schedule_tour(&request).await
    }

    fn confirmation_delay(&self) -> Duration {
        Duration::from_secs(5)
    }

    fn success_message(&self) -> &'static str {
        "Your tour request has been sent. The broker will confirm shortly."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::dialogs::{Dialog, DialogState};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn filled() -> TourForm {
        let mut form = TourForm::new("a7");
        form.name = "Jordan".to_string();
        form.email = "jordan@example.com".to_string();
        form.date = Some(day(2999, 6, 1));
        form.time_slot = Some("10:00 AM".to_string());
        form
    }

    #[test]
    fn past_dates_and_unknown_slots_are_rejected() {
        let mut form = filled();
        form.date = Some(day(2024, 3, 1));
        form.time_slot = Some("7:30 PM".to_string());

        let errors = form.validate_on(day(2024, 3, 2)).unwrap_err();
        assert!(errors.has("date"));
        assert!(errors.has("timeSlot"));
    }

    #[test]
    fn today_is_bookable() {
        let mut form = filled();
        form.date = Some(day(2024, 3, 2));
        assert!(form.validate_on(day(2024, 3, 2)).is_ok());
    }

    #[test]
    fn missing_choices_are_reported() {
        let form = TourForm::new("a7");
        let errors = form.validate_on(day(2024, 1, 1)).unwrap_err();
        for field in ["name", "email", "date", "timeSlot"] {
            assert!(errors.has(field), "missing error for {field}");
        }
        assert!(form.to_request().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn booking_sends_one_request_and_closes_after_five_seconds() {
        let backend = FakeBackend::default();
        let mut dialog = Dialog::new(filled());
        dialog.open();

        dialog.submit(&backend).await.unwrap();
        let sent = backend.tour_requests.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].time_slot, "10:00 AM");
        assert!(sent[0].phone.is_none());

        let started = tokio::time::Instant::now();
        dialog.auto_close().await;
        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert_eq!(dialog.state(), &DialogState::Closed);
    }
}
