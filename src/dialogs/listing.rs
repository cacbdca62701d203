use std::time::Duration;

use async_trait::async_trait;

use crate::api::types::ListingDraft;
use crate::api::Backend;
use crate::dialogs::{Form, ValidationErrors};
use crate::error::Result;
use crate::models::Apartment;

/// Create or edit a broker listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingForm {
    /// Set when editing an existing listing
    pub listing_id: Option<String>,
    pub title: String,
    pub price: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f32>,
    pub neighborhood: String,
    pub address: String,
    pub description: String,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
}

impl ListingForm {
    pub fn create() -> Self {
        Self::default()
    }

    /// Form prefilled from an existing listing.
    pub fn edit(apartment: &Apartment) -> Self {
        Self {
            listing_id: Some(apartment.id.clone()),
            title: apartment.title.clone(),
            price: Some(apartment.price),
            bedrooms: Some(apartment.bedrooms),
            bathrooms: Some(apartment.bathrooms),
            neighborhood: apartment.neighborhood.clone(),
            address: apartment.address.clone(),
            description: apartment.description.clone(),
            amenities: apartment.amenities.clone(),
            images: apartment.images.clone(),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.listing_id.is_some()
    }

    /// Draft to send; `None` while a required number is missing.
    pub fn to_draft(&self) -> Option<ListingDraft> {
        Some(ListingDraft {
            title: self.title.trim().to_string(),
            price: self.price?,
            bedrooms: self.bedrooms?,
            bathrooms: self.bathrooms?,
            neighborhood: self.neighborhood.trim().to_string(),
            address: self.address.trim().to_string(),
            description: self.description.trim().to_string(),
            amenities: self.amenities.clone(),
            images: self.images.iter().map(|url| url.trim().to_string()).collect(),
        })
    }
}

#[async_trait]
impl Form for ListingForm {
    type Output = Apartment;

    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, "Title is required.");
        errors.require("neighborhood", &self.neighborhood, "Neighborhood is required.");
        errors.require("address", &self.address, "Address is required.");
        match self.price {
            None => errors.add("price", "Price is required."),
            Some(0) => errors.add("price", "Price must be greater than zero."),
            Some(_) => {}
        }
        if self.bedrooms.is_none() {
            errors.add("bedrooms", "Number of bedrooms is required.");
        }
        match self.bathrooms {
            None => errors.add("bathrooms", "Number of bathrooms is required."),
            Some(baths) if baths <= 0.0 || (baths * 2.0).fract() != 0.0 => {
                errors.add("bathrooms", "Bathrooms must be a positive number in half steps.")
            }
            Some(_) => {}
        }
        if self
            .images
            .iter()
            .any(|url| !(url.starts_with("https://") || url.starts_with("http://")))
        {
            errors.add("images", "Image links must start with http:// or https://.");
        }
        errors.into_result()
    }

    async fn submit(&self, backend: &dyn Backend) -> Result<Apartment> {
        let Some(draft) = self.to_draft() else {
            let mut errors = ValidationErrors::new();
            errors.add("price", "Price, bedrooms and bathrooms are required.");
            return Err(errors.into());
        };
        match &self.listing_id {
            Some(id) => backend.update_listing(id, &draft).await,
            None => backend.create_listing(&draft).await,
        }
    }

    fn confirmation_delay(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn success_message(&self) -> &'static str {
        if self.is_edit() {
            "Listing updated."
        } else {
            "Listing created."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{apartment, FakeBackend};
    use crate::dialogs::Dialog;

    #[test]
    fn blank_listing_reports_required_fields() {
        let errors = ListingForm::create().validate().unwrap_err();
        for field in ["title", "neighborhood", "address", "price", "bedrooms", "bathrooms"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn bad_bathrooms_and_image_links_are_rejected() {
        let mut form = ListingForm::edit(&apartment("a3", 2400, 2));
        form.bathrooms = Some(1.3);
        form.images.push("ftp://img.example.com/x.jpg".to_string());

        let errors = form.validate().unwrap_err();
        assert!(errors.has("bathrooms"));
        assert!(errors.has("images"));
    }

    #[tokio::test]
    async fn edit_updates_and_returns_listing() {
        let backend = FakeBackend::default();
        let mut form = ListingForm::edit(&apartment("a3", 2400, 2));
        form.price = Some(2250);
        form.bathrooms = Some(1.5);

        let mut dialog = Dialog::new(form);
        dialog.open();
        let updated = dialog.submit(&backend).await.unwrap();
        assert_eq!(updated.id, "a3");
        assert_eq!(updated.price, 2250);
        assert_eq!(dialog.form().success_message(), "Listing updated.");
    }
}
