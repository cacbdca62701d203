//! A broker's own listings.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::Backend;
use crate::error::Result;
use crate::models::Apartment;

/// Listings managed by the logged-in broker
pub struct BrokerListings {
    backend: Arc<dyn Backend>,
    listings: Vec<Apartment>,
    error: Option<String>,
}

impl BrokerListings {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            listings: Vec::new(),
            error: None,
        }
    }

    pub fn listings(&self) -> &[Apartment] {
        &self.listings
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn load(&mut self) -> Result<()> {
        match self.backend.broker_listings().await {
            Ok(listings) => {
                info!("Loaded {} broker listings", listings.len());
                self.listings = listings;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                warn!("Could not load broker listings: {err}");
                self.listings.clear();
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Patch in a listing returned by the listing dialog.
    pub fn apply_saved(&mut self, listing: Apartment) {
        match self.listings.iter_mut().find(|existing| existing.id == listing.id) {
            Some(existing) => *existing = listing,
            None => self.listings.insert(0, listing),
        }
    }

    pub async fn delete(&mut self, listing_id: &str) -> Result<()> {
        if let Err(err) = self.backend.delete_listing(listing_id).await {
            warn!("Deleting listing {listing_id} failed: {err}");
            self.error = Some(err.user_message());
            return Err(err);
        }
        self.listings.retain(|listing| listing.id != listing_id);
        self.error = None;
        Ok(())
    }
}
