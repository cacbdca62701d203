use crate::api::types::{
    BrokerRegistration, ContactRequest, Credentials, ListingDraft, MatchQuery, TourRequest,
};
use crate::error::Result;
use crate::models::{Apartment, BrokerAccount, BrokerStatus, MatchPage, User};
use async_trait::async_trait;

/// Operations the client needs from the HomeFit backend
/// Implemented over HTTP by `HttpBackend`; tests substitute in-memory fakes
#[async_trait]
pub trait Backend: Send + Sync {
    /// Current session's user, `None` when nobody is logged in
    async fn check_session(&self) -> Result<Option<User>>;

    /// Broker-specific fields for the logged-in broker
    async fn broker_me(&self) -> Result<BrokerStatus>;

    async fn login(&self, credentials: &Credentials) -> Result<User>;

    async fn logout(&self) -> Result<()>;

    async fn fetch_matches(&self, preference_id: &str, query: &MatchQuery) -> Result<MatchPage>;

    async fn saved_apartments(&self) -> Result<Vec<Apartment>>;

    /// Persist the saved flag of an apartment for the current user
    async fn set_saved(&self, apartment_id: &str, saved: bool) -> Result<()>;

    async fn similar_apartments(&self, apartment_id: &str) -> Result<Vec<Apartment>>;

    async fn contact_broker(&self, request: &ContactRequest) -> Result<()>;

    async fn schedule_tour(&self, request: &TourRequest) -> Result<()>;

    async fn register_broker(&self, registration: &BrokerRegistration) -> Result<()>;

    async fn broker_listings(&self) -> Result<Vec<Apartment>>;

    async fn create_listing(&self, draft: &ListingDraft) -> Result<Apartment>;

    async fn update_listing(&self, listing_id: &str, draft: &ListingDraft) -> Result<Apartment>;

    async fn delete_listing(&self, listing_id: &str) -> Result<()>;

    async fn list_brokers(&self) -> Result<Vec<BrokerAccount>>;

    async fn approve_broker(&self, broker_id: &str) -> Result<()>;

    async fn revoke_broker(&self, broker_id: &str) -> Result<()>;
}
