use crate::api::traits::Backend;
use crate::api::types::{
    BrokerRegistration, ContactRequest, Credentials, ListingDraft, MatchQuery, SaveRequest,
    SavedResponse, SessionResponse, TourRequest,
};
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::{Apartment, BrokerAccount, BrokerStatus, MatchPage, User};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Method, Request, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// HomeFit backend reached over HTTP with a cookie-based session
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.api_url).map_err(|err| ClientError::Config {
            key: "HOMEFIT_API_URL".to_string(),
            message: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config {
                key: "HOMEFIT_API_URL".to_string(),
                message: format!("{base_url} cannot hold a path"),
            });
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .user_agent(concat!("homefit-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Endpoint URL with every segment percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client.request(method, self.url(segments))
    }

    fn session_request(&self) -> Result<Request> {
        Ok(self.request(Method::GET, &["api", "user", "session"]).build()?)
    }

    fn broker_me_request(&self) -> Result<Request> {
        Ok(self.request(Method::GET, &["api", "broker", "me"]).build()?)
    }

    fn login_request(&self, credentials: &Credentials) -> Result<Request> {
        Ok(self
            .request(Method::POST, &["api", "user", "login"])
            .json(credentials)
            .build()?)
    }

    fn logout_request(&self) -> Result<Request> {
        Ok(self.request(Method::POST, &["api", "user", "logout"]).build()?)
    }

    fn matches_request(&self, preference_id: &str, query: &MatchQuery) -> Result<Request> {
        let mut request = self
            .request(Method::GET, &["api", "user", "matches", preference_id])
            .query(&query.to_query_pairs());

        if query.force_refresh {
            request = request
                .header(CACHE_CONTROL, "no-cache, no-store")
                .header(PRAGMA, "no-cache");
        }

        Ok(request.build()?)
    }

    fn saved_list_request(&self) -> Result<Request> {
        Ok(self.request(Method::GET, &["api", "user", "saved"]).build()?)
    }

    fn set_saved_request(&self, apartment_id: &str, saved: bool) -> Result<Request> {
        Ok(self
            .request(Method::POST, &["api", "user", "save"])
            .json(&SaveRequest {
                apartment_id,
                saved,
            })
            .build()?)
    }

    fn similar_request(&self, apartment_id: &str) -> Result<Request> {
        Ok(self
            .request(Method::GET, &["api", "apartments", apartment_id, "similar"])
            .build()?)
    }

    fn contact_request(&self, request: &ContactRequest) -> Result<Request> {
        Ok(self
            .request(Method::POST, &["api", "user", "contact-broker"])
            .json(request)
            .build()?)
    }

    fn tour_request(&self, request: &TourRequest) -> Result<Request> {
        Ok(self
            .request(Method::POST, &["api", "tours", "schedule"])
            .json(request)
            .build()?)
    }

    fn registration_request(&self, registration: &BrokerRegistration) -> Result<Request> {
        Ok(self
            .request(Method::POST, &["api", "broker", "register"])
            .json(registration)
            .build()?)
    }

    /// Listing collection, or one listing when `listing_id` is given
    fn listing_request(&self, method: Method, listing_id: Option<&str>) -> RequestBuilder {
        match listing_id {
            Some(id) => self.request(method, &["api", "broker", "listings", id]),
            None => self.request(method, &["api", "broker", "listings"]),
        }
    }

    fn brokers_request(&self) -> Result<Request> {
        Ok(self.request(Method::GET, &["api", "admin", "brokers"]).build()?)
    }

    fn approval_request(&self, broker_id: &str, approved: bool) -> Result<Request> {
        let action = if approved { "approve-broker" } else { "revoke-broker" };
        Ok(self
            .request(Method::POST, &["api", "admin", action, broker_id])
            .build()?)
    }

    /// Send the request and decode a JSON body
    async fn send_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send the request, checking the status and discarding the body
    async fn send_empty(&self, request: Request) -> Result<()> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: Request) -> Result<String> {
        let response = self.client.execute(request).await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;

        debug!("{} {} ({} bytes)", status.as_u16(), url, body.len());
        check_status(status, &url, &body)?;
        Ok(body)
    }
}

fn check_status(status: StatusCode, url: &str, body: &str) -> Result<()> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }
    if !status.is_success() {
        warn!("Backend returned status {} for {}", status, url);
        return Err(ClientError::Status {
            status: status.as_u16(),
            message: error_message(body),
        });
    }
    Ok(())
}

/// A rejected session check means nobody is logged in
fn session_user(response: Result<SessionResponse>) -> Result<Option<User>> {
    match response {
        Ok(session) => Ok(session.user),
        Err(ClientError::Unauthorized) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Pull the human-readable message out of an error body, if there is one
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_default()
}

#[async_trait]
impl Backend for HttpBackend {
    async fn check_session(&self) -> Result<Option<User>> {
        let request = self.session_request()?;
        session_user(self.send_json(request).await)
    }

    async fn broker_me(&self) -> Result<BrokerStatus> {
        self.send_json(self.broker_me_request()?).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<User> {
        let session: SessionResponse = self.send_json(self.login_request(credentials)?).await?;
        session.user.ok_or(ClientError::Unauthorized)
    }

    async fn logout(&self) -> Result<()> {
        self.send_empty(self.logout_request()?).await
    }

    async fn fetch_matches(&self, preference_id: &str, query: &MatchQuery) -> Result<MatchPage> {
        self.send_json(self.matches_request(preference_id, query)?)
            .await
    }

    async fn saved_apartments(&self) -> Result<Vec<Apartment>> {
        let saved: SavedResponse = self.send_json(self.saved_list_request()?).await?;
        Ok(saved.into_apartments())
    }

    async fn set_saved(&self, apartment_id: &str, saved: bool) -> Result<()> {
        self.send_empty(self.set_saved_request(apartment_id, saved)?)
            .await
    }

    async fn similar_apartments(&self, apartment_id: &str) -> Result<Vec<Apartment>> {
        self.send_json(self.similar_request(apartment_id)?).await
    }

    async fn contact_broker(&self, request: &ContactRequest) -> Result<()> {
        self.send_empty(self.contact_request(request)?).await
    }

    async fn schedule_tour(&self, request: &TourRequest) -> Result<()> {
        self.send_empty(self.tour_request(request)?).await
    }

    async fn register_broker(&self, registration: &BrokerRegistration) -> Result<()> {
        self.send_empty(self.registration_request(registration)?)
            .await
    }

    async fn broker_listings(&self) -> Result<Vec<Apartment>> {
        let request = self.listing_request(Method::GET, None).build()?;
        self.send_json(request).await
    }

    async fn create_listing(&self, draft: &ListingDraft) -> Result<Apartment> {
        let request = self.listing_request(Method::POST, None).json(draft).build()?;
        self.send_json(request).await
    }

    async fn update_listing(&self, listing_id: &str, draft: &ListingDraft) -> Result<Apartment> {
        let request = self
            .listing_request(Method::PUT, Some(listing_id))
            .json(draft)
            .build()?;
        self.send_json(request).await
    }

    async fn delete_listing(&self, listing_id: &str) -> Result<()> {
        let request = self
            .listing_request(Method::DELETE, Some(listing_id))
            .build()?;
        self.send_empty(request).await
    }

    async fn list_brokers(&self) -> Result<Vec<BrokerAccount>> {
        self.send_json(self.brokers_request()?).await
    }

    async fn approve_broker(&self, broker_id: &str) -> Result<()> {
        self.send_empty(self.approval_request(broker_id, true)?)
            .await
    }

    async fn revoke_broker(&self, broker_id: &str) -> Result<()> {
        self.send_empty(self.approval_request(broker_id, false)?)
            .await
    }
}
