//! In-memory backend used by the unit tests.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::traits::Backend;
use crate::api::types::{
    BrokerRegistration, ContactRequest, Credentials, ListingDraft, MatchQuery, TourRequest,
};
use crate::error::{ClientError, Result};
use crate::models::{Apartment, BrokerAccount, BrokerStatus, Match, MatchPage, Role, User};

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub session: Mutex<Option<User>>,
    pub session_fails: AtomicBool,
    pub broker_statuses: Mutex<VecDeque<Result<BrokerStatus>>>,
    pub broker_me_calls: AtomicUsize,
    pub catalogue: Mutex<Vec<Match>>,
    pub match_queries: Mutex<Vec<MatchQuery>>,
    pub page_delays: Mutex<HashMap<u32, Duration>>,
    pub fail_matches: AtomicBool,
    pub saved: Mutex<BTreeSet<String>>,
    pub fail_saved_list: AtomicBool,
    pub fail_set_saved: AtomicBool,
    pub set_saved_calls: Mutex<Vec<(String, bool)>>,
    /// Per-call delay and whether the call succeeds, consumed in call order
    pub save_script: Mutex<VecDeque<(Duration, bool)>>,
    pub similar_fails: AtomicBool,
    pub contact_requests: Mutex<Vec<ContactRequest>>,
    pub tour_requests: Mutex<Vec<TourRequest>>,
    pub registrations: Mutex<Vec<BrokerRegistration>>,
    pub listings: Mutex<Vec<Apartment>>,
    pub brokers: Mutex<Vec<BrokerAccount>>,
    pub fail_mutations: AtomicBool,
    pub logout_calls: AtomicUsize,
}

pub(crate) fn failure() -> ClientError {
    ClientError::Status {
        status: 500,
        message: "backend unavailable".to_string(),
    }
}

pub(crate) fn user(role: Role, approved: bool) -> User {
    User {
        id: format!("{role:?}-1").to_lowercase(),
        name: "Test Account".to_string(),
        email: "account@example.com".to_string(),
        role,
        is_approved: approved,
    }
}

pub(crate) fn apartment(id: &str, price: u32, bedrooms: u32) -> Apartment {
    Apartment {
        id: id.to_string(),
        title: format!("Apartment {id}"),
        price,
        bedrooms,
        bathrooms: 1.0,
        neighborhood: "Astoria".to_string(),
        address: "31-10 Broadway".to_string(),
        images: vec![
            "https://img.example.com/1.jpg".to_string(),
            "https://img.example.com/2.jpg".to_string(),
            "https://img.example.com/3.jpg".to_string(),
        ],
        amenities: vec!["Laundry".to_string()],
        location: None,
        description: String::new(),
        broker_id: Some("broker-1".to_string()),
        created_at: None,
    }
}

pub(crate) fn scored(apartment: Apartment, score: f64, explanation: Option<&str>) -> Match {
    Match {
        id: format!("m-{}", apartment.id),
        apartment,
        match_score: score,
        explanation: explanation.map(str::to_string),
    }
}

impl FakeBackend {
    pub fn with_catalogue(count: usize) -> Self {
        let backend = Self::default();
        *backend.catalogue.lock().unwrap() = (0..count)
            .map(|i| scored(apartment(&format!("a{i}"), 1500 + i as u32 * 100, 2), 90.0, None))
            .collect();
        backend
    }

    pub fn match_calls(&self) -> usize {
        self.match_queries.lock().unwrap().len()
    }

    fn mutation_guard(&self) -> Result<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            Err(failure())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn check_session(&self) -> Result<Option<User>> {
        if self.session_fails.load(Ordering::SeqCst) {
            return Err(failure());
        }
        Ok(self.session.lock().unwrap().clone())
    }

    async fn broker_me(&self) -> Result<BrokerStatus> {
        self.broker_me_calls.fetch_add(1, Ordering::SeqCst);
        self.broker_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(BrokerStatus::default()))
    }

    async fn login(&self, credentials: &Credentials) -> Result<User> {
        if credentials.password != "correct-horse" {
            return Err(ClientError::Unauthorized);
        }
        let session = self.session.lock().unwrap().clone();
        session.ok_or(ClientError::Unauthorized)
    }

    async fn logout(&self) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.mutation_guard()
    }

    async fn fetch_matches(&self, _preference_id: &str, query: &MatchQuery) -> Result<MatchPage> {
        self.match_queries.lock().unwrap().push(query.clone());
        let delay = self.page_delays.lock().unwrap().get(&query.page).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_matches.load(Ordering::SeqCst) {
            return Err(failure());
        }

        let catalogue = self.catalogue.lock().unwrap();
        let start = ((query.page.max(1) - 1) * query.limit) as usize;
        let results = catalogue
            .iter()
            .skip(start)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok(MatchPage {
            results,
            total_count: catalogue.len() as u64,
            filtered_count: catalogue.len() as u64,
        })
    }

    async fn saved_apartments(&self) -> Result<Vec<Apartment>> {
        if self.fail_saved_list.load(Ordering::SeqCst) {
            return Err(failure());
        }
        let saved = self.saved.lock().unwrap();
        Ok(saved.iter().map(|id| apartment(id, 2000, 1)).collect())
    }

    async fn set_saved(&self, apartment_id: &str, saved: bool) -> Result<()> {
        self.set_saved_calls
            .lock()
            .unwrap()
            .push((apartment_id.to_string(), saved));
        let scripted = self.save_script.lock().unwrap().pop_front();
        if let Some((delay, accepted)) = scripted {
            tokio::time::sleep(delay).await;
            if !accepted {
                return Err(failure());
            }
        } else if self.fail_set_saved.load(Ordering::SeqCst) {
            return Err(failure());
        }
        let mut set = self.saved.lock().unwrap();
        if saved {
            set.insert(apartment_id.to_string());
        } else {
            set.remove(apartment_id);
        }
        Ok(())
    }

    async fn similar_apartments(&self, apartment_id: &str) -> Result<Vec<Apartment>> {
        if self.similar_fails.load(Ordering::SeqCst) {
            return Err(failure());
        }
        Ok(vec![apartment(&format!("{apartment_id}-near"), 1900, 2)])
    }

    async fn contact_broker(&self, request: &ContactRequest) -> Result<()> {
        self.contact_requests.lock().unwrap().push(request.clone());
        self.mutation_guard()
    }

    async fn schedule_tour(&self, request: &TourRequest) -> Result<()> {
        self.tour_requests.lock().unwrap().push(request.clone());
        self.mutation_guard()
    }

    async fn register_broker(&self, registration: &BrokerRegistration) -> Result<()> {
        self.registrations.lock().unwrap().push(registration.clone());
        self.mutation_guard()
    }

    async fn broker_listings(&self) -> Result<Vec<Apartment>> {
        self.mutation_guard()?;
        Ok(self.listings.lock().unwrap().clone())
    }

    async fn create_listing(&self, draft: &ListingDraft) -> Result<Apartment> {
        self.mutation_guard()?;
        let mut listings = self.listings.lock().unwrap();
        let mut created = apartment(&format!("new-{}", listings.len()), draft.price, draft.bedrooms);
        created.title = draft.title.clone();
        created.neighborhood = draft.neighborhood.clone();
        created.images = draft.images.clone();
        listings.push(created.clone());
        Ok(created)
    }

    async fn update_listing(&self, listing_id: &str, draft: &ListingDraft) -> Result<Apartment> {
        self.mutation_guard()?;
        let mut updated = apartment(listing_id, draft.price, draft.bedrooms);
        updated.title = draft.title.clone();
        updated.neighborhood = draft.neighborhood.clone();
        updated.images = draft.images.clone();
        Ok(updated)
    }

    async fn delete_listing(&self, listing_id: &str) -> Result<()> {
        self.mutation_guard()?;
        self.listings.lock().unwrap().retain(|listing| listing.id != listing_id);
        Ok(())
    }

    async fn list_brokers(&self) -> Result<Vec<BrokerAccount>> {
        self.mutation_guard()?;
        Ok(self.brokers.lock().unwrap().clone())
    }

    async fn approve_broker(&self, _broker_id: &str) -> Result<()> {
        self.mutation_guard()
    }

    async fn revoke_broker(&self, _broker_id: &str) -> Result<()> {
        self.mutation_guard()
    }
}
