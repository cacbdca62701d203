//! Match list state: paging, sorting, filtering, refresh and saved flags.

pub mod explanation;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::types::{MatchQuery, SortBy, SortOrder};
use crate::api::Backend;
use crate::card::{Gallery, Pending};
use crate::config::Config;
use crate::error::Result;
use crate::filters::Filters;
use crate::models::{Apartment, Match, MatchPage};
use crate::session::{IdentityStore, SessionEvent, AUTH_TOKEN_KEY};

pub use explanation::{explain, Hint, HintKind};

/// Staged message shown while a fetch is in flight.
pub fn loading_message(elapsed: Duration) -> &'static str {
    if elapsed < Duration::from_secs(3) {
        "Finding your matches..."
    } else if elapsed < Duration::from_secs(8) {
        "Scoring apartments against your preferences..."
    } else {
        "Almost there..."
    }
}

/// A match ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCard {
    pub record: Match,
    pub score: u8,
    pub hints: Vec<Hint>,
    pub gallery: Gallery,
}

impl MatchCard {
    pub fn new(record: Match) -> Self {
        let hints = explain(
            record.explanation.as_deref(),
            record.match_score,
            &record.apartment,
        );
        Self {
            score: record.display_score(),
            gallery: Gallery::new(record.apartment.images.len()),
            hints,
            record,
        }
    }

    pub fn apartment_id(&self) -> &str {
        &self.record.apartment.id
    }

    pub fn active_image(&self) -> Option<&str> {
        self.record
            .apartment
            .images
            .get(self.gallery.active_index())
            .map(String::as_str)
    }
}

/// What happened to a fetch's response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch started before this one finished; the response was dropped
    Stale,
    /// Nothing changed, so no request was made
    Unchanged,
}

/// Result of a manual refresh
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Refreshed(FetchOutcome),
    Throttled { retry_in: Duration, message: String },
}

/// Snapshot of the match list
#[derive(Debug, Clone)]
pub struct ViewState {
    pub page: u32,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub filters: Option<Filters>,
    pub cards: Vec<MatchCard>,
    pub total_count: u64,
    pub filtered_count: u64,
    pub loading: bool,
    /// User-visible failure of the last fetch
    pub error: Option<String>,
    /// Transient message, e.g. a throttled refresh
    pub notice: Option<String>,
    pub saved: HashMap<String, bool>,
    last_fetch: Option<Instant>,
    loading_since: Option<Instant>,
    generation: u64,
    /// Latest toggle per apartment; only that toggle may settle the flag
    save_seq: HashMap<String, u64>,
    login_refreshed: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            page: 1,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            filters: None,
            cards: Vec::new(),
            total_count: 0,
            filtered_count: 0,
            loading: false,
            error: None,
            notice: None,
            saved: HashMap::new(),
            last_fetch: None,
            loading_since: None,
            generation: 0,
            save_seq: HashMap::new(),
            login_refreshed: false,
        }
    }
}

impl ViewState {
    pub fn is_saved(&self, apartment_id: &str) -> bool {
        self.saved.get(apartment_id).copied().unwrap_or(false)
    }

    /// Shown instead of cards when there is nothing to list.
    pub fn empty_message(&self) -> Option<String> {
        if self.loading || !self.cards.is_empty() {
            return None;
        }
        Some(match &self.error {
            Some(error) => error.clone(),
            None if self.filters.is_some() => "No apartments match these filters.".to_string(),
            None => "No matches yet. Check back soon.".to_string(),
        })
    }

    fn card_mut(&mut self, apartment_id: &str) -> Option<&mut MatchCard> {
        self.cards
            .iter_mut()
            .find(|card| card.apartment_id() == apartment_id)
    }

    fn apply_page(&mut self, page: MatchPage) {
        self.cards = page.results.into_iter().map(MatchCard::new).collect();
        self.total_count = page.total_count;
        self.filtered_count = page.filtered_count;
        self.error = None;
    }
}

/// Match list for one saved preference
pub struct MatchView {
    backend: Arc<dyn Backend>,
    preference_id: String,
    page_size: u32,
    refresh_cooldown: Duration,
    state: Mutex<ViewState>,
}

impl MatchView {
    pub fn new(backend: Arc<dyn Backend>, preference_id: impl Into<String>, config: &Config) -> Self {
        Self {
            backend,
            preference_id: preference_id.into(),
            page_size: config.page_size.max(1),
            refresh_cooldown: config.refresh_cooldown,
            state: Mutex::new(ViewState::default()),
        }
    }

    /// Start on `page` instead of the first one.
    pub fn starting_at(mut self, page: u32) -> Self {
        self.state.get_mut().page = page.max(1);
        self
    }

    pub fn sorted_by(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        let state = self.state.get_mut();
        state.sort_by = sort_by;
        state.sort_order = sort_order;
        self
    }

    pub fn filtered(mut self, filters: Option<Filters>) -> Self {
        self.state.get_mut().filters = filters;
        self
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.lock().await.clone()
    }

    pub async fn total_pages(&self) -> u64 {
        let state = self.state.lock().await;
        state.filtered_count.div_ceil(u64::from(self.page_size))
    }

    /// Message for the current in-flight fetch, if any.
    pub async fn loading_message(&self) -> Option<&'static str> {
        let state = self.state.lock().await;
        match (state.loading, state.loading_since) {
            (true, Some(since)) => Some(loading_message(since.elapsed())),
            _ => None,
        }
    }

    /// Initial load: saved flags, then the first page.
    pub async fn load(&self) -> Result<FetchOutcome> {
        self.load_saved().await;
        self.fetch(false).await
    }

    /// Seed the saved map. Failures leave it empty.
    pub async fn load_saved(&self) {
        match self.backend.saved_apartments().await {
            Ok(apartments) => {
                let saved = apartments
                    .into_iter()
                    .map(|apartment| (apartment.id, true))
                    .collect();
                self.state.lock().await.saved = saved;
            }
            Err(err) => {
                warn!("Could not load saved apartments: {err}");
                self.state.lock().await.saved.clear();
            }
        }
    }

    pub async fn set_page(&self, page: u32) -> Result<FetchOutcome> {
        let page = page.max(1);
        {
            let mut state = self.state.lock().await;
            if state.page == page {
                return Ok(FetchOutcome::Unchanged);
            }
            state.page = page;
        }
        self.fetch(false).await
    }

    /// Change the sort; returns to the first page.
    pub async fn set_sort(&self, sort_by: SortBy, sort_order: SortOrder) -> Result<FetchOutcome> {
        {
            let mut state = self.state.lock().await;
            if state.sort_by == sort_by && state.sort_order == sort_order {
                return Ok(FetchOutcome::Unchanged);
            }
            state.sort_by = sort_by;
            state.sort_order = sort_order;
            state.page = 1;
        }
        self.fetch(false).await
    }

    /// Apply filters from the panel; returns to the first page.
    pub async fn apply_filters(&self, filters: Filters) -> Result<FetchOutcome> {
        {
            let mut state = self.state.lock().await;
            state.filters = Some(filters);
            state.page = 1;
        }
        self.fetch(false).await
    }

    /// Drop all filters; returns to the first page.
    pub async fn reset_filters(&self) -> Result<FetchOutcome> {
        {
            let mut state = self.state.lock().await;
            state.filters = None;
            state.page = 1;
        }
        self.fetch(false).await
    }

    /// Manual refresh, refused while within the cooldown of the last successful fetch.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        {
            let mut state = self.state.lock().await;
            if let Some(last) = state.last_fetch {
                let elapsed = last.elapsed();
                if elapsed < self.refresh_cooldown {
                    let retry_in = self.refresh_cooldown - elapsed;
                    let message = format!(
                        "Please wait {} seconds before refreshing again.",
                        retry_in.as_secs_f64().ceil() as u64
                    );
                    debug!("Refresh throttled, {}ms left", retry_in.as_millis());
                    state.notice = Some(message.clone());
                    return Ok(RefreshOutcome::Throttled { retry_in, message });
                }
            }
            state.notice = None;
        }

        info!("Refreshing matches for preference {}", self.preference_id);
        Ok(RefreshOutcome::Refreshed(self.fetch(true).await?))
    }

    /// React to login changes. Forces one refresh per login session.
    /// Returns whether a refresh was issued.
    pub async fn handle_session_event(&self, event: &SessionEvent) -> Result<bool> {
        let logged_in = match event {
            SessionEvent::LoggedIn(_) => true,
            SessionEvent::StorageChanged { key, value } if key == AUTH_TOKEN_KEY => value.is_some(),
            SessionEvent::StorageChanged { .. } => return Ok(false),
            SessionEvent::LoggedOut => false,
        };

        if !logged_in {
            let mut state = self.state.lock().await;
            state.login_refreshed = false;
            state.saved.clear();
            return Ok(false);
        }

        {
            let mut state = self.state.lock().await;
            if state.login_refreshed {
                return Ok(false);
            }
            state.login_refreshed = true;
        }

        info!("Login detected, forcing a fresh match list");
        self.load_saved().await;
        self.fetch(true).await?;
        Ok(true)
    }

    /// Drive [`Self::handle_session_event`] from the store's events until the store goes away.
    pub fn follow_session(self: &Arc<Self>, store: &IdentityStore) -> JoinHandle<()> {
        let view = Arc::clone(self);
        let mut events = store.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Err(err) = view.handle_session_event(&event).await {
                            warn!("Refresh after session change failed: {err}");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Skipped {skipped} session events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Flip the saved flag optimistically; reverted if the backend refuses.
    /// Only the latest toggle of an apartment settles its flag. Returns the
    /// value the backend accepted.
    pub async fn toggle_save(&self, apartment_id: &str) -> Result<bool> {
        let (pending, seq) = {
            let mut state = self.state.lock().await;
            let pending = Pending::flip(state.is_saved(apartment_id));
            state.saved.insert(apartment_id.to_string(), *pending.proposed());
            let seq = state.save_seq.entry(apartment_id.to_string()).or_insert(0);
            *seq += 1;
            (pending, *seq)
        };
        let proposed = *pending.proposed();

        let outcome = self.backend.set_saved(apartment_id, proposed).await;
        let settled = pending.settle(&outcome);

        let mut state = self.state.lock().await;
        // A later toggle owns the flag now.
        if state.save_seq.get(apartment_id) == Some(&seq) {
            state.saved.insert(apartment_id.to_string(), settled);
        }

        match outcome {
            Ok(()) => Ok(settled),
            Err(err) => {
                warn!("Saving apartment {apartment_id} failed: {err}");
                state.notice = Some(format!(
                    "Could not update your saved listings. {}",
                    err.user_message()
                ));
                Err(err)
            }
        }
    }

    pub async fn is_saved(&self, apartment_id: &str) -> bool {
        self.state.lock().await.is_saved(apartment_id)
    }

    pub async fn next_image(&self, apartment_id: &str) -> bool {
        let mut state = self.state.lock().await;
        state
            .card_mut(apartment_id)
            .map(|card| card.gallery.next())
            .unwrap_or(false)
    }

    pub async fn previous_image(&self, apartment_id: &str) -> bool {
        let mut state = self.state.lock().await;
        state
            .card_mut(apartment_id)
            .map(|card| card.gallery.back())
            .unwrap_or(false)
    }

    /// Listings similar to one apartment. Failures yield an empty list.
    pub async fn similar(&self, apartment_id: &str) -> Vec<Apartment> {
        self.backend
            .similar_apartments(apartment_id)
            .await
            .unwrap_or_else(|err| {
                warn!("Similar listings lookup failed for {apartment_id}: {err}");
                Vec::new()
            })
    }

    async fn fetch(&self, force_refresh: bool) -> Result<FetchOutcome> {
        let (generation, query) = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.loading = true;
            state.loading_since = Some(Instant::now());
            let query = MatchQuery {
                page: state.page,
                limit: self.page_size,
                sort_by: state.sort_by,
                sort_order: state.sort_order,
                filters: state.filters.clone(),
                force_refresh,
            };
            (state.generation, query)
        };

        debug!(
            "Fetching matches for {} (page {}, generation {})",
            self.preference_id, query.page, generation
        );
        let result = self.backend.fetch_matches(&self.preference_id, &query).await;

        let mut state = self.state.lock().await;
        if generation != state.generation {
            debug!("Discarding stale response for generation {generation}");
            return Ok(FetchOutcome::Stale);
        }
        state.loading = false;
        state.loading_since = None;

        match result {
            Ok(page) => {
                debug!("Received {} of {} matches", page.results.len(), page.filtered_count);
                state.apply_page(page);
                state.last_fetch = Some(Instant::now());
                Ok(FetchOutcome::Applied)
            }
            Err(err) => {
                warn!("Fetching matches failed: {err}");
                state.cards.clear();
                state.total_count = 0;
                state.filtered_count = 0;
                state.error = Some(err.user_message());
                Err(err)
            }
        }
    }
}
