//! Refresh cycle orchestration.
//!
//! The orchestrator is handed its collaborators by the composition root and
//! owns no global state. At most one cycle runs at a time; a second
//! `refresh` while one is in flight is rejected, and `cancel` aborts the
//! in-flight cycle before it can write to the store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ListSource, PipelineError, PipelineState, RefreshOutcome};
use crate::api::VenueSource;
use crate::cache::{reconcile, VenueStore};
use crate::connectivity::ConnectivityGate;
use crate::location::{self, LocationProvider};
use crate::models::Coordinate;
use crate::parser;
use crate::ranking::{rank, MapFocus, RankedVenues};

// ============================================================================
// Constants
// ============================================================================

/// Default free-text category sent with every query.
pub const DEFAULT_QUERY: &str = "food";

/// Default wait for a first location fix, in seconds.
pub const DEFAULT_LOCATION_TIMEOUT_SECS: u64 = 30;

/// Per-cycle settings.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub query: String,
    pub location_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            location_timeout: Duration::from_secs(DEFAULT_LOCATION_TIMEOUT_SECS),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight slot when a cycle ends, however it ends.
struct InFlight<'a> {
    slot: &'a Mutex<Option<CancellationToken>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *lock(self.slot) = None;
    }
}

pub struct Orchestrator<S: VenueStore> {
    store: Mutex<S>,
    source: Arc<dyn VenueSource>,
    location: Arc<dyn LocationProvider>,
    connectivity: Arc<dyn ConnectivityGate>,
    settings: PipelineSettings,
    in_flight: Mutex<Option<CancellationToken>>,
    last_list: Mutex<Option<RankedVenues>>,
    state_tx: watch::Sender<PipelineState>,
}

impl<S: VenueStore> Orchestrator<S> {
    pub fn new(
        store: S,
        source: Arc<dyn VenueSource>,
        location: Arc<dyn LocationProvider>,
        connectivity: Arc<dyn ConnectivityGate>,
        settings: PipelineSettings,
    ) -> Self {
        let (state_tx, _rx) = watch::channel(PipelineState::Idle);
        Self {
            store: Mutex::new(store),
            source,
            location,
            connectivity,
            settings,
            in_flight: Mutex::new(None),
            last_list: Mutex::new(None),
            state_tx,
        }
    }

    pub fn state(&self) -> PipelineState {
        *self.state_tx.borrow()
    }

    /// Observe state transitions.
    pub fn states(&self) -> watch::Receiver<PipelineState> {
        self.state_tx.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    /// The most recent ready list. Kept when a later cycle fails.
    pub fn last_list(&self) -> Option<RankedVenues> {
        lock(&self.last_list).clone()
    }

    /// Resolve a "venue selected" event against the displayed list.
    pub fn select(&self, venue_id: &str, user: Coordinate) -> Option<MapFocus> {
        lock(&self.last_list)
            .as_ref()
            .and_then(|list| list.select(venue_id, user))
    }

    /// Run read-only work against the store, e.g. for status displays.
    pub fn with_store<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&lock(&self.store))
    }

    /// Cancel the in-flight cycle, if any. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        match lock(&self.in_flight).as_ref() {
            Some(token) => {
                info!("Cancelling in-flight refresh");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Run one refresh cycle.
    pub async fn refresh(&self) -> Result<RefreshOutcome, PipelineError> {
        let token = {
            let mut slot = lock(&self.in_flight);
            if slot.is_some() {
                warn!("Refresh requested while another is in flight");
                return Err(PipelineError::RefreshInProgress);
            }
            let token = CancellationToken::new();
            *slot = Some(token.clone());
            token
        };
        let _in_flight = InFlight {
            slot: &self.in_flight,
        };

        let result = self.run_cycle(&token).await;

        match &result {
            Ok(outcome) => {
                if let RefreshOutcome::Ready { venues, .. } = outcome {
                    *lock(&self.last_list) = Some(venues.clone());
                    self.transition(PipelineState::Ready);
                } else {
                    self.transition(PipelineState::NoData);
                }
            }
            Err(PipelineError::Fetch(e)) => {
                warn!(error = %e, "Venue fetch failed");
                self.transition(PipelineState::FetchFailed);
            }
            Err(e) => {
                warn!(error = %e, "Refresh cycle failed");
                self.transition(PipelineState::Failed);
            }
        }
        result
    }

    fn transition(&self, state: PipelineState) {
        debug!(?state, "Pipeline state");
        self.state_tx.send_replace(state);
    }

    async fn run_cycle(&self, token: &CancellationToken) -> Result<RefreshOutcome, PipelineError> {
        self.transition(PipelineState::AwaitingLocation);
        let user = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(PipelineError::Cancelled),
            fix = location::acquire(self.location.as_ref(), self.settings.location_timeout) => fix?,
        };

        self.transition(PipelineState::CheckingConnectivity);
        let online = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(PipelineError::Cancelled),
            online = self.connectivity.is_online() => online,
        };
        if online {
            self.network_path(user, token).await
        } else {
            info!("Offline, falling back to cached venues");
            self.cache_path(user)
        }
    }

    async fn network_path(
        &self,
        user: Coordinate,
        token: &CancellationToken,
    ) -> Result<RefreshOutcome, PipelineError> {
        self.transition(PipelineState::Fetching);
        let raw = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(PipelineError::Cancelled),
            fetched = self.source.fetch_nearby(user, &self.settings.query) => fetched?,
        };

        self.transition(PipelineState::Parsing);
        let venues = parser::parse(&raw)?;

        // A cancelled cycle must not overwrite anything
        if token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.transition(PipelineState::Reconciling);
        reconcile(&venues, &*lock(&self.store))?;

        self.transition(PipelineState::Ranking);
        Ok(RefreshOutcome::Ready {
            venues: rank(venues, user),
            source: ListSource::Network,
        })
    }

    fn cache_path(&self, user: Coordinate) -> Result<RefreshOutcome, PipelineError> {
        self.transition(PipelineState::ReadingCache);
        let (venues, refreshed_at) = {
            let store = lock(&self.store);
            if !store.has_any_data()? {
                info!("Offline with an empty store, nothing to show");
                return Ok(RefreshOutcome::NoData);
            }
            (store.read_all()?, store.last_refreshed()?)
        };
        debug!(count = venues.len(), "Read cached venues");

        self.transition(PipelineState::Ranking);
        Ok(RefreshOutcome::Ready {
            venues: rank(venues, user),
            source: ListSource::Cache { refreshed_at },
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
