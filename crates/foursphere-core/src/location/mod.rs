//! Device position collaborators.
//!
//! The pipeline only needs one coordinate per refresh. `LocationProvider`
//! exposes the best known fix (suspending until a first fix exists) and a
//! stream of updates; `acquire` bounds the wait with a timeout so a refresh
//! never hangs on a device that cannot get a fix.
//!
//! - `LocationTracker`: fed by a platform adapter through `publish`
//! - `FixedLocation`: a single configured coordinate

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::models::Coordinate;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    /// No fix arrived before the timeout. Retrying acquisition may succeed.
    #[error("No location fix within {0:?}")]
    Unavailable(Duration),

    /// Location services are switched off on the device.
    #[error("Location services are disabled")]
    ProviderDisabled,
}

/// Latest known state of the position source.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FixState {
    #[default]
    NoFix,
    Fix(Coordinate),
    Disabled,
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Best known position, suspending until a first fix exists.
    async fn current_position(&self) -> Result<Coordinate, LocationError>;

    /// Receive every subsequent state change.
    fn subscribe(&self) -> watch::Receiver<FixState>;
}

/// Wait for a fix from `provider`, giving up after `timeout`.
pub async fn acquire(
    provider: &dyn LocationProvider,
    timeout: Duration,
) -> Result<Coordinate, LocationError> {
    match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(result) => result,
        Err(_) => {
            warn!(?timeout, "Timed out waiting for a location fix");
            Err(LocationError::Unavailable(timeout))
        }
    }
}

async fn wait_for_fix(mut rx: watch::Receiver<FixState>) -> Result<Coordinate, LocationError> {
    let state = rx
        .wait_for(|state| !matches!(state, FixState::NoFix))
        .await
        .map(|state| *state)
        .map_err(|_| LocationError::ProviderDisabled)?;
    match state {
        FixState::Fix(coordinate) => Ok(coordinate),
        FixState::NoFix | FixState::Disabled => Err(LocationError::ProviderDisabled),
    }
}

// ============================================================================
// Tracker
// ============================================================================

/// Position source updated by a platform adapter.
/// Clone is cheap - clones share the same channel.
#[derive(Clone)]
pub struct LocationTracker {
    tx: Arc<watch::Sender<FixState>>,
}

impl Default for LocationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(FixState::NoFix);
        Self { tx: Arc::new(tx) }
    }

    /// Record a new fix. Invalid coordinates are dropped.
    pub fn publish(&self, coordinate: Coordinate) {
        if !coordinate.is_valid() {
            warn!(?coordinate, "Ignoring invalid location fix");
            return;
        }
        debug!(%coordinate, "Location fix updated");
        self.tx.send_replace(FixState::Fix(coordinate));
    }

    /// Mark location services as switched off; pending waits fail.
    pub fn disable(&self) {
        self.tx.send_replace(FixState::Disabled);
    }

    pub fn last_fix(&self) -> Option<Coordinate> {
        match *self.tx.borrow() {
            FixState::Fix(coordinate) => Some(coordinate),
            FixState::NoFix | FixState::Disabled => None,
        }
    }
}

#[async_trait]
impl LocationProvider for LocationTracker {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        wait_for_fix(self.tx.subscribe()).await
    }

    fn subscribe(&self) -> watch::Receiver<FixState> {
        self.tx.subscribe()
    }
}

// ============================================================================
// Fixed
// ============================================================================

/// A provider that always reports the same coordinate.
pub struct FixedLocation {
    tx: watch::Sender<FixState>,
}

impl FixedLocation {
    pub fn new(coordinate: Coordinate) -> Self {
        let (tx, _rx) = watch::channel(FixState::Fix(coordinate));
        Self { tx }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Coordinate, LocationError> {
        wait_for_fix(self.tx.subscribe()).await
    }

    fn subscribe(&self) -> watch::Receiver<FixState> {
        self.tx.subscribe()
    }
}
