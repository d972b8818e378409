use chrono::{DateTime, Utc};

use crate::ranking::RankedVenues;

/// Where a refresh cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    AwaitingLocation,
    CheckingConnectivity,
    Fetching,
    Parsing,
    Reconciling,
    ReadingCache,
    Ranking,
    Ready,
    /// Offline with an empty store: nothing to show.
    NoData,
    FetchFailed,
    /// Ended by a location, parse, store or cancellation error.
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Ready
                | PipelineState::NoData
                | PipelineState::FetchFailed
                | PipelineState::Failed
        )
    }
}

/// Where a ready list came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ListSource {
    Network,
    Cache {
        refreshed_at: Option<DateTime<Utc>>,
    },
}

/// Successful end of a refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Ready {
        venues: RankedVenues,
        source: ListSource,
    },
    NoData,
}

impl RefreshOutcome {
    pub fn venues(&self) -> Option<&RankedVenues> {
        match self {
            RefreshOutcome::Ready { venues, .. } => Some(venues),
            RefreshOutcome::NoData => None,
        }
    }
}
