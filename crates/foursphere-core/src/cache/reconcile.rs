use chrono::Utc;
use tracing::{debug, info};

use super::{StoreError, VenueStore};
use crate::models::Venue;

/// Outcome of one reconciliation batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Insert every venue the store does not already hold.
///
/// Existing rows are never updated: venue data is treated as immutable once
/// cached. The whole batch runs in one transaction and also stamps the
/// refresh time, so running it twice with the same input writes nothing new.
/// A repeated id inside `venues` is skipped like any other stored id.
pub fn reconcile<S: VenueStore + ?Sized>(
    venues: &[Venue],
    store: &S,
) -> Result<ReconcileSummary, StoreError> {
    let mut summary = ReconcileSummary::default();

    store.atomically(&mut || {
        summary = ReconcileSummary::default();
        for venue in venues {
            if store.exists(&venue.id)? {
                debug!(venue_id = %venue.id, "Venue already cached, skipping");
                summary.skipped += 1;
                continue;
            }
            store.insert(venue)?;
            summary.inserted += 1;
        }
        store.mark_refreshed(Utc::now())
    })?;

    info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        "Reconciled venues into store"
    );
    Ok(summary)
}
