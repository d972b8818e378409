//! Local venue store for offline access.
//!
//! This module provides the `VenueStore` contract and its SQLite
//! implementation, `SqliteVenueStore`, which mirrors the most recent query
//! results so the list stays usable without a network.
//!
//! Rows are only ever inserted; `reconcile` adds freshly fetched venues that
//! are not already present, one transaction per batch. There is no eviction.

pub mod age;
pub mod reconcile;
pub mod store;

pub use age::age_display;
pub use reconcile::{reconcile, ReconcileSummary};
pub use store::{SqliteVenueStore, StoreError, VenueStore};
