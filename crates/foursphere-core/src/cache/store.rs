use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use thiserror::Error;
use tracing::debug;

use crate::models::{OpenStatus, Venue};

#[derive(Error, Debug)]
pub enum StoreError {
    /// An insert collided with an existing primary key. Callers are expected
    /// to check `exists` first, so this indicates a logic error upstream.
    #[error("Venue {0} is already stored")]
    ConstraintViolation(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to prepare store location: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt value in store: {0}")]
    Corrupt(String),
}

/// Persistent venue table keyed by venue identifier.
///
/// Implementations must make every write performed inside `atomically`
/// visible all at once, so a concurrent `read_all` never sees half a batch.
pub trait VenueStore: Send {
    /// Create the schema if missing. Safe to call on every startup.
    fn initialize(&self) -> Result<(), StoreError>;

    fn exists(&self, id: &str) -> Result<bool, StoreError>;

    /// Insert a new venue. Fails with `ConstraintViolation` if the id is taken.
    fn insert(&self, venue: &Venue) -> Result<(), StoreError>;

    fn has_any_data(&self) -> Result<bool, StoreError>;

    /// Every stored venue, in unspecified order, with `distance_miles` unset.
    fn read_all(&self) -> Result<Vec<Venue>, StoreError>;

    /// Run `batch` in a single transaction; an error rolls everything back.
    fn atomically(
        &self,
        batch: &mut dyn FnMut() -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;

    /// When the last successful reconciliation committed.
    fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>, StoreError>;

    fn mark_refreshed(&self, at: DateTime<Utc>) -> Result<(), StoreError>;
}

// ============================================================================
// SQLite
// ============================================================================

const CREATE_VENUES: &str = "CREATE TABLE IF NOT EXISTS venues (
    venue_id       TEXT PRIMARY KEY,
    venue_name     TEXT NOT NULL,
    venue_category TEXT NOT NULL,
    latitude       REAL NOT NULL,
    longitude      REAL NOT NULL,
    photo_url      TEXT
)";

const CREATE_SYNC_STATE: &str = "CREATE TABLE IF NOT EXISTS sync_state (
    id           INTEGER PRIMARY KEY CHECK (id = 1),
    refreshed_at TEXT NOT NULL
)";

pub struct SqliteVenueStore {
    conn: Connection,
}

impl SqliteVenueStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.initialize()?;
        debug!(?path, "Venue store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Number of stored venues.
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM venues", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| StoreError::Corrupt(format!("row count {}", count)))
    }
}

impl VenueStore for SqliteVenueStore {
    fn initialize(&self) -> Result<(), StoreError> {
        self.conn.execute(CREATE_VENUES, [])?;
        self.conn.execute(CREATE_SYNC_STATE, [])?;
        Ok(())
    }

    fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM venues WHERE venue_id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    fn insert(&self, venue: &Venue) -> Result<(), StoreError> {
        let result = self.conn.execute(
            "INSERT INTO venues (venue_id, venue_name, venue_category, latitude, longitude, photo_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                venue.id,
                venue.name,
                venue.category,
                venue.latitude,
                venue.longitude,
                venue.photo_url
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::ConstraintViolation(venue.id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn has_any_data(&self) -> Result<bool, StoreError> {
        let any: bool = self
            .conn
            .query_row("SELECT EXISTS(SELECT 1 FROM venues)", [], |row| row.get(0))?;
        Ok(any)
    }

    fn read_all(&self) -> Result<Vec<Venue>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT venue_id, venue_name, venue_category, latitude, longitude, photo_url
             FROM venues ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Venue {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                latitude: row.get(3)?,
                longitude: row.get(4)?,
                photo_url: row.get(5)?,
                // Open status is time-sensitive and is not persisted
                open_status: OpenStatus::Unknown,
                distance_miles: None,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn atomically(
        &self,
        batch: &mut dyn FnMut() -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        batch()?;
        tx.commit()?;
        Ok(())
    }

    fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let stamp: Option<String> = self
            .conn
            .query_row("SELECT refreshed_at FROM sync_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        stamp
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| StoreError::Corrupt(format!("refreshed_at {:?}: {}", s, e)))
            })
            .transpose()
    }

    fn mark_refreshed(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO sync_state (id, refreshed_at) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET refreshed_at = excluded.refreshed_at",
            [at.to_rfc3339()],
        )?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
