use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Whether a venue is open right now, as reported by the venue source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OpenStatus {
    /// No hours data was provided.
    #[default]
    Unknown,
    Open,
    Closed,
}

impl OpenStatus {
    pub fn from_flag(is_open: Option<bool>) -> Self {
        match is_open {
            Some(true) => OpenStatus::Open,
            Some(false) => OpenStatus::Closed,
            None => OpenStatus::Unknown,
        }
    }

    /// Get the display label for this status.
    pub fn label(&self) -> &'static str {
        match self {
            OpenStatus::Unknown => "",
            OpenStatus::Open => "OPEN",
            OpenStatus::Closed => "CLOSED",
        }
    }
}

/// A restaurant returned by the venue source or re-read from the store.
///
/// Every field except `distance_miles` is fixed once the venue has been
/// fetched. `distance_miles` is owned by the ranking step and is `None`
/// until a ranking pass has run against a user position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub open_status: OpenStatus,
    #[serde(skip)]
    pub distance_miles: Option<f64>,
}

impl Venue {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn has_photo(&self) -> bool {
        self.photo_url.is_some()
    }
}
