//! Distance ranking.
//!
//! Computes great-circle distance from the user to each venue on a spherical
//! Earth and orders venues nearest first. Rounding for display happens in
//! `utils::format`, never here.

use serde::Serialize;

use crate::models::{Coordinate, Venue};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Meters per mile used for the miles conversion.
pub const METERS_PER_MILE: f64 = 1609.0;

/// Haversine distance between two coordinates, in meters.
pub fn distance_meters(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Clamp guards against a > 1 from rounding at antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

pub fn distance_miles(from: Coordinate, to: Coordinate) -> f64 {
    distance_meters(from, to) / METERS_PER_MILE
}

/// Set each venue's distance from `user` and sort nearest first.
///
/// The sort is stable: venues at the same distance keep their input order.
pub fn rank(venues: Vec<Venue>, user: Coordinate) -> RankedVenues {
    let mut venues: Vec<Venue> = venues
        .into_iter()
        .map(|mut venue| {
            venue.distance_miles = Some(distance_miles(user, venue.coordinate()));
            venue
        })
        .collect();

    venues.sort_by(|a, b| {
        let a = a.distance_miles.unwrap_or_default();
        let b = b.distance_miles.unwrap_or_default();
        a.total_cmp(&b)
    });

    RankedVenues { user, venues }
}

/// What the map view needs to show one venue next to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFocus {
    pub venue_id: String,
    pub venue_name: String,
    pub venue: Coordinate,
    pub user: Coordinate,
}

/// Venues ordered by distance from the position they were ranked against.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankedVenues {
    user: Coordinate,
    venues: Vec<Venue>,
}

impl RankedVenues {
    pub fn user(&self) -> Coordinate {
        self.user
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Venue> {
        self.venues.iter().find(|v| v.id == id)
    }

    /// Handle a "venue selected" event from the list view. `user` is the
    /// position at selection time, which may differ from the ranking position.
    pub fn select(&self, id: &str, user: Coordinate) -> Option<MapFocus> {
        self.get(id).map(|venue| MapFocus {
            venue_id: venue.id.clone(),
            venue_name: venue.name.clone(),
            venue: venue.coordinate(),
            user,
        })
    }
}
