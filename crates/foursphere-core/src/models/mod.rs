//! Data models for venue discovery.
//!
//! This module contains the domain types shared by every pipeline stage:
//!
//! - `Venue`: a restaurant record with identity, name, category and position
//! - `Coordinate`: a latitude/longitude pair in decimal degrees
//! - `OpenStatus`: tri-state open/closed flag derived from hours data

pub mod coordinate;
pub mod venue;

pub use coordinate::Coordinate;
pub use venue::{OpenStatus, Venue};
