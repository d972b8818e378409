//! Venue search client for the Foursquare REST API.
//!
//! This module provides the `VenueSource` trait the pipeline fetches through,
//! and `FoursquareClient`, its HTTP implementation against the
//! `venues/explore` endpoint.
//!
//! A fetch issues exactly one request and never retries; failures are
//! reported as `FetchError` and the caller decides what to do next.

pub mod client;
pub mod error;
pub mod response;

pub use client::{ClientSettings, FoursquareClient, VenueSource};
pub use error::FetchError;
pub use response::RawResponse;
