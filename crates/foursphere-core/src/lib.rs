//! Foursphere core - venue discovery with an offline cache.
//!
//! This crate turns the user's position into a distance-ranked list of
//! nearby restaurants. Online, venues are fetched from the Foursquare
//! `venues/explore` endpoint, parsed, and reconciled into a local SQLite
//! store; offline, the list is rebuilt from that store.

pub mod api;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod location;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod ranking;
pub mod utils;

pub use config::Config;
