//! Utility functions for presenting ranked venues.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_distance, truncate_string};
