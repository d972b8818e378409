//! Terminal rendering of ranked venue lists.

use chrono::Utc;

use foursphere_core::cache::age_display;
use foursphere_core::models::Venue;
use foursphere_core::pipeline::{ListSource, RefreshOutcome};
use foursphere_core::ranking::RankedVenues;
use foursphere_core::utils::{format_distance, truncate_string};

/// Maximum characters shown for a venue name
const NAME_WIDTH: usize = 32;

/// Maximum characters shown for a category label
const CATEGORY_WIDTH: usize = 16;

/// Shown when there is nothing to list.
pub const EMPTY_STATE: &str =
    "No venues to show. Connect to the internet and refresh to load nearby restaurants.";

pub fn source_line(source: &ListSource) -> String {
    match source {
        ListSource::Network => "Live results".to_string(),
        ListSource::Cache {
            refreshed_at: Some(at),
        } => format!("Offline - cached {}", age_display(*at, Utc::now())),
        ListSource::Cache { refreshed_at: None } => "Offline - cached".to_string(),
    }
}

pub fn venue_row(venue: &Venue) -> String {
    format!(
        "{:>8}  {:<name_w$}  {:<cat_w$}  {:<6}  {}",
        format_distance(venue.distance_miles),
        truncate_string(&venue.name, NAME_WIDTH),
        truncate_string(&venue.category, CATEGORY_WIDTH),
        venue.open_status.label(),
        if venue.has_photo() { "photo" } else { "" },
        name_w = NAME_WIDTH,
        cat_w = CATEGORY_WIDTH,
    )
}

pub fn render(outcome: &RefreshOutcome) -> Vec<String> {
    match outcome {
        RefreshOutcome::NoData => vec![EMPTY_STATE.to_string()],
        RefreshOutcome::Ready { venues, source } => {
            if venues.is_empty() {
                return vec![source_line(source), EMPTY_STATE.to_string()];
            }
            list_lines(source_line(source), venues)
        }
    }
}

/// A failed cycle keeps the previously displayed list; the empty state is
/// only shown when nothing has been displayed yet.
pub fn render_failure(error: &str, previous: Option<&RankedVenues>) -> Vec<String> {
    match previous {
        Some(venues) if !venues.is_empty() => {
            list_lines(format!("Refresh failed ({}), showing previous list", error), venues)
        }
        _ => vec![EMPTY_STATE.to_string()],
    }
}

fn list_lines(header: String, venues: &RankedVenues) -> Vec<String> {
    let mut lines = Vec::with_capacity(venues.len() + 1);
    lines.push(format!("{} near {}", header, venues.user()));
    lines.extend(venues.venues().iter().map(venue_row));
    lines
}
