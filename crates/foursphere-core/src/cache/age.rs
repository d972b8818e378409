use chrono::{DateTime, Utc};

/// Consider the offline list stale after 1 hour.
pub const STALE_AFTER_MINUTES: i64 = 60;

/// Minutes between `refreshed_at` and `now`, clamped at zero for clock skew.
pub fn age_minutes(refreshed_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - refreshed_at).num_minutes().max(0)
}

pub fn is_stale(refreshed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    age_minutes(refreshed_at, now) > STALE_AFTER_MINUTES
}

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// Relative age of the cached list, e.g. "5m ago" or "2d ago".
///
/// Hours and days round half up, so 90 minutes reads "2h ago".
pub fn age_display(refreshed_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match age_minutes(refreshed_at, now) {
        0 => "just now".to_string(),
        m if m < MINUTES_PER_HOUR => format!("{m}m ago"),
        m if m < MINUTES_PER_DAY => format!("{}h ago", rounded(m, MINUTES_PER_HOUR)),
        m => format!("{}d ago", rounded(m, MINUTES_PER_DAY)),
    }
}

fn rounded(minutes: i64, unit: i64) -> i64 {
    (minutes + unit / 2) / unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_age_display_just_now() {
        let now = Utc::now();
        assert_eq!(age_display(now, now), "just now");
        // Clock skew: refreshed "in the future"
        assert_eq!(age_display(now + Duration::minutes(5), now), "just now");
    }

    #[test]
    fn test_age_display_minutes_hours_days() {
        let now = Utc::now();
        assert_eq!(age_display(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(age_display(now - Duration::minutes(80), now), "1h ago");
        assert_eq!(age_display(now - Duration::minutes(95), now), "2h ago");
        assert_eq!(age_display(now - Duration::hours(30), now), "1d ago");
        assert_eq!(age_display(now - Duration::hours(40), now), "2d ago");
    }

    #[test]
    fn test_age_display_unit_boundaries() {
        let now = Utc::now();
        assert_eq!(age_display(now - Duration::minutes(59), now), "59m ago");
        assert_eq!(age_display(now - Duration::minutes(60), now), "1h ago");
        assert_eq!(age_display(now - Duration::minutes(90), now), "2h ago");
        assert_eq!(age_display(now - Duration::minutes(1439), now), "24h ago");
        assert_eq!(age_display(now - Duration::hours(36), now), "2d ago");
    }

    #[test]
    fn test_is_stale() {
        let now = Utc::now();
        assert!(!is_stale(now - Duration::minutes(10), now));
        assert!(is_stale(now - Duration::minutes(61), now));
    }
}
