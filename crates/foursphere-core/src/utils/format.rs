/// Format a distance in miles for display, rounded to one decimal place
pub fn format_distance(miles: Option<f64>) -> String {
    match miles {
        Some(m) if m.is_finite() => format!("{:.1} mi", m),
        _ => "-".to_string(),
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
