// Formatting helpers for CLI output

use chrono::{DateTime, Local, Utc};

/// Render a timestamp in local time, `--` when absent
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(d) => d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "--".to_string(),
    }
}

/// Render an optional value, `--` when absent
pub fn display_or_dash<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "--".to_string(),
    }
}
