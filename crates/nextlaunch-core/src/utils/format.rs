use chrono::{DateTime, SecondsFormat, Utc};

/// ISO 8601 timestamp with a numeric offset: `2024-05-01T12:00:00+00:00`.
/// Sub-second precision is kept only when present.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Space-separated date used for the previous launch: `2024-05-01 12:00:00+00:00`.
pub fn format_previous_date(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

/// Human-readable age of `at` relative to `now`: "just now", "5m ago", "2h ago", "3d ago".
pub fn age_display(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - at).num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}
