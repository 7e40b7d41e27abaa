//! Timestamp helpers

use chrono::{DateTime, Utc};

/// Render a timestamp the way browsers print `Date()`,
/// e.g. `Mon Oct 19 2026 09:30:00 GMT+0000 (UTC)`.
pub fn human_timestamp(at: DateTime<Utc>) -> String {
    at.format("%a %b %d %Y %H:%M:%S GMT+0000 (UTC)").to_string()
}

/// Prefix used for status log lines
pub fn status_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_human_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap();
        assert_eq!(human_timestamp(at), "Mon Oct 19 2026 09:30:00 GMT+0000 (UTC)");
    }

    #[test]
    fn test_status_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(status_timestamp(at), "2026-01-02T03:04:05.000Z");
    }
}
