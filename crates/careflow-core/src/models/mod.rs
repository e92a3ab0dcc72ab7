//! Domain models for the careflow system.

mod appointment;
mod directory;
mod incident;
mod slots;

pub use appointment::*;
pub use directory::*;
pub use incident::*;
pub use slots::*;

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC instant in the storage form: RFC 3339 with fixed
/// millisecond precision and a trailing Z. Fixed width means stored
/// timestamps sort lexicographically in chronological order, which the
/// queue orderings and token expiry comparisons rely on.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current UTC time in storage form.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format_fixed_width() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 5, 7, 9, 1).unwrap();
        assert_eq!(format_timestamp(ts), "2026-03-05T07:09:01.000Z");
    }

    #[test]
    fn test_timestamp_order_is_lexicographic() {
        let earlier = Utc.with_ymd_and_hms(2026, 3, 5, 7, 9, 1).unwrap();
        let later = earlier + chrono::Duration::milliseconds(250);
        assert!(format_timestamp(earlier) < format_timestamp(later));
    }
}
