// SPDX-License-Identifier: MIT

//! Shared helpers for date/time handling.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Truncate a timestamp to the start of its UTC calendar day.
pub fn start_of_utc_day(date: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(
        &date
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid"),
    )
}

/// Calendar-day key ("YYYY-MM-DD") used in daily log document IDs.
pub fn day_key(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_utc_day() {
        let date = DateTime::parse_from_rfc3339("2024-03-05T17:42:09Z")
            .unwrap()
            .with_timezone(&Utc);
        let midnight = start_of_utc_day(date);
        assert_eq!(format_utc_rfc3339(midnight), "2024-03-05T00:00:00Z");
    }

    #[test]
    fn test_day_key() {
        let date = DateTime::parse_from_rfc3339("2024-03-05T17:42:09Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(day_key(date), "2024-03-05");
    }
}
