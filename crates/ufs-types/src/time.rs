use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::error::TypeError;

/// Render a UTC timestamp as RFC 3339 with a trailing `Z`.
///
/// Fractional seconds use as many digits as needed (none, 3, 6 or 9), so a
/// timestamp parsed from a document is rendered back the way it was stored.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an ISO-8601 timestamp. Text without an offset is taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TypeError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| TypeError::InvalidTimestamp(s.to_string()))
}

/// Read stored timestamp text into the instant it names and the text to
/// display for it. Stored text is displayed as-is, except that text with
/// no offset gets a `Z` so it still reads as UTC.
pub fn read_stored_timestamp(s: &str) -> Result<(DateTime<Utc>, String), TypeError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok((dt.with_timezone(&Utc), s.to_string()));
    }
    let instant = parse_timestamp(s)?;
    Ok((instant, format!("{s}Z")))
}

/// Instant given to stored timestamp text that cannot be read: the Unix
/// epoch, so such records sort first.
pub fn unreadable_timestamp() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

/// Serde adapter storing timestamps with [`format_timestamp`].
pub mod serde_rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_timestamp(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn whole_seconds_have_no_fraction() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-15T10:30:00Z");
    }

    #[test]
    fn microseconds_round_trip() {
        let text = "2025-08-27T14:34:31.123456Z";
        let ts = parse_timestamp(text).unwrap();
        assert_eq!(format_timestamp(&ts), text);
    }

    #[test]
    fn naive_is_utc() {
        let ts = parse_timestamp("2025-08-27T14:34:31.5").unwrap();
        assert_eq!(format_timestamp(&ts), "2025-08-27T14:34:31.500Z");
    }

    #[test]
    fn offsets_are_converted() {
        let ts = parse_timestamp("2024-01-15T12:30:00+02:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-15T10:30:00Z");
    }

    #[test]
    fn stored_text_is_kept_for_display() {
        let (at, text) = read_stored_timestamp("2024-01-15T12:30:00+02:00").unwrap();
        assert_eq!(format_timestamp(&at), "2024-01-15T10:30:00Z");
        assert_eq!(text, "2024-01-15T12:30:00+02:00");

        let (_, text) = read_stored_timestamp("2025-08-27T14:34:31.123000Z").unwrap();
        assert_eq!(text, "2025-08-27T14:34:31.123000Z");

        let (_, text) = read_stored_timestamp("2025-08-27T14:34:31.5").unwrap();
        assert_eq!(text, "2025-08-27T14:34:31.5Z");

        assert!(read_stored_timestamp("yesterday").is_err());
        assert_eq!(unreadable_timestamp().timestamp(), 0);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(TypeError::InvalidTimestamp(_))
        ));
    }
}
