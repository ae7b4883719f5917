use serde::{Deserialize, Deserializer, Serializer};
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::error::{Error, Result};

/// Human-readable timestamp used in headers and separators.
const DISPLAY_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Compact timestamp used in default export file names.
const FILE_STAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");

/// Deserialize an RFC 3339 formatted string into an OffsetDateTime
pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    OffsetDateTime::parse(&s, &Rfc3339).map_err(serde::de::Error::custom)
}

/// Serialize an OffsetDateTime into an RFC 3339 formatted string
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}

/// Formats a timestamp as RFC 3339.
pub fn to_rfc3339(datetime: OffsetDateTime) -> Result<String> {
    datetime
        .format(&Rfc3339)
        .map_err(|e| Error::serialization(format!("cannot format timestamp: {e}"), Some(Box::new(e))))
}

/// Parses an RFC 3339 timestamp.
pub fn from_rfc3339(s: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339).map_err(|e| {
        Error::serialization(format!("invalid timestamp '{s}': {e}"), Some(Box::new(e)))
    })
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn display_utc(datetime: OffsetDateTime) -> String {
    let utc = datetime.to_offset(time::UtcOffset::UTC);
    match utc.format(DISPLAY_FORMAT) {
        Ok(s) => format!("{s} UTC"),
        Err(_) => utc.to_string(),
    }
}

/// Formats a timestamp as `YYYYMMDD_HHMMSS` for file names.
pub fn file_stamp(datetime: OffsetDateTime) -> String {
    let utc = datetime.to_offset(time::UtcOffset::UTC);
    utc.format(FILE_STAMP_FORMAT)
        .unwrap_or_else(|_| utc.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn rfc3339_round_trip() {
        let ts = datetime!(2025-03-09 14:05:07.123456 UTC);
        let s = to_rfc3339(ts).unwrap();
        assert_eq!(from_rfc3339(&s).unwrap(), ts);
    }

    #[test]
    fn display_and_file_stamp() {
        let ts = datetime!(2025-03-09 14:05:07 UTC);
        assert_eq!(display_utc(ts), "2025-03-09 14:05:07 UTC");
        assert_eq!(file_stamp(ts), "20250309_140507");
    }

    #[test]
    fn invalid_timestamp() {
        assert!(from_rfc3339("yesterday").is_err());
    }
}
