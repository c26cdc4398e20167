use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::db::models::SegmentKind;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn format_optional_datetime(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|dt| dt.to_rfc3339())
}

pub fn parse_segment_kind(value: &str) -> Result<SegmentKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "arrival" => Ok(SegmentKind::Arrival),
        "departure" => Ok(SegmentKind::Departure),
        "cruise" => Ok(SegmentKind::Cruise),
        other => Err(anyhow!("unknown segment type {other}")),
    }
}

/// `?, ?, ?` for an `IN (...)` clause of `count` parameters.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_kind_parsing_is_lenient_about_case() {
        assert_eq!(parse_segment_kind("Arrival").unwrap(), SegmentKind::Arrival);
        assert_eq!(parse_segment_kind(" cruise ").unwrap(), SegmentKind::Cruise);
        assert!(parse_segment_kind("layover").is_err());
    }

    #[test]
    fn blank_timestamps_read_as_absent() {
        assert_eq!(parse_optional_datetime(Some("".into()), "t").unwrap(), None);
        assert_eq!(parse_optional_datetime(None, "t").unwrap(), None);
        let parsed = parse_optional_datetime(Some("2024-08-10T09:30:00Z".into()), "t").unwrap();
        assert_eq!(format_optional_datetime(parsed).as_deref(), Some("2024-08-10T09:30:00+00:00"));
    }

    #[test]
    fn placeholder_list() {
        assert_eq!(placeholders(3), "?, ?, ?");
        assert_eq!(placeholders(1), "?");
    }
}
