//! Parsing for the two shapes upstream responses arrive in: `Date`/`Value`
//! sample rows and taglist entries.

use chrono::{DateTime, NaiveDateTime};
use explorer_core::{Sample, TagInfo};
use serde_json::Value;

const ALT_DATE_FORMAT: &str = "%d:%m:%Y:%H:%M:%S";

/// Parses one upstream date string, accepting either ISO-8601 or the
/// `dd:mm:yyyy:HH:MM:SS` form upstream uses in its other mode. Returns
/// `None` if neither parses, in which case the caller drops the sample.
fn parse_timestamp_ms(date: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(date, ALT_DATE_FORMAT) {
        return Some(naive.and_utc().timestamp_millis());
    }
    None
}

fn parse_value_field(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => Sample::parse_value(s),
        _ => None,
    }
}

/// Parses a `GET /values` response body into samples. Entries with an
/// unparseable `Date` are dropped entirely; entries with an unparseable
/// `Value` keep their timestamp with an absent value.
pub fn parse_values_response(body: &[Value]) -> Vec<Sample> {
    body.iter()
        .filter_map(|entry| {
            let date = entry.get("Date")?.as_str()?;
            let timestamp_ms = parse_timestamp_ms(date)?;
            let value = entry.get("Value").and_then(parse_value_field);
            Some(Sample::new(timestamp_ms, value))
        })
        .collect()
}

/// Parses a `GET /taglist` response body, dropping entries with no `Tag`.
pub fn parse_taglist_response(body: &[Value]) -> Vec<TagInfo> {
    body.iter()
        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_iso8601_dates_with_millisecond_precision() {
        let body = vec![json!({"Date": "2024-01-01T00:00:01.500Z", "Value": "10.5"})];
        let samples = parse_values_response(&body);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].timestamp_ms, 1_500);
        assert_eq!(samples[0].value, Some(10.5));
    }

    #[test]
    fn parses_alternate_date_format() {
        let body = vec![json!({"Date": "01:01:2024:00:00:01", "Value": 10})];
        let samples = parse_values_response(&body);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, Some(10.0));
    }

    #[test]
    fn unparseable_date_drops_the_sample() {
        let body = vec![json!({"Date": "not-a-date", "Value": 1})];
        assert!(parse_values_response(&body).is_empty());
    }

    #[test]
    fn unparseable_value_yields_absent() {
        let body = vec![json!({"Date": "2024-01-01T00:00:00Z", "Value": "garbage"})];
        let samples = parse_values_response(&body);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, None);
    }

    #[test]
    fn taglist_entries_missing_tag_are_dropped() {
        let body = vec![json!({"Unit": "A"}), json!({"Tag": "X", "Unit": null, "RegisterDataType": "Single"})];
        let tags = parse_taglist_response(&body);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].tag, "X");
    }
}
