//! Small helpers shared by the record types and services.
//!
//! `lenient` holds the serde decoders that give every record field an
//! explicit default, so a missing or malformed value from the record
//! service never fails deserialization of the whole record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Split a comma-separated tag string into trimmed, non-empty labels.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join labels back into the comma-separated wire encoding.
pub fn join_tags<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a record service timestamp.
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS`
/// (taken as UTC), and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map(|dt| dt.and_utc())
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

/// Trimmed `"{first} {last}"`, the display name the record service stores.
pub fn display_name(first: &str, last: &str) -> String {
    format!("{} {}", first, last).trim().to_string()
}

pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::types::{RecordId, Reference};

    fn value_to_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    fn value_to_id(value: &Value) -> Option<RecordId> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<RecordId>().ok(),
            _ => None,
        }
    }

    pub fn string_or_empty<'de, D>(d: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        })
    }

    pub fn optional_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            _ => None,
        })
    }

    pub fn record_id<'de, D>(d: D) -> Result<RecordId, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Value>::deserialize(d)?
            .as_ref()
            .and_then(value_to_id)
            .unwrap_or(0))
    }

    /// Monetary amount: numeric or numeric string, never negative.
    pub fn amount<'de, D>(d: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Value>::deserialize(d)?
            .as_ref()
            .and_then(value_to_f64)
            .map(|v| v.max(0.0))
            .unwrap_or(0.0))
    }

    /// Win probability clamped to 0..=100.
    pub fn probability<'de, D>(d: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Value>::deserialize(d)?
            .as_ref()
            .and_then(value_to_f64)
            .map(|v| v.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(0))
    }

    /// A reference arrives either as a bare Id or as `{ "Id": n, "Name": "..." }`.
    pub fn reference<'de, D>(d: D) -> Result<Option<Reference>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(d)?;
        Ok(match value {
            Some(Value::Object(map)) => map.get("Id").and_then(value_to_id).map(|id| Reference {
                id,
                name: map
                    .get("Name")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            }),
            Some(other) => value_to_id(&other).map(Reference::new),
            None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_drops_blanks() {
        assert_eq!(parse_tags("vip, west ,,  partner"), vec!["vip", "west", "partner"]);
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ").is_empty());
    }

    #[test]
    fn test_join_tags() {
        assert_eq!(join_tags(&["vip", " west", ""]), "vip,west");
        assert_eq!(join_tags::<&str>(&[]), "");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01T10:15:00Z").is_some());
        assert!(parse_timestamp("2024-03-01T10:15:00.123").is_some());
        assert!(parse_timestamp("2024-03-01 10:15:00").is_some());
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_display_name_trims() {
        assert_eq!(display_name("Ada", "Lovelace"), "Ada Lovelace");
        assert_eq!(display_name("Ada", ""), "Ada");
        assert_eq!(display_name("", ""), "");
    }
}
