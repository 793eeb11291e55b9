//! Scalar cleanup applied at the system boundary.
//!
//! Structured-data blocks and feed entries arrive as loosely typed values;
//! everything here fails soft. A value of the wrong shape is logged at warn
//! level and treated as absent, never raised.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::warn;

/// Mojibake markers: UTF-8 bytes decoded as Windows-1252 leave these behind.
const MOJIBAKE_MARKERS: [char; 3] = ['\u{00C3}', '\u{00E2}', '\u{FFFD}'];
const MAX_REDECODE_PASSES: usize = 3;

/// Datetime formats tried in order, after the RFC 3339 / RFC 2822 parsers.
/// Offset-carrying formats first; naive formats are assumed UTC.
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
];
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y"];

/// Repair common mis-encoded-text artifacts and trim surrounding whitespace.
///
/// Internal whitespace and casing are left untouched. The repair strategy
/// reinterprets low-8-bit characters as raw bytes and redecodes them as
/// UTF-8, falling back to Windows-1252, for a bounded number of passes.
///
/// ```
/// use trawl_common::normalize::fix_text;
///
/// assert_eq!(fix_text("  plain title "), "plain title");
/// assert_eq!(fix_text("wasnâ€™t"), "wasn’t");
/// ```
pub fn fix_text(raw: &str) -> String {
    if !raw.chars().any(|ch| MOJIBAKE_MARKERS.contains(&ch)) {
        return raw.trim().to_string();
    }

    // Undo one layer of "UTF-8 bytes read back as Windows-1252" per pass:
    // re-encode the characters as Windows-1252 and decode the bytes as UTF-8.
    let mut cur = raw.to_string();
    for _ in 0..MAX_REDECODE_PASSES {
        let (encoded, _, had_unmappable) = encoding_rs::WINDOWS_1252.encode(&cur);
        if had_unmappable {
            break;
        }
        let redecoded = match String::from_utf8(encoded.into_owned()) {
            Ok(s) => s,
            Err(_) => break,
        };
        if redecoded == cur {
            break;
        }
        cur = redecoded;
        if !cur.chars().any(|ch| MOJIBAKE_MARKERS.contains(&ch)) {
            break;
        }
    }
    cur.trim().to_string()
}

/// Clean a schema.org Text value: repair mojibake and trim.
///
/// Non-string values are logged and treated as absent.
pub fn normalize_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(fix_text(s)),
        other => {
            warn!(value = %other, "text value must be a string");
            None
        }
    }
}

/// Split a delimited text value into a sorted, deduplicated list.
///
/// Each part is independently cleaned; empties are dropped.
pub fn normalize_text_list(value: &Value, delimiter: char) -> Vec<String> {
    let Some(text) = normalize_text(value) else {
        return Vec::new();
    };
    let mut parts: Vec<String> = text
        .split(delimiter)
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect();
    parts.sort();
    parts.dedup();
    parts
}

/// Parse a schema.org Date or DateTime value into a timezone-aware instant.
///
/// Non-string values and unparseable strings are logged and treated as
/// absent. Naive inputs are assumed UTC; the result is never a local time.
pub fn normalize_datetime(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let parsed = parse_datetime(s);
            if parsed.is_none() {
                warn!(dt = %s, "unable to parse datetime value");
            }
            parsed
        }
        other => {
            warn!(value = %other, "datetime value must be a string");
            None
        }
    }
}

/// Try each supported textual format in order; first hit wins.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn fix_text_trims_without_touching_internal_whitespace() {
        assert_eq!(fix_text("  two  words \n"), "two  words");
    }

    #[test]
    fn fix_text_repairs_double_decoded_utf8() {
        // "café" after UTF-8 bytes were read back as Windows-1252.
        assert_eq!(fix_text("cafÃ©"), "café");
        assert_eq!(fix_text("itâ€™s here"), "it’s here");
    }

    #[test]
    fn normalize_text_rejects_non_strings() {
        assert_eq!(normalize_text(&json!(42)), None);
        assert_eq!(normalize_text(&json!(["a", "b"])), None);
        assert_eq!(normalize_text(&json!("ok")), Some("ok".to_string()));
    }

    #[test]
    fn text_list_is_sorted_deduped_and_trimmed() {
        let value = json!("politics, tech ,politics,  , sports");
        assert_eq!(
            normalize_text_list(&value, ','),
            vec!["politics", "sports", "tech"]
        );
    }

    #[test]
    fn datetime_accepts_rfc3339_and_naive_forms() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_datetime("2020-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_datetime("2020-01-01T00:00:00"), Some(expected));
        assert_eq!(parse_datetime("2020-01-01"), Some(expected));
        assert_eq!(
            parse_datetime("2020-01-01T05:00:00+05:00"),
            Some(expected)
        );
    }

    #[test]
    fn datetime_fails_soft_on_garbage() {
        assert_eq!(normalize_datetime(&json!("not a date")), None);
        assert_eq!(normalize_datetime(&json!(1234)), None);
    }
}
