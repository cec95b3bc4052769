//! Timestamp normalization between seconds and milliseconds
//!
//! Hosts report times either as seconds or milliseconds since the epoch.
//! Values up to [`MILLIS_THRESHOLD`] are taken to be seconds. The two helpers
//! deliberately disagree at exactly the threshold: `normalize_date` scales it,
//! `date_value_in_seconds` leaves it alone.

/// Largest value still treated as seconds by [`normalize_date`]
pub const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Convert a timestamp to milliseconds
pub fn normalize_date(value: i64) -> i64 {
    if value <= MILLIS_THRESHOLD {
        value.saturating_mul(1000)
    } else {
        value
    }
}

/// Convert a timestamp to seconds
pub fn date_value_in_seconds(value: i64) -> i64 {
    if value > MILLIS_THRESHOLD {
        value / 1000
    } else {
        value
    }
}

/// Parse the leading integer of a string timestamp.
///
/// Leading whitespace and a sign are accepted, trailing garbage is ignored.
/// Returns `None` when no digits lead the string.
pub fn parse_date_value(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
