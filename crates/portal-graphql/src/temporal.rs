//! UTC timestamp helpers.
//!
//! The API renders timestamps with several UTC zone designators (`Z`,
//! ` UTC`, `+00:00`, `+00`) and with up to nanosecond precision. Only UTC is
//! accepted; a timestamp without designator or with another offset is
//! rejected rather than assumed to be UTC.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use thiserror::Error;

const UTC_DESIGNATORS: [&str; 4] = ["+00:00", "Z", " UTC", "+00"];
const BASE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The string is not a supported UTC ISO 8601 timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a UTC ISO 8601 timestamp: {reason}")]
pub struct InvalidTimestamp {
    reason: &'static str,
}

impl InvalidTimestamp {
    const fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Current time in UTC.
#[must_use]
pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

/// `timestamp - now`; positive when `timestamp` lies in the future.
#[must_use]
pub fn diff_utc_now(timestamp: DateTime<Utc>) -> TimeDelta {
    timestamp - utc_now()
}

/// Decodes `YYYY-MM-DDTHH:MM:SS[.fff[fff[fff]]](Z| UTC|+00:00|+00)`.
///
/// The fraction has 3, 6 or 9 digits. Nanoseconds are rounded (half to even)
/// to microseconds.
pub fn decode_utc_iso8601(value: &str) -> Result<DateTime<Utc>, InvalidTimestamp> {
    let body = UTC_DESIGNATORS
        .iter()
        .find_map(|zone| value.strip_suffix(zone))
        .ok_or(InvalidTimestamp::new("timezone UTC not recognized"))?;

    let (base, fraction) = match body.split_once('.') {
        Some((base, fraction)) => (base, Some(fraction)),
        None => (body, None),
    };

    if !has_base_shape(base) {
        return Err(InvalidTimestamp::new("malformed date or time"));
    }
    let naive = NaiveDateTime::parse_from_str(base, BASE_FORMAT)
        .map_err(|_| InvalidTimestamp::new("date or time out of range"))?;

    let micros = match fraction {
        Some(digits) => fraction_to_micros(digits)?,
        None => 0,
    };

    Ok(naive.and_utc() + TimeDelta::microseconds(micros))
}

/// Renders a timestamp the way the API expects it in variables, with an
/// explicit `+00:00` offset.
#[must_use]
pub fn encode_utc_iso8601(timestamp: &DateTime<Utc>) -> String {
    if timestamp.timestamp_subsec_micros() == 0 {
        timestamp.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
    } else {
        timestamp.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
    }
}

fn has_base_shape(base: &str) -> bool {
    let bytes = base.as_bytes();
    bytes.len() == 19
        && bytes.iter().enumerate().all(|(idx, b)| match idx {
            4 | 7 => *b == b'-',
            10 => *b == b'T',
            13 | 16 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}

fn fraction_to_micros(digits: &str) -> Result<i64, InvalidTimestamp> {
    if !matches!(digits.len(), 3 | 6 | 9) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidTimestamp::new("malformed fraction"));
    }

    let mut nanos: i64 = digits
        .parse()
        .map_err(|_| InvalidTimestamp::new("malformed fraction"))?;
    for _ in digits.len()..9 {
        nanos *= 10;
    }

    let micros = nanos / 1000;
    let rest = nanos % 1000;
    if rest > 500 || (rest == 500 && micros % 2 == 1) {
        Ok(micros + 1)
    } else {
        Ok(micros)
    }
}
