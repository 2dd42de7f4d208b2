//! Immutable, name-addressable views over GraphQL response data.
//!
//! JSON objects become [`Record`]s, arrays become sequences and strings that
//! look like UTC ISO 8601 timestamps become [`Scalar::Timestamp`]. Fields are
//! looked up by name; enumeration follows the order of first appearance in
//! the response.

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};

use crate::temporal::decode_utc_iso8601;

/// Name given to the record built from the top-level `data` object.
pub const ROOT_RECORD_NAME: &str = "data";

/// A decoded response node.
#[derive(Debug, Clone, PartialEq)]
pub enum Structured {
    /// A JSON object.
    Record(Record),
    /// A JSON array.
    Sequence(Vec<Structured>),
    /// Any other JSON value.
    Scalar(Scalar),
}

/// Leaf values.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number.
    Number(Number),
    /// JSON string that is not a timestamp.
    String(String),
    /// JSON string decoded as a UTC timestamp.
    Timestamp(DateTime<Utc>),
}

/// A named record with fields in their original order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    name: String,
    fields: Vec<(String, Structured)>,
}

impl Record {
    /// Name of the record: the key it was found under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a field by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Structured> {
        self.fields
            .iter()
            .find_map(|(name, value)| (name == field).then_some(value))
    }

    /// Returns `true` if the record has a field with that name.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Field names in order of appearance.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// `(name, value)` pairs in order of appearance.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Structured)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` for a record without fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Structured {
    /// Field of a record; `None` for other nodes or unknown fields.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Self> {
        self.as_record().and_then(|record| record.get(field))
    }

    /// Element of a sequence.
    #[must_use]
    pub fn index(&self, idx: usize) -> Option<&Self> {
        self.as_sequence().and_then(|items| items.get(idx))
    }

    /// Follow a path of field names.
    #[must_use]
    pub fn path(&self, fields: &[&str]) -> Option<&Self> {
        fields
            .iter()
            .try_fold(self, |node, field| node.get(field))
    }

    /// The record, if this node is one.
    #[must_use]
    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The elements, if this node is a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Self]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// The leaf value, if this node is a scalar.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// String scalar. Decoded timestamps are not strings.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self.as_scalar()? {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Number scalar that fits an `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self.as_scalar()? {
            Scalar::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Number scalar that fits a `u64`.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self.as_scalar()? {
            Scalar::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    /// Number scalar as `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self.as_scalar()? {
            Scalar::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Boolean scalar.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_scalar()? {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Scalar decoded as a UTC timestamp.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self.as_scalar()? {
            Scalar::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// True for JSON `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(Scalar::Null))
    }
}

/// Convert decoded JSON into a structured node.
///
/// `name` is used for a record built from `value`; nested records are named
/// after the field they appear in, array elements after the array's field.
#[must_use]
pub fn to_structured(value: Value, name: &str) -> Structured {
    match value {
        Value::Object(map) => Structured::Record(to_record(map, name)),
        Value::Array(items) => Structured::Sequence(
            items
                .into_iter()
                .map(|item| to_structured(item, name))
                .collect(),
        ),
        Value::Null => Structured::Scalar(Scalar::Null),
        Value::Bool(b) => Structured::Scalar(Scalar::Bool(b)),
        Value::Number(n) => Structured::Scalar(Scalar::Number(n)),
        Value::String(s) => Structured::Scalar(match decode_utc_iso8601(&s) {
            Ok(ts) => Scalar::Timestamp(ts),
            Err(_) => Scalar::String(s),
        }),
    }
}

fn to_record(map: Map<String, Value>, name: &str) -> Record {
    let fields = map
        .into_iter()
        .map(|(key, value)| {
            let node = to_structured(value, &key);
            (key, node)
        })
        .collect();
    Record {
        name: name.to_string(),
        fields,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn nested_arrays_of_records() {
        let data = to_structured(
            json!({"fields": {"array": [{"id": 1}, {"id": 2}]}}),
            ROOT_RECORD_NAME,
        );

        let array = data.path(&["fields", "array"]).unwrap();
        assert_eq!(array.index(1).and_then(|e| e.get("id")).and_then(Structured::as_i64), Some(2));
        assert_eq!(array.index(0).and_then(Structured::as_record).map(Record::name), Some("array"));
        assert_eq!(data.as_record().map(Record::name), Some("data"));
    }

    #[test]
    fn timestamps_are_decoded_in_place() {
        let data = to_structured(
            json!({
                "created": "2020-07-30T16:12:44.490868Z",
                "tags": ["2020-07-30T16:12:44 UTC", "plain"],
                "label": "2020-07-30",
            }),
            ROOT_RECORD_NAME,
        );

        let expected = Utc.with_ymd_and_hms(2020, 7, 30, 16, 12, 44).unwrap();
        assert_eq!(
            data.get("created").and_then(Structured::as_timestamp),
            Some(expected + chrono::TimeDelta::microseconds(490_868))
        );
        assert_eq!(
            data.get("tags").and_then(|t| t.index(0)).and_then(Structured::as_timestamp),
            Some(expected)
        );
        assert_eq!(
            data.get("tags").and_then(|t| t.index(1)).and_then(Structured::as_str),
            Some("plain")
        );
        assert_eq!(data.get("label").and_then(Structured::as_str), Some("2020-07-30"));
    }

    #[test]
    fn odd_fraction_lengths_stay_strings() {
        let data = to_structured(
            json!({
                "tenths": "2020-07-30T16:12:44.4Z",
                "millis": "2020-07-30T16:12:44.490Z",
            }),
            ROOT_RECORD_NAME,
        );

        assert_eq!(
            data.get("tenths").and_then(Structured::as_str),
            Some("2020-07-30T16:12:44.4Z")
        );
        assert_eq!(
            data.get("millis").and_then(Structured::as_timestamp),
            Some(
                Utc.with_ymd_and_hms(2020, 7, 30, 16, 12, 44).unwrap()
                    + chrono::TimeDelta::milliseconds(490)
            )
        );
    }

    #[test]
    fn scalars_and_missing_fields() {
        let data = to_structured(
            json!({"ok": true, "ratio": 0.5, "nothing": null}),
            ROOT_RECORD_NAME,
        );

        assert_eq!(data.get("ok").and_then(Structured::as_bool), Some(true));
        assert_eq!(data.get("ratio").and_then(Structured::as_f64), Some(0.5));
        assert!(data.get("nothing").is_some_and(Structured::is_null));
        assert!(data.get("missing").is_none());
        assert!(data.get("ok").and_then(|ok| ok.get("inner")).is_none());
    }
}
