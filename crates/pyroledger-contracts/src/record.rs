//! Field-level record snapshots and change-sets.
//!
//! A `Snapshot` is the flat, typed attribute view of one entity at one point
//! in time. Two snapshots are compared through their *canonical* form.
//! Audit payloads store the typed `FieldValue`s themselves (tagged JSON such
//! as `{"type":"decimal","value":12.5}`); the canonical form is derived on
//! demand:
//!
//! | value       | canonical JSON                                   |
//! |-------------|--------------------------------------------------|
//! | `Null`      | `null`                                           |
//! | `Bool`      | `true` / `false`                                 |
//! | `Integer`   | JSON number                                      |
//! | `Decimal`   | string, fixed 6 places, `-0` folded to `0`       |
//! | `Text`      | string, verbatim                                 |
//! | `Date`      | string `YYYY-MM-DD`                              |
//! | `Timestamp` | string, UTC RFC 3339, millisecond precision, `Z` |
//! | `List`      | array, element order preserved                   |
//! | `Map`       | object, keys in ascending byte order             |

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decimal places used when canonicalizing `FieldValue::Decimal`.
pub const CANONICAL_DECIMAL_PLACES: usize = 6;

/// Format `value` with exactly `places` fractional digits.
///
/// Negative zero is folded to zero so `-0.0` and `0.0` never differ.
/// Non-finite values map to the fixed strings `NaN`, `inf` and `-inf`.
pub fn canonical_decimal(value: f64, places: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let formatted = format!("{:.*}", places, value);
    // Rounding can still produce "-0.000" from a tiny negative value.
    match formatted.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => formatted,
    }
}

/// Canonical UTC timestamp representation.
pub fn canonical_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Canonical calendar-date representation.
pub fn canonical_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// The canonical JSON form of this value (see the module table).
    pub fn canonical(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Decimal(d) => Value::String(canonical_decimal(*d, CANONICAL_DECIMAL_PLACES)),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Date(d) => Value::String(canonical_date(d)),
            FieldValue::Timestamp(ts) => Value::String(canonical_timestamp(ts)),
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::canonical).collect()),
            FieldValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.canonical()))
                    .collect(),
            ),
        }
    }

    /// True when both values have the same canonical form.
    pub fn canonical_eq(&self, other: &FieldValue) -> bool {
        self.canonical() == other.canonical()
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Decimal(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// The flat attribute view of one entity, keyed by field name.
///
/// Backed by a `BTreeMap`, so iteration and serialization order never depend
/// on the order fields were inserted in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot(BTreeMap<String, FieldValue>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical JSON object of every field.
    pub fn canonical(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.canonical()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for (k, v) in iter {
            snapshot.insert(k, v);
        }
        snapshot
    }
}

/// The before/after pair for one changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: FieldValue,
    pub new: FieldValue,
}

/// The minimal field-level diff between two snapshots of one entity.
///
/// Produced by the record differ and consumed by the audit trail. A
/// `ChangeSet` handed to the trail for an update is expected to be
/// non-empty; the differ returns `None` rather than an empty set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet(BTreeMap<String, FieldChange>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, old: FieldValue, new: FieldValue) {
        self.0.insert(field.into(), FieldChange { old, new });
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldChange)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
