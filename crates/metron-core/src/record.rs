//! Metric records
//!
//! A [`Record`] is one emission as seen by a sink: the kind of metric, the
//! fully resolved stat name, and a map of fields (always `value`, plus `tags`
//! when the emitting handle carries any).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Field map attached to every record
pub type Fields = Map<String, Value>;

/// Kind of metric being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Counter increment
    Incr,
    /// Point-in-time measurement
    Gauge,
    /// Duration in milliseconds
    Timing,
    /// Value added to a distribution
    Histogram,
}

impl MetricKind {
    /// All metric kinds, in declaration order
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Incr,
        MetricKind::Gauge,
        MetricKind::Timing,
        MetricKind::Histogram,
    ];

    /// Lowercase name used in records and configuration
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incr => "incr",
            Self::Gauge => "gauge",
            Self::Timing => "timing",
            Self::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown metric kind
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric kind: {0} (expected incr, gauge, timing or histogram)")]
pub struct ParseMetricKindError(pub String);

impl FromStr for MetricKind {
    type Err = ParseMetricKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "incr" | "increment" | "count" => Ok(Self::Incr),
            "gauge" => Ok(Self::Gauge),
            "timing" => Ok(Self::Timing),
            "histogram" => Ok(Self::Histogram),
            _ => Err(ParseMetricKindError(s.to_string())),
        }
    }
}

/// One recorded metric emission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Metric kind
    pub kind: MetricKind,
    /// Full dotted stat name (namespace plus leaf)
    pub name: String,
    /// Emission fields
    pub fields: Fields,
}

impl Record {
    /// Create a record
    #[must_use]
    pub fn new(kind: MetricKind, name: impl Into<String>, fields: Fields) -> Self {
        Self {
            kind,
            name: name.into(),
            fields,
        }
    }

    /// Create a record from a JSON object literal
    ///
    /// Anything other than an object yields a record with no fields.
    #[must_use]
    pub fn from_json(kind: MetricKind, name: impl Into<String>, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Fields::new(),
        };
        Self::new(kind, name, fields)
    }

    /// The recorded `value` field, if present
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.fields.get("value")
    }

    /// Tags attached to the emission
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.fields
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether every entry of `expected` is present in this record's fields
    #[must_use]
    pub fn fields_contain(&self, expected: &Fields) -> bool {
        expected
            .iter()
            .all(|(key, value)| self.fields.get(key) == Some(value))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.kind,
            self.name,
            Value::Object(self.fields.clone())
        )
    }
}
