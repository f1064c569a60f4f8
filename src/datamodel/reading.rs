use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field carrying the stored composite score of a record.
pub const SCORE_FIELD: &str = "score";

/// Field carrying the raw timestamp of a record.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Reads a metric field as a finite number.
///
/// JSON numbers and numeric strings are accepted, anything else is absent.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Metric values present in one reading, keyed by metric name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricValues(BTreeMap<String, f64>);

impl MetricValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts the named fields of a raw record, silently dropping the
    /// ones that are missing or not numeric.
    pub fn from_record<'a>(
        record: &Map<String, Value>,
        fields: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut values = Self::new();
        for field in fields {
            let Some(raw) = record.get(field) else {
                continue;
            };
            match coerce_number(raw) {
                Some(number) => {
                    values.insert(field, number);
                }
                None => tracing::debug!(field, value = %raw, "Dropping non-numeric field"),
            }
        }
        values
    }

    /// Inserts a value, returns false when it is not finite.
    ///
    /// `score` is not a metric: the stored score lives on the [`Reading`],
    /// so it is refused here.
    pub fn insert(&mut self, metric: impl Into<String>, value: f64) -> bool {
        let metric = metric.into();
        if metric == SCORE_FIELD {
            tracing::debug!(value, "Refusing the stored score as a metric value");
            return false;
        }
        if !value.is_finite() {
            return false;
        }
        self.0.insert(metric, value);
        true
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.0.get(metric).copied()
    }

    pub fn contains(&self, metric: &str) -> bool {
        self.0.contains_key(metric)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for MetricValues {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (metric, value) in iter {
            values.insert(metric, value);
        }
        values
    }
}

/// One validated sensor reading.
///
/// The timestamp is in canonical milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    timestamp: i64,
    #[serde(flatten)]
    metrics: MetricValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
}

impl Reading {
    pub fn new(timestamp: i64, metrics: MetricValues, score: Option<f64>) -> Self {
        Self {
            timestamp,
            metrics,
            score: score.filter(|score| score.is_finite()),
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn metrics(&self) -> &MetricValues {
        &self.metrics
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Value of a metric, or of the stored score when asked for `score`.
    pub fn value(&self, metric: &str) -> Option<f64> {
        if metric == SCORE_FIELD {
            self.score
        } else {
            self.metrics.get(metric)
        }
    }

    pub fn has_metrics(&self) -> bool {
        !self.metrics.is_empty()
    }

    /// A copy of this reading carrying the given score.
    pub fn with_score(self, score: f64) -> Self {
        Self::new(self.timestamp, self.metrics, Some(score))
    }
}
