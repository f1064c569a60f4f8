use crate::datamodel::reading::coerce_number;
use crate::datamodel::{
    MetricValues, Reading, SCORE_FIELD, ScoringConfig, Series, TIMESTAMP_FIELD, TimestampError,
    TimestampNormalizer, TimestampUnit,
};
use serde_json::Value;
use thiserror::Error;

/// What to do with records that carry a valid timestamp but no metric at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyRecordPolicy {
    #[default]
    Retain,
    Drop,
}

/// Why a raw record did not make it into a series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordRejection {
    #[error("Entry is not a record")]
    NotARecord,
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
    #[error("Record has no metric value")]
    Empty,
}

/// Validates raw telemetry records into an ordered [`Series`].
///
/// Bad metric fields are dropped one by one, the record itself is only
/// rejected when its timestamp is invalid (or, under
/// [`EmptyRecordPolicy::Drop`], when no metric is left).
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    normalizer: TimestampNormalizer,
    fields: Vec<String>,
    empty_records: EmptyRecordPolicy,
}

impl SeriesBuilder {
    pub fn new(config: &ScoringConfig, unit: TimestampUnit) -> Self {
        Self {
            normalizer: TimestampNormalizer::new(unit),
            fields: config.metric_names().map(str::to_string).collect(),
            empty_records: EmptyRecordPolicy::default(),
        }
    }

    pub fn with_empty_record_policy(mut self, policy: EmptyRecordPolicy) -> Self {
        self.empty_records = policy;
        self
    }

    pub fn normalizer(&self) -> &TimestampNormalizer {
        &self.normalizer
    }

    pub fn empty_record_policy(&self) -> EmptyRecordPolicy {
        self.empty_records
    }

    pub fn parse_record(&self, raw: &Value) -> Result<Reading, RecordRejection> {
        let record = raw.as_object().ok_or(RecordRejection::NotARecord)?;
        let timestamp = self
            .normalizer
            .normalize(record.get(TIMESTAMP_FIELD).unwrap_or(&Value::Null))?;

        let metrics = MetricValues::from_record(record, self.fields.iter().map(String::as_str));
        let score = record.get(SCORE_FIELD).and_then(coerce_number);

        if metrics.is_empty() && self.empty_records == EmptyRecordPolicy::Drop {
            return Err(RecordRejection::Empty);
        }
        Ok(Reading::new(timestamp, metrics, score))
    }

    pub fn build<'a>(&self, records: impl IntoIterator<Item = &'a Value>) -> Series {
        let mut readings = Vec::new();
        let mut rejected = 0usize;

        for raw in records {
            match self.parse_record(raw) {
                Ok(reading) => readings.push(reading),
                Err(reason) => {
                    rejected += 1;
                    tracing::debug!(%reason, "Skipping record");
                }
            }
        }

        if readings.is_empty() && rejected > 0 {
            tracing::warn!(rejected, "Every record of the batch was rejected");
        } else if rejected > 0 {
            tracing::debug!(kept = readings.len(), rejected, "Built series");
        }

        Series::from_unsorted(readings)
    }
}
