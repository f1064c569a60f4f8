use crate::datamodel::envscore_datetime::now_unix_milliseconds;
use crate::datamodel::{MetricValues, TIMESTAMP_FIELD, TimestampNormalizer};
use crate::scoring::{MetricStatus, ScoreComposer, ScoreRating};
use crate::telemetry::{LiveCallback, LiveEvent, Subscription, TelemetryError, TelemetrySource};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

pub mod alerts;

pub use alerts::{ConditionAlert, ConditionAlerter};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub value: Option<f64>,
    pub unit: String,
    pub status: MetricStatus,
    pub sub_score: Option<f64>,
}

/// The latest live reading, scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    /// Canonical milliseconds, absent when the record's timestamp is invalid.
    pub timestamp: Option<i64>,
    pub score: f64,
    pub rating: ScoreRating,
    pub metrics: BTreeMap<String, MetricSnapshot>,
    pub alert: Option<ConditionAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LiveState {
    NoReading,
    Current(LiveSnapshot),
    Failed { message: String },
}

impl LiveState {
    /// Name of the state as serialized in the `state` tag.
    pub fn label(&self) -> &'static str {
        match self {
            LiveState::NoReading => "noReading",
            LiveState::Current(_) => "current",
            LiveState::Failed { .. } => "failed",
        }
    }

    pub fn snapshot(&self) -> Option<&LiveSnapshot> {
        match self {
            LiveState::Current(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// Streaming path: scores each live reading as it arrives.
///
/// Latest value wins, there is no queue. "No data" and failures both clear
/// the current reading.
#[derive(Debug)]
pub struct LiveMonitor {
    composer: ScoreComposer,
    normalizer: TimestampNormalizer,
    alerter: ConditionAlerter,
    state: watch::Sender<LiveState>,
}

impl LiveMonitor {
    pub fn new(composer: ScoreComposer, normalizer: TimestampNormalizer) -> Self {
        Self {
            composer,
            normalizer,
            alerter: ConditionAlerter::new(),
            state: watch::Sender::new(LiveState::NoReading),
        }
    }

    pub fn current(&self) -> LiveState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<LiveState> {
        self.state.subscribe()
    }

    pub fn handle(&self, event: LiveEvent) {
        let now_ms = now_unix_milliseconds().unwrap_or_else(|error| {
            tracing::warn!(%error, "System clock unavailable, alerts are skipped");
            0
        });
        self.apply(event, now_ms);
    }

    pub fn apply(&self, event: LiveEvent, now_ms: i64) -> LiveState {
        let state = match event {
            LiveEvent::Record(Value::Object(record)) => LiveState::Current(self.snapshot(&record, now_ms)),
            LiveEvent::Record(Value::Null) | LiveEvent::NoData => {
                tracing::debug!("No live reading");
                LiveState::NoReading
            }
            LiveEvent::Record(other) => {
                tracing::warn!(record = %other, "Live record is not an object");
                LiveState::NoReading
            }
            LiveEvent::Failed(error) => {
                tracing::warn!(%error, "Live subscription failed");
                LiveState::Failed {
                    message: error.to_string(),
                }
            }
        };
        self.state.send_replace(state.clone());
        state
    }

    fn snapshot(&self, record: &Map<String, Value>, now_ms: i64) -> LiveSnapshot {
        let config = self.composer.config();
        let values = MetricValues::from_record(record, config.metric_names());
        let breakdown = self.composer.breakdown(&values);

        let timestamp = match self
            .normalizer
            .normalize(record.get(TIMESTAMP_FIELD).unwrap_or(&Value::Null))
        {
            Ok(timestamp) => Some(timestamp),
            Err(reason) => {
                tracing::debug!(%reason, "Live reading without a valid timestamp");
                None
            }
        };

        let metrics = config
            .metrics()
            .iter()
            .map(|metric| {
                let value = values.get(&metric.name);
                (
                    metric.name.clone(),
                    MetricSnapshot {
                        value,
                        unit: metric.unit.clone(),
                        status: MetricStatus::of(metric, value),
                        sub_score: breakdown.sub_scores.get(&metric.name).copied(),
                    },
                )
            })
            .collect();

        LiveSnapshot {
            timestamp,
            score: breakdown.score,
            rating: breakdown.rating,
            metrics,
            alert: self.alerter.check(breakdown.score, now_ms),
        }
    }

    /// Subscribes to the source's latest reading.
    pub async fn attach(
        self: &Arc<Self>,
        source: &dyn TelemetrySource,
    ) -> Result<Subscription, TelemetryError> {
        let monitor = Arc::clone(self);
        let callback: LiveCallback = Arc::new(move |event| monitor.handle(event));
        match source.subscribe_latest(callback).await {
            Ok(subscription) => {
                tracing::info!("Live monitor attached");
                Ok(subscription)
            }
            Err(error) => {
                self.apply(LiveEvent::Failed(error.clone()), 0);
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::{ScoringConfig, TimestampUnit};
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    fn monitor() -> LiveMonitor {
        LiveMonitor::new(
            ScoreComposer::new(Arc::new(ScoringConfig::living_conditions())),
            TimestampNormalizer::new(TimestampUnit::Seconds),
        )
    }

    #[test]
    fn test_record_is_scored() {
        let monitor = monitor();
        let state = monitor.apply(
            LiveEvent::Record(json!({
                "timestamp": 1_700_000_000,
                "temperature": 23.0,
                "humidity": "50",
                "airQuality_ppm": 350,
            })),
            NOW,
        );
        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.timestamp, Some(1_700_000_000_000));
        assert_eq!(snapshot.score, 10.0);
        assert_eq!(snapshot.rating, ScoreRating::Excellent);
        assert_eq!(snapshot.alert, Some(ConditionAlert::Excellent));

        let sound = &snapshot.metrics["soundLevel"];
        assert_eq!(sound.value, None);
        assert_eq!(sound.status, MetricStatus::Unknown);
        assert_eq!(sound.sub_score, None);
        assert_eq!(snapshot.metrics["humidity"].status, MetricStatus::Excellent);
        assert_eq!(snapshot.metrics["temperature"].unit, "°C");

        assert_eq!(monitor.current(), state);
    }

    #[test]
    fn test_no_data_is_not_a_zero_reading() {
        let monitor = monitor();
        monitor.apply(LiveEvent::Record(json!({"temperature": 23.0})), NOW);
        assert!(monitor.current().snapshot().is_some());

        for _ in 0..3 {
            assert_eq!(monitor.apply(LiveEvent::NoData, NOW), LiveState::NoReading);
        }
        assert_eq!(
            monitor.apply(LiveEvent::Record(Value::Null), NOW),
            LiveState::NoReading
        );
        assert_eq!(
            monitor.apply(LiveEvent::Record(json!([1, 2])), NOW),
            LiveState::NoReading
        );
    }

    #[test]
    fn test_record_without_metrics_scores_zero() {
        let state = monitor().apply(
            LiveEvent::Record(json!({"timestamp": "soon", "temperature": "hot"})),
            NOW,
        );
        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.timestamp, None);
        assert_eq!(snapshot.score, 0.0);
        assert_eq!(snapshot.rating, ScoreRating::Poor);
        assert_eq!(snapshot.alert, Some(ConditionAlert::Poor));
    }

    #[test]
    fn test_failure_clears_current_reading() {
        let monitor = monitor();
        monitor.apply(LiveEvent::Record(json!({"temperature": 23.0})), NOW);
        let state = monitor.apply(
            LiveEvent::Failed(TelemetryError::PermissionDenied("rules".to_string())),
            NOW,
        );
        assert!(matches!(state, LiveState::Failed { .. }));
        assert!(monitor.current().snapshot().is_none());
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(
            serde_json::to_value(LiveState::NoReading).unwrap(),
            json!({"state": "noReading"})
        );
        assert_eq!(
            serde_json::to_value(LiveState::Failed {
                message: "offline".to_string()
            })
            .unwrap(),
            json!({"state": "failed", "message": "offline"})
        );
        assert_eq!(LiveState::NoReading.label(), "noReading");
    }
}
