use super::{
    LiveCallback, LiveEvent, Subscription, TelemetryError, TelemetrySource, starts_at_or_after,
};
use crate::datamodel::{CalendarDate, TimestampUnit};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const LATEST_READINGS: &str = "/latest_readings";
const ENVIRONMENTAL_DATA: &str = "/environmental_data";
const MINIMUM_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Telemetry read from a JSON export of the realtime database tree.
///
/// ```json
/// {
///   "latest_readings": { "timestamp": 1700000000, "temperature": 22.1 },
///   "environmental_data": { "-Nk1": { "timestamp": 1700000000, ... } },
///   "aggregated_data": { "hourly": { "2023": { "11": { "14": { "3": { ... } } } } } }
/// }
/// ```
///
/// The file is re-read on every query, live updates are polled.
#[derive(Debug, Clone)]
pub struct SnapshotTelemetry {
    path: PathBuf,
    unit: TimestampUnit,
    poll_interval: Duration,
}

impl SnapshotTelemetry {
    pub fn new(path: impl Into<PathBuf>, unit: TimestampUnit, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            unit,
            poll_interval: poll_interval.max(MINIMUM_POLL_INTERVAL),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole tree, `None` when the file does not exist.
    async fn load(path: &Path) -> Result<Option<Value>, TelemetryError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn latest_event(path: &Path) -> LiveEvent {
        match Self::load(path).await {
            Ok(tree) => match tree.as_ref().and_then(|tree| tree.pointer(LATEST_READINGS)) {
                Some(Value::Null) | None => LiveEvent::NoData,
                Some(record) => LiveEvent::Record(record.clone()),
            },
            Err(error) => LiveEvent::Failed(error),
        }
    }
}

/// Children of a database node, whether stored as an object or an array.
fn children(node: &Value, what: &str) -> Result<Vec<(String, Value)>, TelemetryError> {
    match node {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map.iter().map(|(key, value)| (key.clone(), value.clone())).collect()),
        // Numeric keys come back as arrays with holes
        Value::Array(items) => Ok(items
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_null())
            .map(|(index, value)| (index.to_string(), value.clone()))
            .collect()),
        other => Err(TelemetryError::Malformed(format!(
            "{} is not a collection: {}",
            what, other
        ))),
    }
}

#[async_trait]
impl TelemetrySource for SnapshotTelemetry {
    fn scheme(&self) -> &'static str {
        "snapshot"
    }

    fn timestamp_unit(&self) -> TimestampUnit {
        self.unit
    }

    async fn subscribe_latest(
        &self,
        callback: LiveCallback,
    ) -> Result<Subscription, TelemetryError> {
        let mut last = Self::latest_event(&self.path).await;
        callback(last.clone());

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let path = self.path.clone();
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tokio::spawn(async move {
            // The first tick completes immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        let event = Self::latest_event(&path).await;
                        if event != last {
                            if let LiveEvent::Failed(error) = &event {
                                tracing::warn!(%error, path = %path.display(), "Snapshot unreadable");
                            }
                            last = event.clone();
                            callback(event);
                        }
                    }
                }
            }
            tracing::debug!(path = %path.display(), "Snapshot subscription closed");
        });

        Ok(Subscription::new(token))
    }

    async fn query_range(&self, start: i64) -> Result<Vec<Value>, TelemetryError> {
        let Some(tree) = Self::load(&self.path).await? else {
            return Ok(Vec::new());
        };
        let Some(node) = tree.pointer(ENVIRONMENTAL_DATA) else {
            return Ok(Vec::new());
        };
        Ok(children(node, "environmental_data")?
            .into_iter()
            .map(|(_, record)| record)
            .filter(|record| starts_at_or_after(record, start))
            .collect())
    }

    async fn query_day_hourly(
        &self,
        date: CalendarDate,
    ) -> Result<BTreeMap<String, Value>, TelemetryError> {
        let Some(tree) = Self::load(&self.path).await? else {
            return Ok(BTreeMap::new());
        };
        let pointer = format!(
            "/aggregated_data/hourly/{:04}/{:02}/{:02}",
            date.year(),
            date.month(),
            date.day()
        );
        let Some(node) = tree.pointer(&pointer) else {
            return Ok(BTreeMap::new());
        };
        Ok(children(node, &pointer)?.into_iter().collect())
    }

    async fn health_check(&self) -> Result<(), TelemetryError> {
        Self::load(&self.path).await.map(|_| ())
    }
}
