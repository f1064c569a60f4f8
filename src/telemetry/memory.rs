use super::{
    LiveCallback, LiveEvent, Subscription, TelemetryError, TelemetrySource, starts_at_or_after,
};
use crate::datamodel::{CalendarDate, TimestampUnit};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;

/// In-process telemetry source, for demos and tests.
///
/// Failures can be injected to exercise the error paths of the engine.
#[derive(Debug)]
pub struct MemoryTelemetry {
    unit: TimestampUnit,
    latest: watch::Sender<LiveEvent>,
    records: RwLock<Vec<Value>>,
    hourly: RwLock<BTreeMap<CalendarDate, BTreeMap<String, Value>>>,
    failure: RwLock<Option<TelemetryError>>,
}

impl MemoryTelemetry {
    pub fn new(unit: TimestampUnit) -> Self {
        Self {
            unit,
            latest: watch::Sender::new(LiveEvent::NoData),
            records: RwLock::new(Vec::new()),
            hourly: RwLock::new(BTreeMap::new()),
            failure: RwLock::new(None),
        }
    }

    pub fn publish_latest(&self, record: Value) {
        self.latest.send_replace(LiveEvent::Record(record));
    }

    pub fn clear_latest(&self) {
        self.latest.send_replace(LiveEvent::NoData);
    }

    pub fn fail_latest(&self, error: TelemetryError) {
        self.latest.send_replace(LiveEvent::Failed(error));
    }

    pub async fn insert_record(&self, record: Value) {
        self.records.write().await.push(record);
    }

    pub async fn extend_records(&self, records: impl IntoIterator<Item = Value>) {
        self.records.write().await.extend(records);
    }

    pub async fn insert_hourly(&self, date: CalendarDate, hour: u8, record: Value) {
        self.hourly
            .write()
            .await
            .entry(date)
            .or_default()
            .insert(hour.to_string(), record);
    }

    /// Makes every query fail with `failure` until reset with `None`.
    pub async fn set_failure(&self, failure: Option<TelemetryError>) {
        *self.failure.write().await = failure;
    }

    async fn check_failure(&self) -> Result<(), TelemetryError> {
        match self.failure.read().await.as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TelemetrySource for MemoryTelemetry {
    fn scheme(&self) -> &'static str {
        "memory"
    }

    fn timestamp_unit(&self) -> TimestampUnit {
        self.unit
    }

    async fn subscribe_latest(
        &self,
        callback: LiveCallback,
    ) -> Result<Subscription, TelemetryError> {
        let mut receiver = self.latest.subscribe();
        callback(receiver.borrow_and_update().clone());

        let token = CancellationToken::new();
        let cancelled = token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    changed = receiver.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let event = receiver.borrow_and_update().clone();
                        callback(event);
                    }
                }
            }
            tracing::debug!("Memory telemetry subscription closed");
        });

        Ok(Subscription::new(token))
    }

    async fn query_range(&self, start: i64) -> Result<Vec<Value>, TelemetryError> {
        self.check_failure().await?;
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|record| starts_at_or_after(record, start))
            .cloned()
            .collect())
    }

    async fn query_day_hourly(
        &self,
        date: CalendarDate,
    ) -> Result<BTreeMap<String, Value>, TelemetryError> {
        self.check_failure().await?;
        Ok(self
            .hourly
            .read()
            .await
            .get(&date)
            .cloned()
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<(), TelemetryError> {
        self.check_failure().await
    }
}
