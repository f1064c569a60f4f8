use crate::datamodel::{CalendarDate, TIMESTAMP_FIELD, TimestampNormalizer, TimestampUnit};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod error;
pub mod memory;
pub mod snapshot;
pub mod telemetry_factory;

pub use error::TelemetryError;
pub use memory::MemoryTelemetry;
pub use snapshot::SnapshotTelemetry;

/// One delivery of the live-reading subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// The latest raw record.
    Record(Value),
    /// The live path does not exist or holds nothing.
    NoData,
    /// The source failed, there is no current reading until it recovers.
    Failed(TelemetryError),
}

pub type LiveCallback = Arc<dyn Fn(LiveEvent) + Send + Sync>;

/// Handle of a live subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    token: CancellationToken,
}

impl Subscription {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn unsubscribe(self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Where readings come from.
///
/// Timestamps cross this boundary in the source's declared unit. Absence of
/// data is always a successful, empty answer.
#[async_trait]
pub trait TelemetrySource: Send + Sync + Debug {
    /// Connection string scheme this source was created from, e.g. `snapshot`.
    fn scheme(&self) -> &'static str;

    fn timestamp_unit(&self) -> TimestampUnit;

    /// Registers a callback for the latest reading. The current state is
    /// delivered before this returns, later changes as they happen.
    async fn subscribe_latest(&self, callback: LiveCallback)
    -> Result<Subscription, TelemetryError>;

    /// Raw records whose timestamp is at or after `start`, in the source unit.
    async fn query_range(&self, start: i64) -> Result<Vec<Value>, TelemetryError>;

    /// Per-hour aggregate records of one day, keyed `"0"`..`"23"`.
    async fn query_day_hourly(
        &self,
        date: CalendarDate,
    ) -> Result<BTreeMap<String, Value>, TelemetryError>;

    async fn health_check(&self) -> Result<(), TelemetryError>;
}

/// Range filter shared by the sources.
///
/// Entries without a comparable timestamp are kept, the series builder
/// rejects them with a reason.
pub(crate) fn starts_at_or_after(record: &Value, start: i64) -> bool {
    record
        .get(TIMESTAMP_FIELD)
        .and_then(|timestamp| TimestampNormalizer::parse_raw(timestamp).ok())
        .is_none_or(|timestamp| timestamp >= start)
}
