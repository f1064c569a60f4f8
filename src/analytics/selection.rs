use super::engine::{AnalyticsEngine, AnalyticsReport};
use super::time_range::TimeRange;
use crate::telemetry::TelemetryError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Tracks which query selection is current.
///
/// Every new selection begins a [`QueryTicket`] with a higher generation.
/// A result computed under an older ticket is stale and must be discarded,
/// whatever order the computations complete in.
#[derive(Debug, Clone, Default)]
pub struct RangeSelector {
    generation: Arc<AtomicU64>,
}

impl RangeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> QueryTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        QueryTicket {
            generation,
            current: Arc::clone(&self.generation),
        }
    }

    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct QueryTicket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl QueryTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }

    /// Hands the result back only while no newer selection has begun.
    pub fn publish_if_current<T>(&self, result: T) -> Option<T> {
        if self.is_current() {
            Some(result)
        } else {
            tracing::debug!(generation = self.generation, "Discarding stale query result");
            None
        }
    }
}

/// Report of the most recently selected range.
///
/// Selections may overlap: a report is only kept when no newer selection
/// began while it was computed.
#[derive(Debug)]
pub struct ReportSelection {
    selector: RangeSelector,
    current: watch::Sender<Option<AnalyticsReport>>,
}

impl Default for ReportSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSelection {
    pub fn new() -> Self {
        Self {
            selector: RangeSelector::new(),
            current: watch::Sender::new(None),
        }
    }

    /// Computes the report of `range`. `Ok(None)` when a newer selection
    /// superseded this one.
    pub async fn select(
        &self,
        engine: &AnalyticsEngine,
        range: TimeRange,
        now_millis: i64,
    ) -> Result<Option<AnalyticsReport>, TelemetryError> {
        let ticket = self.selector.begin();
        tracing::debug!(%range, generation = ticket.generation(), "Range selected");
        let report = engine.analyze(range, now_millis).await?;

        let mut published = None;
        self.current.send_if_modified(|slot| match ticket.publish_if_current(report) {
            Some(report) => {
                *slot = Some(report.clone());
                published = Some(report);
                true
            }
            None => false,
        });
        Ok(published)
    }

    pub fn current(&self) -> Option<AnalyticsReport> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AnalyticsReport>> {
        self.current.subscribe()
    }
}
