//! Test utilities for EnvScore tests
//!
//! Fixtures shared by the unit and integration tests: raw telemetry
//! records and an application state wired to an in-memory source.

use crate::analytics::{AnalyticsEngine, ReportSelection};
use crate::datamodel::envscore_datetime::now_unix_milliseconds;
use crate::datamodel::{ScoringConfig, TimestampNormalizer, TimestampUnit};
use crate::http::state::HttpServerState;
use crate::live::LiveMonitor;
use crate::scoring::ScoreComposer;
use crate::telemetry::{MemoryTelemetry, TelemetrySource};
use serde_json::{Value, json};
use std::sync::Arc;

/// Current time in whole seconds, the default telemetry resolution.
pub fn now_seconds() -> i64 {
    now_unix_milliseconds().unwrap_or_default() / 1000
}

/// A raw record with every living-condition metric, timestamped in seconds.
pub fn living_record(
    timestamp_seconds: i64,
    temperature: f64,
    humidity: f64,
    air_quality_ppm: f64,
    sound_level: f64,
) -> Value {
    json!({
        "timestamp": timestamp_seconds,
        "temperature": temperature,
        "humidity": humidity,
        "airQuality_ppm": air_quality_ppm,
        "soundLevel": sound_level,
    })
}

/// A comfortable indoor reading, scores 10.
pub fn comfortable_record(timestamp_seconds: i64) -> Value {
    living_record(timestamp_seconds, 23.0, 50.0, 350.0, 0.1)
}

pub async fn memory_telemetry_with(records: impl IntoIterator<Item = Value>) -> Arc<MemoryTelemetry> {
    let telemetry = Arc::new(MemoryTelemetry::new(TimestampUnit::Seconds));
    telemetry.extend_records(records).await;
    telemetry
}

/// Application state over `telemetry` with the living-condition table and UTC.
pub fn test_state(telemetry: Arc<MemoryTelemetry>) -> HttpServerState {
    let config = Arc::new(ScoringConfig::living_conditions());
    HttpServerState {
        name: Arc::new("EnvScore Test".to_string()),
        engine: Arc::new(AnalyticsEngine::new(telemetry.clone(), config.clone(), 0)),
        live: Arc::new(LiveMonitor::new(
            ScoreComposer::new(config),
            TimestampNormalizer::new(telemetry.timestamp_unit()),
        )),
        selection: Arc::new(ReportSelection::new()),
    }
}
