#![allow(dead_code)]

use envscore::telemetry::MemoryTelemetry;
use envscore::test_utils::{memory_telemetry_with, test_state};
use serde_json::Value;
use std::sync::Arc;

pub mod http;

/// In-memory telemetry holding `records` and a test app reading from it.
pub async fn app_with(records: Vec<Value>) -> (http::TestApp, Arc<MemoryTelemetry>) {
    let telemetry = memory_telemetry_with(records).await;
    let app = http::TestApp::new(test_state(telemetry.clone()));
    (app, telemetry)
}

/// Seconds `hours` before now.
pub fn hours_ago(now_seconds: i64, hours: i64) -> i64 {
    now_seconds - hours * 3600
}
