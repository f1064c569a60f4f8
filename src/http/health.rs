use super::state::HttpServerState;
use crate::telemetry::TelemetrySource;
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    NotReady,
}

/// The telemetry source behind the analytics, as configured.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    /// Connection string scheme, `memory` or `snapshot`
    pub scheme: String,
    /// Declared unit of the source timestamps, `s` or `ms`
    pub timestamp_unit: String,
    pub reachable: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    pub status: Readiness,
    pub source: SourceStatus,
    /// State of the live subscription: `current`, `noReading` or `failed`
    pub live: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness check
///
/// Always 200 OK while the server can answer.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness(State(state): State<HttpServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: (*state.name).clone(),
    })
}

/// Readiness check
///
/// Ready when the telemetry source answers its health check. The body
/// describes the source and the live subscription either way.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Telemetry source reachable", body = ReadinessResponse),
        (status = 503, description = "Telemetry source unreachable", body = ReadinessResponse)
    )
)]
pub async fn readiness(State(state): State<HttpServerState>) -> (StatusCode, Json<ReadinessResponse>) {
    let source = state.engine.source();
    let check = source.health_check().await;
    let (code, status) = if check.is_ok() {
        (StatusCode::OK, Readiness::Ready)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Readiness::NotReady)
    };

    let response = ReadinessResponse {
        status,
        source: source_status(source.as_ref(), check.is_ok()),
        live: state.live.current().label().to_string(),
        error: check.err().map(|error| error.to_string()),
    };
    (code, Json(response))
}

fn source_status(source: &dyn TelemetrySource, reachable: bool) -> SourceStatus {
    SourceStatus {
        scheme: source.scheme().to_string(),
        timestamp_unit: source.timestamp_unit().to_string(),
        reachable,
    }
}
