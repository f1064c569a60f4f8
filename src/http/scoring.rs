use super::app_error::AppError;
use super::state::HttpServerState;
use crate::datamodel::{MetricValues, ScoringConfig};
use crate::scoring::{MetricStatus, ScoreBreakdown};
use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    #[serde(flatten)]
    pub breakdown: ScoreBreakdown,
    pub statuses: BTreeMap<String, MetricStatus>,
}

/// Scoring table
///
/// Returns the metric configurations used to compute scores.
#[utoipa::path(
    get,
    path = "/api/v1/scoring",
    tag = "Scoring",
    responses(
        (status = 200, description = "Metric configurations, in scoring order"),
    )
)]
pub async fn scoring_config(State(state): State<HttpServerState>) -> Json<ScoringConfig> {
    Json(state.engine.composer().config().clone())
}

/// Score a record
///
/// Scores one raw telemetry record. Missing or non-numeric metrics are
/// left out of the composition.
#[utoipa::path(
    post,
    path = "/api/v1/score",
    tag = "Scoring",
    request_body(content = String, description = "Raw telemetry record", content_type = "application/json",
        example = json!({"temperature": 22.5, "humidity": "48", "airQuality_ppm": 420})),
    responses(
        (status = 200, description = "Composite score, rating, sub-scores and metric statuses"),
        (status = 400, description = "Bad Request", body = AppError),
    )
)]
pub async fn score_record(
    State(state): State<HttpServerState>,
    Json(record): Json<Value>,
) -> Result<Json<ScoreResponse>, AppError> {
    let Value::Object(record) = record else {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "A telemetry record must be a JSON object"
        )));
    };

    let composer = state.engine.composer();
    let config = composer.config();
    let values = MetricValues::from_record(&record, config.metric_names());
    let statuses = config
        .metrics()
        .iter()
        .map(|metric| {
            (
                metric.name.clone(),
                MetricStatus::of(metric, values.get(&metric.name)),
            )
        })
        .collect();

    Ok(Json(ScoreResponse {
        breakdown: composer.breakdown(&values),
        statuses,
    }))
}
