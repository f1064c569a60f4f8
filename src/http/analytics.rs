use super::app_error::AppError;
use super::state::HttpServerState;
use crate::analytics::engine::{HUMIDITY_METRIC, TEMPERATURE_METRIC};
use crate::analytics::{
    AnalyticsReport, CorrelationSummary, Distribution, DistributionBinner, DistributionLayout,
    HourlyPattern, Statistics, TimeRange,
};
use crate::datamodel::envscore_datetime::now_unix_milliseconds;
use crate::datamodel::{CalendarDate, SCORE_FIELD, Series};
use crate::exporters::{CsvConverter, ExportFormat, JsonlConverter};
use axum::Json;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DistributionQuery {
    pub range: Option<String>,
    pub metric: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CorrelationQuery {
    pub range: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HourlyQuery {
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub range: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub range: TimeRange,
    pub readings: Series,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub range: TimeRange,
    /// A newer selection began while this one was computed.
    pub superseded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AnalyticsReport>,
}

fn parse_range(range: Option<&str>) -> Result<TimeRange, AppError> {
    match range {
        None => Ok(TimeRange::default()),
        Some(range) => range.parse().map_err(AppError::bad_request),
    }
}

fn now_millis() -> Result<i64, AppError> {
    now_unix_milliseconds().map_err(|error| {
        AppError::internal_server_error(anyhow::anyhow!("System clock unavailable: {}", error))
    })
}

async fn series_for(state: &HttpServerState, range: TimeRange) -> Result<Series, AppError> {
    state
        .engine
        .historical_series(range, now_millis()?)
        .await
        .map_err(AppError::from_telemetry)
}

fn known_metric(state: &HttpServerState, metric: &str) -> Result<(), AppError> {
    if state.engine.metric_names().contains(&metric) {
        Ok(())
    } else {
        Err(AppError::bad_request(anyhow::anyhow!(
            "Unknown metric: {}",
            metric
        )))
    }
}

/// Analytics report
///
/// Statistics, distributions and the temperature/humidity correlation of
/// one time range.
#[utoipa::path(
    get,
    path = "/api/v1/analytics",
    tag = "Analytics",
    params(
        ("range" = Option<String>, Query, description = "Time range ending now: 24h, 7d or 30d. 7d by default", example = "7d"),
    ),
    responses(
        (status = 200, description = "Analytics report"),
        (status = 400, description = "Bad Request", body = AppError),
        (status = 503, description = "Telemetry source unavailable", body = AppError),
    )
)]
pub async fn analytics_report(
    State(state): State<HttpServerState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let range = parse_range(query.range.as_deref())?;
    let report = state
        .engine
        .analyze(range, now_millis()?)
        .await
        .map_err(AppError::from_telemetry)?;
    Ok(Json(report))
}

/// Historical readings
///
/// Valid readings of the range in ascending time order, with a score on
/// every reading that carries metrics.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/history",
    tag = "Analytics",
    params(
        ("range" = Option<String>, Query, description = "Time range ending now: 24h, 7d or 30d. 7d by default", example = "24h"),
    ),
    responses(
        (status = 200, description = "Historical readings"),
        (status = 400, description = "Bad Request", body = AppError),
        (status = 503, description = "Telemetry source unavailable", body = AppError),
    )
)]
pub async fn history(
    State(state): State<HttpServerState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let range = parse_range(query.range.as_deref())?;
    let readings = series_for(&state, range).await?;
    Ok(Json(HistoryResponse { range, readings }))
}

/// Per-metric statistics
#[utoipa::path(
    get,
    path = "/api/v1/analytics/statistics",
    tag = "Analytics",
    params(
        ("range" = Option<String>, Query, description = "Time range ending now: 24h, 7d or 30d. 7d by default", example = "30d"),
    ),
    responses(
        (status = 200, description = "Average, minimum, maximum and latest value of every metric and of the score"),
        (status = 400, description = "Bad Request", body = AppError),
        (status = 503, description = "Telemetry source unavailable", body = AppError),
    )
)]
pub async fn statistics(
    State(state): State<HttpServerState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<BTreeMap<String, Statistics>>, AppError> {
    let range = parse_range(query.range.as_deref())?;
    let series = series_for(&state, range).await?;
    Ok(Json(state.engine.statistics(&series)))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/distribution",
    tag = "Analytics",
    params(
        ("range" = Option<String>, Query, description = "Time range ending now: 24h, 7d or 30d. 7d by default"),
        ("metric" = Option<String>, Query, description = "temperature or score. temperature by default", example = "score"),
    ),
    responses(
        (status = 200, description = "Reading counts per band"),
        (status = 400, description = "Bad Request", body = AppError),
        (status = 503, description = "Telemetry source unavailable", body = AppError),
    )
)]
pub async fn distribution(
    State(state): State<HttpServerState>,
    Query(query): Query<DistributionQuery>,
) -> Result<Json<Distribution>, AppError> {
    let range = parse_range(query.range.as_deref())?;
    let metric = query.metric.as_deref().unwrap_or(TEMPERATURE_METRIC);
    let layout = match metric {
        TEMPERATURE_METRIC => DistributionLayout::temperature_bands(),
        SCORE_FIELD => DistributionLayout::score_bands(),
        other => {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "No distribution bands for metric: {}",
                other
            )));
        }
    };
    let series = series_for(&state, range).await?;
    Ok(Json(DistributionBinner::bin(&series, metric, &layout)))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/correlation",
    tag = "Analytics",
    params(
        ("range" = Option<String>, Query, description = "Time range ending now: 24h, 7d or 30d. 7d by default"),
        ("x" = Option<String>, Query, description = "Metric on the x axis, temperature by default"),
        ("y" = Option<String>, Query, description = "Metric on the y axis, humidity by default"),
    ),
    responses(
        (status = 200, description = "Paired values and their Pearson coefficient"),
        (status = 400, description = "Bad Request", body = AppError),
        (status = 503, description = "Telemetry source unavailable", body = AppError),
    )
)]
pub async fn correlation(
    State(state): State<HttpServerState>,
    Query(query): Query<CorrelationQuery>,
) -> Result<Json<CorrelationSummary>, AppError> {
    let range = parse_range(query.range.as_deref())?;
    let x = query.x.as_deref().unwrap_or(TEMPERATURE_METRIC);
    let y = query.y.as_deref().unwrap_or(HUMIDITY_METRIC);
    known_metric(&state, x)?;
    known_metric(&state, y)?;
    let series = series_for(&state, range).await?;
    Ok(Json(CorrelationSummary::compute(&series, x, y)))
}

/// Hour-of-day pattern
///
/// Per-hour averages of one local calendar day. Stored aggregates are used
/// when the source has them.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/hourly",
    tag = "Analytics",
    params(
        ("date" = Option<String>, Query, description = "Local calendar day, YYYY-MM-DD. Today by default", example = "2024-03-01"),
    ),
    responses(
        (status = 200, description = "Hourly averages"),
        (status = 400, description = "Bad Request", body = AppError),
        (status = 503, description = "Telemetry source unavailable", body = AppError),
    )
)]
pub async fn hourly(
    State(state): State<HttpServerState>,
    Query(query): Query<HourlyQuery>,
) -> Result<Json<HourlyPattern>, AppError> {
    let date = match query.date.as_deref() {
        Some(date) => date.parse::<CalendarDate>().map_err(AppError::bad_request)?,
        None => CalendarDate::containing(now_millis()?, state.engine.utc_offset_minutes()),
    };
    let pattern = state
        .engine
        .hourly_pattern(date)
        .await
        .map_err(AppError::from_telemetry)?;
    Ok(Json(pattern))
}

/// Export readings
///
/// Downloads the readings of the range as CSV or JSON Lines.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/export",
    tag = "Analytics",
    params(
        ("range" = Option<String>, Query, description = "Time range ending now: 24h, 7d or 30d. 7d by default"),
        ("format" = Option<String>, Query, description = "csv or jsonl. csv by default", example = "csv"),
    ),
    responses(
        (status = 200, description = "Exported readings", content_type = "text/csv"),
        (status = 400, description = "Bad Request", body = AppError),
        (status = 503, description = "Telemetry source unavailable", body = AppError),
    )
)]
pub async fn export(
    State(state): State<HttpServerState>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let range = parse_range(query.range.as_deref())?;
    let format = match query.format.as_deref() {
        Some(format) => format.parse::<ExportFormat>().map_err(AppError::BadRequest)?,
        None => ExportFormat::default(),
    };
    let series = series_for(&state, range).await?;

    let body = match format {
        ExportFormat::Csv => CsvConverter::to_csv(
            &series,
            &state.engine.metric_names(),
            state.engine.utc_offset_minutes(),
        ),
        ExportFormat::Jsonl => JsonlConverter::to_jsonl(&series)?,
    };
    let disposition = format!(
        "attachment; filename=\"envscore-{}.{}\"",
        range,
        format.extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Select a range
///
/// Computes the report of a range and publishes it as the current
/// selection, unless a newer selection began in the meantime.
#[utoipa::path(
    post,
    path = "/api/v1/analytics/selection",
    tag = "Analytics",
    params(
        ("range" = Option<String>, Query, description = "Time range ending now: 24h, 7d or 30d. 7d by default"),
    ),
    responses(
        (status = 200, description = "Published report, or superseded"),
        (status = 400, description = "Bad Request", body = AppError),
        (status = 503, description = "Telemetry source unavailable", body = AppError),
    )
)]
pub async fn select_range(
    State(state): State<HttpServerState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<SelectionResponse>, AppError> {
    let range = parse_range(query.range.as_deref())?;
    let report = state
        .selection
        .select(&state.engine, range, now_millis()?)
        .await
        .map_err(AppError::from_telemetry)?;
    Ok(Json(SelectionResponse {
        range,
        superseded: report.is_none(),
        report,
    }))
}

/// Current selection
#[utoipa::path(
    get,
    path = "/api/v1/analytics/selection",
    tag = "Analytics",
    responses(
        (status = 200, description = "Report of the last published selection"),
        (status = 404, description = "No range selected yet", body = AppError),
    )
)]
pub async fn current_selection(
    State(state): State<HttpServerState>,
) -> Result<Json<AnalyticsReport>, AppError> {
    state
        .selection
        .current()
        .map(Json)
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("No range selected yet")))
}
