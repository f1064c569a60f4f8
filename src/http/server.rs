use super::analytics::{
    __path_analytics_report, __path_correlation, __path_current_selection, __path_distribution,
    __path_export, __path_history, __path_hourly, __path_select_range, __path_statistics,
    analytics_report, correlation, current_selection, distribution, export, history, hourly,
    select_range, statistics,
};
use super::app_error::AppError;
use super::health::{__path_liveness, __path_readiness, liveness, readiness};
use super::live::{__path_live_state, live_state};
use super::scoring::{__path_score_record, __path_scoring_config, score_record, scoring_config};
use super::state::HttpServerState;
use crate::config;
use anyhow::Result;
use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::header;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace;
use tower_http::{ServiceBuilderExt, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "EnvScore", description = "EnvScore API"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Scoring", description = "Environmental quality scoring"),
        (name = "Live", description = "Latest live reading"),
        (name = "Analytics", description = "Historical analytics and export"),
    ),
    paths(frontpage, liveness, readiness,
        scoring_config, score_record,
        live_state,
        analytics_report, history, statistics, distribution, correlation, hourly, export,
        select_range, current_selection),
)]
struct ApiDoc;

/// The application routes with their middleware.
pub fn router(state: HttpServerState, body_limit: usize, timeout_seconds: u64) -> Router {
    let max_body_layer = DefaultBodyLimit::max(body_limit);

    // List of headers that shouldn't be logged
    let sensitive_headers: Arc<[_]> = vec![header::AUTHORIZATION, header::COOKIE].into();

    // Middleware creation
    let middleware = ServiceBuilder::new()
        .sensitive_request_headers(sensitive_headers.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .sensitive_response_headers(sensitive_headers)
        .layer(TimeoutLayer::new(Duration::from_secs(timeout_seconds)))
        .compression()
        .into_inner();

    Router::new()
        .route("/", get(frontpage))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        // Probes
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        // Scoring
        .route("/api/v1/scoring", get(scoring_config))
        .route(
            "/api/v1/score",
            post(score_record).layer(max_body_layer.clone()),
        )
        // Streaming path
        .route("/api/v1/live", get(live_state))
        // Query path
        .route("/api/v1/analytics", get(analytics_report))
        .route("/api/v1/analytics/history", get(history))
        .route("/api/v1/analytics/statistics", get(statistics))
        .route("/api/v1/analytics/distribution", get(distribution))
        .route("/api/v1/analytics/correlation", get(correlation))
        .route("/api/v1/analytics/hourly", get(hourly))
        .route("/api/v1/analytics/export", get(export))
        .route(
            "/api/v1/analytics/selection",
            get(current_selection).post(select_range),
        )
        .layer(middleware)
        .with_state(state)
}

pub async fn run_http_server(state: HttpServerState, address: SocketAddr) -> Result<()> {
    let config = config::get()?;
    let app = router(
        state,
        config.parse_http_body_limit()?,
        config.http_server_timeout_seconds,
    );

    // Run our application
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!(%address, "HTTP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    // Wait for the CTRL+C signal
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to install the CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "EnvScore",
    responses(
        (status = 200, description = "EnvScore Frontpage", body = String)
    )
)]
async fn frontpage(State(state): State<HttpServerState>) -> Result<Json<String>, AppError> {
    let name: String = (*state.name).clone();
    Ok(Json(name))
}
