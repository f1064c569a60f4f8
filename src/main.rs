#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use envscore::analytics::{AnalyticsEngine, EmptyRecordPolicy, ReportSelection};
use envscore::config::{self, load_configuration};
use envscore::datamodel::TimestampNormalizer;
use envscore::http::server::run_http_server;
use envscore::http::state::HttpServerState;
use envscore::live::LiveMonitor;
use envscore::scoring::ScoreComposer;
use envscore::telemetry::telemetry_factory::create_telemetry_from_connection_string;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::Level;
use tracing::event;

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Initialize tracing subscriber for HTTP request logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    // Load configuration
    load_configuration().context("Failed to load configuration")?;
    let config = config::get().context("Failed to get configuration")?;

    // Initialize Sentry if DSN is provided
    let _sentry = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let unit = config.timestamp_unit().context("Invalid timestamp unit")?;
    let scoring = Arc::new(
        config
            .load_scoring_config()
            .await
            .context("Failed to load the scoring configuration")?,
    );
    event!(
        Level::INFO,
        metrics = scoring.metrics().len(),
        "Scoring configuration loaded"
    );

    // Initialize telemetry source
    event!(
        Level::INFO,
        connection_string = %config.telemetry_connection_string,
        "Connecting to telemetry source"
    );
    let telemetry = create_telemetry_from_connection_string(
        &config.telemetry_connection_string,
        unit,
        config.live_poll_interval(),
    )
    .context("Failed to create telemetry source")?;

    let empty_records = if config.drop_empty_records {
        EmptyRecordPolicy::Drop
    } else {
        EmptyRecordPolicy::Retain
    };
    let engine = Arc::new(
        AnalyticsEngine::new(telemetry.clone(), scoring.clone(), config.utc_offset_minutes)
            .with_empty_record_policy(empty_records),
    );

    let live = Arc::new(LiveMonitor::new(
        ScoreComposer::new(scoring),
        TimestampNormalizer::new(unit),
    ));
    // Dropping the subscription would stop the live updates
    let _live_subscription = match live.attach(telemetry.as_ref()).await {
        Ok(subscription) => Some(subscription),
        Err(err) => {
            event!(Level::WARN, "Live updates unavailable: {}", err);
            None
        }
    };

    // Exit the program if a panic occurs
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(1);
    }));

    let endpoint = config.endpoint;
    let port = config.port;
    let address = SocketAddr::from((endpoint, port));

    event!(Level::INFO, "Starting HTTP server on {}", address);
    match run_http_server(
        HttpServerState {
            name: Arc::new("EnvScore".to_string()),
            engine,
            live,
            selection: Arc::new(ReportSelection::new()),
        },
        address,
    )
    .await
    {
        Ok(_) => {
            event!(Level::INFO, "HTTP server stopped gracefully");
            Ok(())
        }
        Err(err) => {
            event!(Level::ERROR, "HTTP server failed to start: {}", err);
            Err(err)
        }
    }
}
