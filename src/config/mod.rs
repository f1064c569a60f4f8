use crate::datamodel::{ScoringConfig, TimestampUnit};
use anyhow::{Context, Error};
use confique::Config;
use std::{
    net::IpAddr,
    path::PathBuf,
    sync::{Arc, OnceLock},
    time::Duration,
};

#[derive(Debug, Config)]
pub struct EnvScoreConfig {
    #[config(env = "ENVSCORE_PORT", default = 3000)]
    pub port: u16,
    #[config(env = "ENVSCORE_ENDPOINT", default = "127.0.0.1")]
    pub endpoint: IpAddr,

    #[config(env = "ENVSCORE_HTTP_BODY_LIMIT", default = "1mb")]
    pub http_body_limit: String,

    #[config(env = "ENVSCORE_HTTP_SERVER_TIMEOUT_SECONDS", default = 30)]
    pub http_server_timeout_seconds: u64,

    #[config(env = "ENVSCORE_TELEMETRY_CONNECTION_STRING", default = "memory:")]
    pub telemetry_connection_string: String,

    /// Resolution of the timestamps the telemetry source emits, `s` or `ms`.
    #[config(env = "ENVSCORE_TIMESTAMP_UNIT", default = "s")]
    pub timestamp_unit: String,

    /// Offset of the local wall clock used for hours of day and calendar days.
    #[config(env = "ENVSCORE_UTC_OFFSET_MINUTES", default = 0)]
    pub utc_offset_minutes: i32,

    /// JSON scoring table, the built-in living-condition table when unset.
    #[config(env = "ENVSCORE_SCORING_CONFIG")]
    pub scoring_config_path: Option<PathBuf>,

    #[config(env = "ENVSCORE_DROP_EMPTY_RECORDS", default = false)]
    pub drop_empty_records: bool,

    #[config(env = "ENVSCORE_LIVE_POLL_INTERVAL_SECONDS", default = 5)]
    pub live_poll_interval_seconds: u64,

    #[config(env = "ENVSCORE_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
}

impl EnvScoreConfig {
    pub fn load() -> Result<EnvScoreConfig, Error> {
        let c = EnvScoreConfig::builder()
            .env()
            .file("settings.toml")
            .load()?;

        Ok(c)
    }

    pub fn parse_http_body_limit(&self) -> Result<usize, Error> {
        let size = byte_unit::Byte::parse_str(self.http_body_limit.clone(), true)?.as_u64();
        if size > 1024 * 1024 * 1024 {
            anyhow::bail!("Body size is too big: > 1GiB");
        }
        Ok(size as usize)
    }

    pub fn timestamp_unit(&self) -> Result<TimestampUnit, Error> {
        Ok(self.timestamp_unit.parse()?)
    }

    pub fn live_poll_interval(&self) -> Duration {
        Duration::from_secs(self.live_poll_interval_seconds)
    }

    pub async fn load_scoring_config(&self) -> Result<ScoringConfig, Error> {
        match &self.scoring_config_path {
            Some(path) => ScoringConfig::from_json_file(path)
                .await
                .with_context(|| format!("Failed to load scoring table {}", path.display())),
            None => Ok(ScoringConfig::living_conditions()),
        }
    }
}

static ENVSCORE_CONFIG: OnceLock<Arc<EnvScoreConfig>> = OnceLock::new();

pub fn get() -> Result<Arc<EnvScoreConfig>, Error> {
    ENVSCORE_CONFIG.get().cloned().ok_or_else(|| {
        Error::msg(
            "Configuration not loaded. Please call load_configuration() before using the configuration",
        )
    })
}

pub fn load_configuration() -> Result<(), Error> {
    // Check if the configuration has already been loaded
    if ENVSCORE_CONFIG.get().is_some() {
        return Ok(());
    }

    let config = EnvScoreConfig::load()?;
    ENVSCORE_CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}

use std::sync::Mutex;

static TEST_CONFIG_INIT: Mutex<()> = Mutex::new(());

/// Loads the configuration exactly once across unit and integration tests.
#[allow(dead_code)]
pub fn load_configuration_for_tests() -> Result<(), Error> {
    let _guard = TEST_CONFIG_INIT
        .lock()
        .map_err(|_| Error::msg("Test configuration lock poisoned"))?;

    if ENVSCORE_CONFIG.get().is_some() {
        return Ok(());
    }

    let config = EnvScoreConfig::load()?;
    ENVSCORE_CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}
