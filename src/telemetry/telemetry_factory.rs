use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};

use super::{MemoryTelemetry, SnapshotTelemetry, TelemetryError, TelemetrySource};
use crate::datamodel::TimestampUnit;

pub fn create_telemetry_from_connection_string(
    connection_string: &str,
    unit: TimestampUnit,
    poll_interval: Duration,
) -> Result<Arc<dyn TelemetrySource>> {
    Ok(match connection_string {
        "memory:" | "memory://" => Arc::new(MemoryTelemetry::new(unit)),

        s if s.starts_with("snapshot:") => {
            let path = s.trim_start_matches("snapshot:").trim_start_matches("//");
            if path.is_empty() {
                bail!(TelemetryError::UnsupportedConnectionString(
                    "snapshot: needs a file path".to_string()
                ));
            }
            Arc::new(SnapshotTelemetry::new(path, unit, poll_interval))
        }

        _ => bail!(TelemetryError::UnsupportedConnectionString(
            connection_string.to_string()
        )),
    })
}
