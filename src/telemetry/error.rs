use thiserror::Error;

/// Failures of a telemetry source.
///
/// An absent path or an empty snapshot is not an error, sources report
/// those as "no data".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// The source could not be reached or read
    #[error("Telemetry source unreachable: {0}")]
    Connectivity(String),

    #[error("Permission denied by the telemetry source: {0}")]
    PermissionDenied(String),

    /// The source answered with data that is not the expected shape
    #[error("Malformed telemetry data: {0}")]
    Malformed(String),

    #[error("Unsupported telemetry connection string: {0}")]
    UnsupportedConnectionString(String),
}

impl From<std::io::Error> for TelemetryError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(error.to_string()),
            _ => Self::Connectivity(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(error: serde_json::Error) -> Self {
        Self::Malformed(error.to_string())
    }
}
