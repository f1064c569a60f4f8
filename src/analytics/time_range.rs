use crate::datamodel::{MILLIS_PER_DAY, MILLIS_PER_HOUR};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Historical window ending now.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "24h")]
    Last24Hours,
    #[default]
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl TimeRange {
    pub fn duration_millis(&self) -> i64 {
        match self {
            TimeRange::Last24Hours => 24 * MILLIS_PER_HOUR,
            TimeRange::Last7Days => 7 * MILLIS_PER_DAY,
            TimeRange::Last30Days => 30 * MILLIS_PER_DAY,
        }
    }

    /// Start of the window in canonical milliseconds.
    pub fn start_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.duration_millis())
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeRange::Last24Hours => "24h",
            TimeRange::Last7Days => "7d",
            TimeRange::Last30Days => "30d",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown time range '{0}', expected 24h, 7d or 30d")]
pub struct UnknownTimeRange(pub String);

impl FromStr for TimeRange {
    type Err = UnknownTimeRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" => Ok(TimeRange::Last24Hours),
            "7d" => Ok(TimeRange::Last7Days),
            "30d" => Ok(TimeRange::Last30Days),
            other => Err(UnknownTimeRange(other.to_string())),
        }
    }
}
