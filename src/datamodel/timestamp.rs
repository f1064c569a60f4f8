use super::envscore_datetime::{EnvScoreDateTime, EnvScoreDateTimeExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Earliest calendar year a normalized timestamp may resolve to.
/// Anything earlier is an epoch-zero default leaking from a missing field.
pub const MINIMUM_YEAR: i32 = 1971;

// 9999-12-31T23:59:59.999Z
const MAXIMUM_MILLIS: i64 = 253_402_300_799_999;

/// Resolution of the raw timestamps a telemetry source emits.
///
/// The unit is a declared property of the source, never guessed from
/// the magnitude of individual values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    #[default]
    Seconds,
    Milliseconds,
}

impl TimestampUnit {
    fn millis_factor(&self) -> i64 {
        match self {
            TimestampUnit::Seconds => 1000,
            TimestampUnit::Milliseconds => 1,
        }
    }

    /// Converts canonical milliseconds back into this unit, rounding down.
    pub fn from_millis(&self, millis: i64) -> i64 {
        millis.div_euclid(self.millis_factor())
    }
}

impl fmt::Display for TimestampUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampUnit::Seconds => write!(f, "s"),
            TimestampUnit::Milliseconds => write!(f, "ms"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown timestamp unit '{0}', expected 's' or 'ms'")]
pub struct UnknownTimestampUnit(pub String);

impl FromStr for TimestampUnit {
    type Err = UnknownTimestampUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" | "seconds" => Ok(TimestampUnit::Seconds),
            "ms" | "milliseconds" => Ok(TimestampUnit::Milliseconds),
            _ => Err(UnknownTimestampUnit(s.to_string())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("Timestamp is missing")]
    Missing,

    #[error("Timestamp {0} is not numeric")]
    Unparsable(String),

    #[error("Timestamp {0} is not positive")]
    NonPositive(i64),

    #[error("Timestamp {0} is out of the representable range")]
    OutOfRange(i64),

    #[error("Timestamp {millis} ms resolves to year {year}, before {MINIMUM_YEAR}")]
    BeforeMinimumYear { millis: i64, year: i32 },
}

/// Turns raw timestamp values into canonical milliseconds since the epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimestampNormalizer {
    unit: TimestampUnit,
}

impl TimestampNormalizer {
    pub fn new(unit: TimestampUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> TimestampUnit {
        self.unit
    }

    /// Reads a raw timestamp as an integer in the source unit.
    ///
    /// Accepts JSON numbers and numeric strings. Fractional parts are truncated.
    pub fn parse_raw(value: &Value) -> Result<i64, TimestampError> {
        match value {
            Value::Null => Err(TimestampError::Missing),
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|f| f.trunc() as i64))
                .ok_or_else(|| TimestampError::Unparsable(number.to_string())),
            Value::String(text) => {
                let trimmed = text.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| {
                        trimmed
                            .parse::<f64>()
                            .ok()
                            .filter(|f| f.is_finite())
                            .map(|f| f.trunc() as i64)
                    })
                    .ok_or_else(|| TimestampError::Unparsable(format!("{:?}", text)))
            }
            other => Err(TimestampError::Unparsable(other.to_string())),
        }
    }

    /// Normalizes a raw timestamp into canonical milliseconds.
    pub fn normalize(&self, value: &Value) -> Result<i64, TimestampError> {
        let raw = Self::parse_raw(value)?;
        if raw <= 0 {
            return Err(TimestampError::NonPositive(raw));
        }
        let millis = raw
            .checked_mul(self.unit.millis_factor())
            .filter(|millis| *millis <= MAXIMUM_MILLIS)
            .ok_or(TimestampError::OutOfRange(raw))?;

        let year = EnvScoreDateTime::from_unix_milliseconds_i64(millis).gregorian_year();
        if year < MINIMUM_YEAR {
            return Err(TimestampError::BeforeMinimumYear { millis, year });
        }
        Ok(millis)
    }
}
