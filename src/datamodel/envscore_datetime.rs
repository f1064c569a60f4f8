use hifitime::{HifitimeError, UNIX_REF_EPOCH, Unit};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type EnvScoreDateTime = hifitime::Epoch;

pub const MILLIS_PER_MINUTE: i64 = 60_000;
pub const MILLIS_PER_HOUR: i64 = 3_600_000;
pub const MILLIS_PER_DAY: i64 = 86_400_000;

pub trait EnvScoreDateTimeExt {
    fn from_unix_milliseconds_i64(timestamp: i64) -> Self;
    fn gregorian_year(&self) -> i32;
}

impl EnvScoreDateTimeExt for EnvScoreDateTime {
    fn from_unix_milliseconds_i64(timestamp: i64) -> Self {
        Self::from_utc_duration(UNIX_REF_EPOCH.to_utc_duration() + timestamp * Unit::Millisecond)
    }

    fn gregorian_year(&self) -> i32 {
        self.to_gregorian_utc().0
    }
}

/// Current wall clock time in milliseconds since the Unix epoch.
pub fn now_unix_milliseconds() -> Result<i64, HifitimeError> {
    Ok(EnvScoreDateTime::now()?.to_unix_milliseconds().floor() as i64)
}

fn local_millis(timestamp: i64, utc_offset_minutes: i32) -> i64 {
    timestamp + i64::from(utc_offset_minutes) * MILLIS_PER_MINUTE
}

/// Hour of day (0..=23) on the local wall clock.
pub fn local_hour(timestamp: i64, utc_offset_minutes: i32) -> u8 {
    (local_millis(timestamp, utc_offset_minutes).rem_euclid(MILLIS_PER_DAY) / MILLIS_PER_HOUR) as u8
}

/// `HH:MM` on the local wall clock.
pub fn local_time_label(timestamp: i64, utc_offset_minutes: i32) -> String {
    let in_day = local_millis(timestamp, utc_offset_minutes).rem_euclid(MILLIS_PER_DAY);
    let hour = in_day / MILLIS_PER_HOUR;
    let minute = (in_day % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE;
    format!("{:02}:{:02}", hour, minute)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid calendar date '{0}', expected YYYY-MM-DD")]
pub struct DateParseError(pub String);

/// A calendar day on the local wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate {
    year: i32,
    month: u8,
    day: u8,
}

impl CalendarDate {
    pub fn new(year: i32, month: u8, day: u8) -> Result<Self, DateParseError> {
        // hifitime rejects impossible days such as February 30th
        EnvScoreDateTime::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0)
            .map_err(|_| DateParseError(format!("{:04}-{:02}-{:02}", year, month, day)))?;
        Ok(Self { year, month, day })
    }

    /// The local calendar day containing `timestamp`.
    pub fn containing(timestamp: i64, utc_offset_minutes: i32) -> Self {
        let midnight = local_millis(timestamp, utc_offset_minutes).div_euclid(MILLIS_PER_DAY)
            * MILLIS_PER_DAY;
        let (year, month, day, ..) =
            EnvScoreDateTime::from_unix_milliseconds_i64(midnight).to_gregorian_utc();
        Self { year, month, day }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    /// Local midnight of this day, in UTC milliseconds.
    pub fn start_millis(&self, utc_offset_minutes: i32) -> i64 {
        let midnight =
            EnvScoreDateTime::from_gregorian_utc_at_midnight(self.year, self.month, self.day)
                .to_unix_milliseconds()
                .round() as i64;
        midnight - i64::from(utc_offset_minutes) * MILLIS_PER_MINUTE
    }

    /// Exclusive end of this day, in UTC milliseconds.
    pub fn end_millis(&self, utc_offset_minutes: i32) -> i64 {
        self.start_millis(utc_offset_minutes) + MILLIS_PER_DAY
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for CalendarDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DateParseError(s.to_string());
        let mut parts = s.trim().splitn(3, '-');
        let year = parts.next().and_then(|p| p.parse::<i32>().ok());
        let month = parts.next().and_then(|p| p.parse::<u8>().ok());
        let day = parts.next().and_then(|p| p.parse::<u8>().ok());
        match (year, month, day) {
            (Some(year), Some(month), Some(day)) => {
                CalendarDate::new(year, month, day).map_err(|_| invalid())
            }
            _ => Err(invalid()),
        }
    }
}
