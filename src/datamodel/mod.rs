pub mod envscore_datetime;
pub mod metric_config;
pub mod reading;
pub mod series;
pub mod timestamp;

pub use envscore_datetime::{
    CalendarDate, DateParseError, EnvScoreDateTime, MILLIS_PER_DAY, MILLIS_PER_HOUR,
    MILLIS_PER_MINUTE,
};
pub use metric_config::{
    MetricConfig, Polarity, ScoringConfig, ScoringConfigError, ValueRange, Zone,
};
pub use reading::{MetricValues, Reading, SCORE_FIELD, TIMESTAMP_FIELD};
pub use series::Series;
pub use timestamp::{TimestampError, TimestampNormalizer, TimestampUnit};
