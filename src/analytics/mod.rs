pub mod correlation;
pub mod distribution;
pub mod engine;
pub mod hourly;
pub mod selection;
pub mod series_builder;
pub mod statistics;
pub mod time_range;

pub use correlation::{CorrelationExtractor, CorrelationPoint};
pub use distribution::{
    Distribution, DistributionBin, DistributionBinner, DistributionLayout, LayoutError,
};
pub use engine::{
    AnalyticsEngine, AnalyticsReport, CorrelationSummary, HourlyPattern, HourlySource,
};
pub use hourly::{HourlyAggregate, HourlyAggregator};
pub use selection::{QueryTicket, RangeSelector, ReportSelection};
pub use series_builder::{EmptyRecordPolicy, RecordRejection, SeriesBuilder};
pub use statistics::{Statistics, StatisticsCalculator};
pub use time_range::{TimeRange, UnknownTimeRange};
