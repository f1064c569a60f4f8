use super::correlation::{CorrelationExtractor, CorrelationPoint};
use super::distribution::{Distribution, DistributionBinner, DistributionLayout};
use super::hourly::{HourlyAggregate, HourlyAggregator};
use super::series_builder::{EmptyRecordPolicy, SeriesBuilder};
use super::statistics::{Statistics, StatisticsCalculator};
use super::time_range::TimeRange;
use crate::datamodel::{CalendarDate, SCORE_FIELD, ScoringConfig, Series};
use crate::scoring::ScoreComposer;
use crate::telemetry::{TelemetryError, TelemetrySource};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TEMPERATURE_METRIC: &str = "temperature";
pub const HUMIDITY_METRIC: &str = "humidity";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationSummary {
    pub x_metric: String,
    pub y_metric: String,
    pub coefficient: Option<f64>,
    pub points: Vec<CorrelationPoint>,
}

impl CorrelationSummary {
    pub fn compute(series: &Series, x_metric: &str, y_metric: &str) -> Self {
        let points = CorrelationExtractor::extract(series, x_metric, y_metric);
        Self {
            x_metric: x_metric.to_string(),
            y_metric: y_metric.to_string(),
            coefficient: CorrelationExtractor::pearson(&points),
            points,
        }
    }
}

/// Every historical view of one time range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub range: TimeRange,
    pub reading_count: usize,
    pub statistics: BTreeMap<String, Statistics>,
    pub temperature_distribution: Distribution,
    pub score_distribution: Distribution,
    pub correlation: CorrelationSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HourlySource {
    /// Aggregates stored by the telemetry source
    Precomputed,
    /// Aggregated here from the raw readings of the day
    Readings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPattern {
    pub date: String,
    pub source: HourlySource,
    pub hours: Vec<HourlyAggregate>,
}

/// Query path: pulls a bounded batch from the telemetry source, then runs
/// the whole aggregation pipeline synchronously over it.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    source: Arc<dyn TelemetrySource>,
    composer: ScoreComposer,
    builder: SeriesBuilder,
    utc_offset_minutes: i32,
}

impl AnalyticsEngine {
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        config: Arc<ScoringConfig>,
        utc_offset_minutes: i32,
    ) -> Self {
        let builder = SeriesBuilder::new(&config, source.timestamp_unit());
        Self {
            source,
            composer: ScoreComposer::new(config),
            builder,
            utc_offset_minutes,
        }
    }

    pub fn with_empty_record_policy(mut self, policy: EmptyRecordPolicy) -> Self {
        self.builder = self.builder.with_empty_record_policy(policy);
        self
    }

    pub fn composer(&self) -> &ScoreComposer {
        &self.composer
    }

    pub fn source(&self) -> &Arc<dyn TelemetrySource> {
        &self.source
    }

    pub fn utc_offset_minutes(&self) -> i32 {
        self.utc_offset_minutes
    }

    /// Configured metrics followed by `score`.
    pub fn metric_names(&self) -> Vec<&str> {
        self.composer
            .config()
            .metric_names()
            .chain(std::iter::once(SCORE_FIELD))
            .collect()
    }

    pub async fn historical_series(
        &self,
        range: TimeRange,
        now_millis: i64,
    ) -> Result<Series, TelemetryError> {
        self.series_since(range.start_millis(now_millis)).await
    }

    async fn series_since(&self, start_millis: i64) -> Result<Series, TelemetryError> {
        let start = self.source.timestamp_unit().from_millis(start_millis);
        let records = self.source.query_range(start).await?;
        tracing::debug!(start, records = records.len(), "Fetched historical records");
        Ok(self.derive_scores(self.builder.build(&records)))
    }

    /// Fills the score of readings that carry metrics but no stored score.
    pub fn derive_scores(&self, series: Series) -> Series {
        series.map_readings(|reading| match reading.score() {
            None if reading.has_metrics() => {
                let score = self.composer.compose_reading(&reading);
                reading.with_score(score)
            }
            _ => reading,
        })
    }

    pub fn statistics(&self, series: &Series) -> BTreeMap<String, Statistics> {
        StatisticsCalculator::compute(series, self.metric_names())
    }

    pub fn report(&self, range: TimeRange, series: &Series) -> AnalyticsReport {
        AnalyticsReport {
            range,
            reading_count: series.len(),
            statistics: self.statistics(series),
            temperature_distribution: DistributionBinner::bin(
                series,
                TEMPERATURE_METRIC,
                &DistributionLayout::temperature_bands(),
            ),
            score_distribution: DistributionBinner::bin(
                series,
                SCORE_FIELD,
                &DistributionLayout::score_bands(),
            ),
            correlation: CorrelationSummary::compute(series, TEMPERATURE_METRIC, HUMIDITY_METRIC),
        }
    }

    pub async fn analyze(
        &self,
        range: TimeRange,
        now_millis: i64,
    ) -> Result<AnalyticsReport, TelemetryError> {
        let series = self.historical_series(range, now_millis).await?;
        Ok(self.report(range, &series))
    }

    /// Hour-of-day pattern of one local calendar day.
    ///
    /// Aggregates stored by the source win, without them the raw readings
    /// of the day are aggregated here.
    pub async fn hourly_pattern(&self, date: CalendarDate) -> Result<HourlyPattern, TelemetryError> {
        let aggregator = HourlyAggregator::new(self.metric_names(), self.utc_offset_minutes);

        let records = self.source.query_day_hourly(date).await?;
        let precomputed = aggregator.parse_precomputed(&records);
        if !precomputed.is_empty() {
            return Ok(HourlyPattern {
                date: date.to_string(),
                source: HourlySource::Precomputed,
                hours: precomputed,
            });
        }

        let start = date.start_millis(self.utc_offset_minutes);
        let end = date.end_millis(self.utc_offset_minutes);
        let day = self.series_since(start).await?.between(start, end);
        tracing::debug!(%date, readings = day.len(), "No stored hourly aggregates, using readings");

        Ok(HourlyPattern {
            date: date.to_string(),
            source: HourlySource::Readings,
            hours: aggregator.aggregate(&day),
        })
    }
}
