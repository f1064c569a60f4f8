use crate::datamodel::Series;
use crate::scoring::round_to_tenth;
use serde::Serialize;
use std::collections::BTreeMap;

/// Descriptive statistics of one metric over a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Statistics {
    Available {
        /// Mean, rounded to one decimal.
        avg: f64,
        min: f64,
        max: f64,
        /// Value of the last reading that has the metric.
        latest: f64,
    },
    Unavailable,
}

impl Statistics {
    pub fn is_available(&self) -> bool {
        matches!(self, Statistics::Available { .. })
    }
}

pub struct StatisticsCalculator;

impl StatisticsCalculator {
    pub fn summarize(series: &Series, metric: &str) -> Statistics {
        let mut values = series.values(metric);
        let Some(first) = values.next() else {
            return Statistics::Unavailable;
        };

        let (mut sum, mut count, mut min, mut max, mut latest) = (first, 1usize, first, first, first);
        for value in values {
            sum += value;
            count += 1;
            min = min.min(value);
            max = max.max(value);
            latest = value;
        }

        Statistics::Available {
            avg: round_to_tenth(sum / count as f64),
            min,
            max,
            latest,
        }
    }

    pub fn compute<'a>(
        series: &Series,
        metrics: impl IntoIterator<Item = &'a str>,
    ) -> BTreeMap<String, Statistics> {
        metrics
            .into_iter()
            .map(|metric| (metric.to_string(), Self::summarize(series, metric)))
            .collect()
    }
}
