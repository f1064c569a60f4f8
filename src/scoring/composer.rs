use super::policy::{MAX_SCORE, MIN_SCORE, ScoringPolicy};
use super::rating::ScoreRating;
use super::round_to_tenth;
use crate::datamodel::{MetricValues, Reading, ScoringConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Composite score of one reading together with the sub-scores it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub score: f64,
    pub rating: ScoreRating,
    /// Sub-scores of the metrics that took part in the composition.
    pub sub_scores: BTreeMap<String, f64>,
}

/// Weighted composition of per-metric sub-scores.
///
/// Only metrics present in a reading contribute, and the weights are
/// renormalised over them. A missing metric never counts as a zero.
#[derive(Debug, Clone)]
pub struct ScoreComposer {
    config: Arc<ScoringConfig>,
}

impl ScoreComposer {
    pub fn new(config: Arc<ScoringConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn breakdown(&self, values: &MetricValues) -> ScoreBreakdown {
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        let mut sub_scores = BTreeMap::new();

        for metric in self.config.metrics() {
            let Some(value) = values.get(&metric.name) else {
                continue;
            };
            let sub_score = ScoringPolicy::score(value, metric);
            weighted_sum += sub_score * metric.weight;
            weight_sum += metric.weight;
            sub_scores.insert(metric.name.clone(), sub_score);
        }

        let score = if weight_sum > 0.0 {
            round_to_tenth(weighted_sum / weight_sum).clamp(MIN_SCORE, MAX_SCORE)
        } else {
            MIN_SCORE
        };

        ScoreBreakdown {
            score,
            rating: ScoreRating::from_score(score),
            sub_scores,
        }
    }

    /// Composite score in `[0, 10]`, rounded to one decimal, 0 without usable metrics.
    pub fn compose(&self, values: &MetricValues) -> f64 {
        self.breakdown(values).score
    }

    pub fn compose_reading(&self, reading: &Reading) -> f64 {
        self.compose(reading.metrics())
    }
}
