use crate::datamodel::{MetricConfig, Zone};
use serde::Serialize;

/// Qualitative band of a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreRating {
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            ScoreRating::Excellent
        } else if score >= 6.0 {
            ScoreRating::Good
        } else if score >= 4.0 {
            ScoreRating::Fair
        } else {
            ScoreRating::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreRating::Excellent => "Excellent",
            ScoreRating::Good => "Good",
            ScoreRating::Fair => "Fair",
            ScoreRating::Poor => "Poor",
        }
    }
}

/// Status of a single metric value against its configured ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Excellent,
    Good,
    Poor,
    Unknown,
}

impl MetricStatus {
    pub fn of(config: &MetricConfig, value: Option<f64>) -> Self {
        match value.filter(|value| value.is_finite()) {
            None => MetricStatus::Unknown,
            Some(value) => match config.zone(value) {
                Zone::Optimal => MetricStatus::Excellent,
                Zone::Acceptable => MetricStatus::Good,
                Zone::Outside => MetricStatus::Poor,
            },
        }
    }
}
