use super::reading::SCORE_FIELD;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringConfigError {
    #[error("Scoring configuration has no metrics")]
    Empty,

    #[error("Metric name must not be empty")]
    EmptyName,

    #[error("Metric name '{0}' is reserved")]
    ReservedName(String),

    #[error("Metric '{0}' is configured more than once")]
    DuplicateMetric(String),

    #[error("Metric '{metric}' has invalid weight {weight}, expected a value in (0, 1]")]
    InvalidWeight { metric: String, weight: f64 },

    #[error("Metric '{metric}' has an invalid {range} range [{min}, {max}]")]
    InvalidRange {
        metric: String,
        range: &'static str,
        min: f64,
        max: f64,
    },

    #[error("Metric '{0}' has an optimal range that is not inside its acceptable range")]
    OptimalOutsideAcceptable(String),

    #[error("Metric '{metric}' has invalid decay constant {decay}, expected a positive value")]
    InvalidDecay { metric: String, decay: f64 },

    #[error("Failed to read scoring configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scoring configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Closed value interval, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn contains_range(&self, other: &ValueRange) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Polarity {
    /// Best inside a centered band, penalised on both sides.
    RangeOptimal,
    /// Best when minimised, only the upper bounds matter.
    LowerIsBetter,
}

/// Where a value falls relative to a metric's ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Optimal,
    Acceptable,
    Outside,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricConfig {
    pub name: String,
    pub weight: f64,
    pub polarity: Polarity,
    pub optimal_range: ValueRange,
    pub acceptable_range: ValueRange,
    pub unit: String,
    /// Distance past the acceptable range over which the sub-score decays by a factor e.
    pub decay_constant: f64,
}

impl MetricConfig {
    pub fn zone(&self, value: f64) -> Zone {
        match self.polarity {
            Polarity::RangeOptimal => {
                if self.optimal_range.contains(value) {
                    Zone::Optimal
                } else if self.acceptable_range.contains(value) {
                    Zone::Acceptable
                } else {
                    Zone::Outside
                }
            }
            Polarity::LowerIsBetter => {
                if value <= self.optimal_range.max {
                    Zone::Optimal
                } else if value <= self.acceptable_range.max {
                    Zone::Acceptable
                } else {
                    Zone::Outside
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        if self.name.is_empty() {
            return Err(ScoringConfigError::EmptyName);
        }
        if self.name == SCORE_FIELD {
            return Err(ScoringConfigError::ReservedName(self.name.clone()));
        }
        if !(self.weight.is_finite() && self.weight > 0.0 && self.weight <= 1.0) {
            return Err(ScoringConfigError::InvalidWeight {
                metric: self.name.clone(),
                weight: self.weight,
            });
        }
        for (range, values) in [
            ("optimal", &self.optimal_range),
            ("acceptable", &self.acceptable_range),
        ] {
            if !values.is_valid() {
                return Err(ScoringConfigError::InvalidRange {
                    metric: self.name.clone(),
                    range,
                    min: values.min,
                    max: values.max,
                });
            }
        }
        if !self.acceptable_range.contains_range(&self.optimal_range) {
            return Err(ScoringConfigError::OptimalOutsideAcceptable(
                self.name.clone(),
            ));
        }
        if !(self.decay_constant.is_finite() && self.decay_constant > 0.0) {
            return Err(ScoringConfigError::InvalidDecay {
                metric: self.name.clone(),
                decay: self.decay_constant,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ScoringConfigFile {
    metrics: Vec<MetricConfig>,
}

/// The immutable table of metric configurations used for scoring.
///
/// Weights need not sum to one, they are renormalised over the metrics
/// present in each reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScoringConfigFile")]
pub struct ScoringConfig {
    metrics: Vec<MetricConfig>,
}

impl TryFrom<ScoringConfigFile> for ScoringConfig {
    type Error = ScoringConfigError;

    fn try_from(file: ScoringConfigFile) -> Result<Self, Self::Error> {
        ScoringConfig::try_new(file.metrics)
    }
}

impl ScoringConfig {
    pub fn try_new(metrics: Vec<MetricConfig>) -> Result<Self, ScoringConfigError> {
        if metrics.is_empty() {
            return Err(ScoringConfigError::Empty);
        }
        let mut names = HashSet::new();
        for metric in &metrics {
            metric.validate()?;
            if !names.insert(metric.name.as_str()) {
                return Err(ScoringConfigError::DuplicateMetric(metric.name.clone()));
            }
        }
        Ok(Self { metrics })
    }

    /// Indoor living-condition table: temperature, humidity, air quality and sound level.
    pub fn living_conditions() -> Self {
        let metric = |name: &str,
                      weight: f64,
                      polarity: Polarity,
                      optimal: (f64, f64),
                      acceptable: (f64, f64),
                      unit: &str,
                      decay_constant: f64| MetricConfig {
            name: name.to_string(),
            weight,
            polarity,
            optimal_range: ValueRange::new(optimal.0, optimal.1),
            acceptable_range: ValueRange::new(acceptable.0, acceptable.1),
            unit: unit.to_string(),
            decay_constant,
        };
        Self {
            metrics: vec![
                metric(
                    "temperature",
                    0.25,
                    Polarity::RangeOptimal,
                    (20.0, 26.0),
                    (18.0, 30.0),
                    "°C",
                    100.0,
                ),
                metric(
                    "humidity",
                    0.25,
                    Polarity::RangeOptimal,
                    (40.0, 60.0),
                    (30.0, 70.0),
                    "%",
                    100.0,
                ),
                metric(
                    "airQuality_ppm",
                    0.3,
                    Polarity::LowerIsBetter,
                    (0.0, 400.0),
                    (0.0, 1000.0),
                    "PPM",
                    1000.0,
                ),
                metric(
                    "soundLevel",
                    0.2,
                    Polarity::LowerIsBetter,
                    (0.0, 0.3),
                    (0.0, 0.7),
                    "Level",
                    100.0,
                ),
            ],
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ScoringConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScoringConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&content)
    }

    pub fn metrics(&self) -> &[MetricConfig] {
        &self.metrics
    }

    pub fn get(&self, name: &str) -> Option<&MetricConfig> {
        self.metrics.iter().find(|metric| metric.name == name)
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|metric| metric.name.as_str())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::living_conditions()
    }
}
