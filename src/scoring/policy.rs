use crate::datamodel::{MetricConfig, Polarity, Zone};

pub const MAX_SCORE: f64 = 10.0;
pub const MIN_SCORE: f64 = 0.0;
/// Sub-score exactly at the edge of the acceptable range.
pub const ACCEPTABLE_EDGE_SCORE: f64 = 5.0;

/// Zone-based sub-score of one metric value, in `[0, 10]`.
///
/// - inside the optimal range: 10
/// - inside the acceptable range: linear from 10 at the optimal edge to 5 at
///   the acceptable edge, on the side the value lies
/// - past the acceptable range: `5 * exp(-distance / decay_constant)`
///
/// A zero-width margin between optimal and acceptable scores exactly 5.
/// Non-finite values score 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringPolicy;

impl ScoringPolicy {
    pub fn score(value: f64, config: &MetricConfig) -> f64 {
        if !value.is_finite() {
            return MIN_SCORE;
        }
        let score = match config.zone(value) {
            Zone::Optimal => MAX_SCORE,
            Zone::Acceptable => interpolate(value, config),
            Zone::Outside => decay(value, config),
        };
        if score.is_nan() {
            MIN_SCORE
        } else {
            score.clamp(MIN_SCORE, MAX_SCORE)
        }
    }
}

fn interpolate(value: f64, config: &MetricConfig) -> f64 {
    let optimal = &config.optimal_range;
    let acceptable = &config.acceptable_range;
    let (distance, margin) = match config.polarity {
        Polarity::RangeOptimal if value < optimal.min => {
            (optimal.min - value, optimal.min - acceptable.min)
        }
        Polarity::RangeOptimal | Polarity::LowerIsBetter => {
            (value - optimal.max, acceptable.max - optimal.max)
        }
    };
    if margin <= 0.0 {
        return ACCEPTABLE_EDGE_SCORE;
    }
    MAX_SCORE - (MAX_SCORE - ACCEPTABLE_EDGE_SCORE) * (distance / margin)
}

fn decay(value: f64, config: &MetricConfig) -> f64 {
    let acceptable = &config.acceptable_range;
    let distance = match config.polarity {
        Polarity::RangeOptimal if value < acceptable.min => acceptable.min - value,
        Polarity::RangeOptimal | Polarity::LowerIsBetter => value - acceptable.max,
    };
    let score = ACCEPTABLE_EDGE_SCORE * (-distance.max(0.0) / config.decay_constant).exp();
    score.min(ACCEPTABLE_EDGE_SCORE)
}
