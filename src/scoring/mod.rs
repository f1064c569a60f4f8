pub mod composer;
pub mod policy;
pub mod rating;

pub use composer::{ScoreBreakdown, ScoreComposer};
pub use policy::ScoringPolicy;
pub use rating::{MetricStatus, ScoreRating};

/// Rounds half away from zero to one decimal.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_tenth() {
        assert_eq!(round_to_tenth(8.64), 8.6);
        assert_eq!(round_to_tenth(8.66), 8.7);
        assert_eq!(round_to_tenth(4.96), 5.0);
        assert_eq!(round_to_tenth(0.0), 0.0);
    }
}
