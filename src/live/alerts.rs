use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};

pub const POOR_SCORE_THRESHOLD: f64 = 4.0;
pub const EXCELLENT_SCORE_THRESHOLD: f64 = 8.0;
pub const POOR_ALERT_INTERVAL_MS: i64 = 60_000;
pub const EXCELLENT_ALERT_INTERVAL_MS: i64 = 300_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionAlert {
    Poor,
    Excellent,
}

impl ConditionAlert {
    pub fn message(&self) -> &'static str {
        match self {
            ConditionAlert::Poor => "Living conditions are poor! Check your environment.",
            ConditionAlert::Excellent => "Excellent living conditions!",
        }
    }
}

/// Rate-limited alerts on the live composite score.
///
/// Both kinds share one last-alert instant: a poor alert also delays the
/// next excellent one and the other way round.
#[derive(Debug, Default)]
pub struct ConditionAlerter {
    last_alert_ms: AtomicI64,
}

impl ConditionAlerter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, score: f64, now_ms: i64) -> Option<ConditionAlert> {
        let last = self.last_alert_ms.load(Ordering::Acquire);
        let elapsed = now_ms.saturating_sub(last);

        let alert = if score < POOR_SCORE_THRESHOLD && elapsed > POOR_ALERT_INTERVAL_MS {
            ConditionAlert::Poor
        } else if score >= EXCELLENT_SCORE_THRESHOLD && elapsed > EXCELLENT_ALERT_INTERVAL_MS {
            ConditionAlert::Excellent
        } else {
            return None;
        };

        // Another reading raised an alert in the meantime
        self.last_alert_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        match alert {
            ConditionAlert::Poor => tracing::warn!(score, "{}", alert.message()),
            ConditionAlert::Excellent => tracing::info!(score, "{}", alert.message()),
        }
        Some(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_first_alerts_fire() {
        assert_eq!(ConditionAlerter::new().check(2.0, NOW), Some(ConditionAlert::Poor));
        assert_eq!(
            ConditionAlerter::new().check(8.0, NOW),
            Some(ConditionAlert::Excellent)
        );
        assert_eq!(ConditionAlerter::new().check(6.0, NOW), None);
    }

    #[test]
    fn test_poor_alerts_are_rate_limited() {
        let alerter = ConditionAlerter::new();
        assert!(alerter.check(3.9, NOW).is_some());
        assert!(alerter.check(3.0, NOW + 30_000).is_none());
        assert!(alerter.check(3.0, NOW + 60_000).is_none());
        assert_eq!(alerter.check(3.0, NOW + 60_001), Some(ConditionAlert::Poor));
    }

    #[test]
    fn test_alert_kinds_share_the_interval() {
        let alerter = ConditionAlerter::new();
        assert_eq!(alerter.check(1.0, NOW), Some(ConditionAlert::Poor));
        // Excellent needs five minutes since the last alert of any kind
        assert!(alerter.check(9.0, NOW + 120_000).is_none());
        assert_eq!(
            alerter.check(9.0, NOW + 300_001),
            Some(ConditionAlert::Excellent)
        );
        // Poor only waits one minute
        assert_eq!(
            alerter.check(1.0, NOW + 370_000),
            Some(ConditionAlert::Poor)
        );
    }
}
