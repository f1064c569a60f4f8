use crate::datamodel::Series;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationPoint {
    pub timestamp: i64,
    pub x: f64,
    pub y: f64,
}

pub struct CorrelationExtractor;

impl CorrelationExtractor {
    /// Pairs of both metrics, in series order, from readings that carry both.
    pub fn extract(series: &Series, x_metric: &str, y_metric: &str) -> Vec<CorrelationPoint> {
        series
            .iter()
            .filter_map(|reading| {
                Some(CorrelationPoint {
                    timestamp: reading.timestamp(),
                    x: reading.value(x_metric)?,
                    y: reading.value(y_metric)?,
                })
            })
            .collect()
    }

    /// Pearson correlation coefficient of the pairs.
    ///
    /// `None` with fewer than two pairs or when either side has no variance.
    pub fn pearson(points: &[CorrelationPoint]) -> Option<f64> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|point| point.x).sum::<f64>() / n;
        let mean_y = points.iter().map(|point| point.y).sum::<f64>() / n;

        let (mut covariance, mut variance_x, mut variance_y) = (0.0, 0.0, 0.0);
        for point in points {
            let dx = point.x - mean_x;
            let dy = point.y - mean_y;
            covariance += dx * dy;
            variance_x += dx * dx;
            variance_y += dy * dy;
        }

        let denominator = (variance_x * variance_y).sqrt();
        if denominator <= f64::EPSILON {
            return None;
        }
        Some((covariance / denominator).clamp(-1.0, 1.0))
    }
}
