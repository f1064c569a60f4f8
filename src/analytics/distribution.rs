use crate::datamodel::Series;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("A distribution layout needs at least one bin")]
    Empty,
    #[error("Bin '{0}' has a lower bound that is not a number")]
    NotANumber(String),
    #[error("Bin '{label}' does not start above the previous bin")]
    NotIncreasing { label: String },
}

/// Ordered, gapless bins: each bin runs from its lower bound up to the
/// next bin's lower bound, the last one is unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionLayout {
    bins: Vec<(String, f64)>,
}

impl DistributionLayout {
    /// Bins given as `(label, inclusive lower bound)`, in increasing order.
    /// The first bound may be `f64::NEG_INFINITY`.
    pub fn new(bins: Vec<(String, f64)>) -> Result<Self, LayoutError> {
        if bins.is_empty() {
            return Err(LayoutError::Empty);
        }
        for (index, (label, lower)) in bins.iter().enumerate() {
            if lower.is_nan() {
                return Err(LayoutError::NotANumber(label.clone()));
            }
            if index > 0 && *lower <= bins[index - 1].1 {
                return Err(LayoutError::NotIncreasing {
                    label: label.clone(),
                });
            }
        }
        Ok(Self { bins })
    }

    pub fn temperature_bands() -> Self {
        Self::fixed(&[
            ("< 15°C", f64::NEG_INFINITY),
            ("15-20°C", 15.0),
            ("20-25°C", 20.0),
            ("25-30°C", 25.0),
            ("> 30°C", 30.0),
        ])
    }

    pub fn score_bands() -> Self {
        Self::fixed(&[
            ("< 2", f64::NEG_INFINITY),
            ("2-4", 2.0),
            ("4-6", 4.0),
            ("6-8", 6.0),
            ("8-10", 8.0),
        ])
    }

    fn fixed(bins: &[(&str, f64)]) -> Self {
        Self {
            bins: bins
                .iter()
                .map(|(label, lower)| (label.to_string(), *lower))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    fn upper_bound(&self, index: usize) -> Option<f64> {
        self.bins.get(index + 1).map(|(_, lower)| *lower)
    }

    /// Index of the first bin containing `value`, `None` below the first bound.
    fn locate(&self, value: f64) -> Option<usize> {
        (0..self.bins.len()).find(|&index| {
            let lower = self.bins[index].1;
            value >= lower && self.upper_bound(index).is_none_or(|upper| value < upper)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionBin {
    pub range_label: String,
    /// Inclusive, `None` for an open first bin.
    pub lower_bound: Option<f64>,
    /// Exclusive, `None` for the last bin.
    pub upper_bound: Option<f64>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Distribution {
    NoData,
    Binned {
        bins: Vec<DistributionBin>,
        /// Values below the first lower bound.
        unbinned: u64,
    },
}

impl Distribution {
    pub fn total(&self) -> u64 {
        match self {
            Distribution::NoData => 0,
            Distribution::Binned { bins, unbinned } => {
                bins.iter().map(|bin| bin.count).sum::<u64>() + unbinned
            }
        }
    }
}

pub struct DistributionBinner;

impl DistributionBinner {
    pub fn bin(series: &Series, metric: &str, layout: &DistributionLayout) -> Distribution {
        let mut counts = vec![0u64; layout.len()];
        let mut unbinned = 0u64;
        let mut seen = 0usize;

        for value in series.values(metric) {
            seen += 1;
            match layout.locate(value) {
                Some(index) => counts[index] += 1,
                None => unbinned += 1,
            }
        }

        if seen == 0 {
            return Distribution::NoData;
        }

        let bins = layout
            .bins
            .iter()
            .zip(counts)
            .enumerate()
            .map(|(index, ((label, lower), count))| DistributionBin {
                range_label: label.clone(),
                lower_bound: lower.is_finite().then_some(*lower),
                upper_bound: layout.upper_bound(index),
                count,
            })
            .collect();

        Distribution::Binned { bins, unbinned }
    }
}
