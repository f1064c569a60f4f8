use super::reading::Reading;
use serde::Serialize;

/// Readings ordered by ascending timestamp. Duplicate timestamps are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Series {
    readings: Vec<Reading>,
}

impl Series {
    /// Sorts the readings by timestamp. Equal timestamps keep no particular order.
    pub fn from_unsorted(mut readings: Vec<Reading>) -> Self {
        readings.sort_unstable_by_key(Reading::timestamp);
        Self { readings }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn into_readings(self) -> Vec<Reading> {
        self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reading> {
        self.readings.iter()
    }

    /// Valid values of a metric, in chronological order.
    pub fn values<'a>(&'a self, metric: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.readings.iter().filter_map(move |reading| reading.value(metric))
    }

    /// Readings with `start <= timestamp < end`.
    pub fn between(&self, start: i64, end: i64) -> Series {
        Series {
            readings: self
                .readings
                .iter()
                .filter(|reading| (start..end).contains(&reading.timestamp()))
                .cloned()
                .collect(),
        }
    }

    /// Applies `f` to every reading without changing timestamps.
    pub fn map_readings(self, f: impl FnMut(Reading) -> Reading) -> Series {
        Series::from_unsorted(self.readings.into_iter().map(f).collect())
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Reading;
    type IntoIter = std::slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}
