use crate::datamodel::envscore_datetime::local_hour;
use crate::datamodel::reading::coerce_number;
use crate::datamodel::Series;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Averages of one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyAggregate {
    /// `HH:00` on the local wall clock.
    pub hour: String,
    /// Per-metric averages, `score` included, absent when no reading of the
    /// hour had the metric.
    pub averages: BTreeMap<String, f64>,
    pub reading_count: u64,
}

impl HourlyAggregate {
    fn new(hour: u8, averages: BTreeMap<String, f64>, reading_count: u64) -> Self {
        Self {
            hour: format!("{:02}:00", hour),
            averages,
            reading_count,
        }
    }

    pub fn average(&self, metric: &str) -> Option<f64> {
        self.averages.get(metric).copied()
    }
}

#[derive(Default)]
struct HourAccumulator {
    sums: BTreeMap<String, (f64, u64)>,
    readings: u64,
}

/// Groups one calendar day of readings by hour of day.
#[derive(Debug, Clone)]
pub struct HourlyAggregator {
    metrics: Vec<String>,
    utc_offset_minutes: i32,
}

impl HourlyAggregator {
    pub fn new(metrics: impl IntoIterator<Item = impl Into<String>>, utc_offset_minutes: i32) -> Self {
        Self {
            metrics: metrics.into_iter().map(Into::into).collect(),
            utc_offset_minutes,
        }
    }

    /// One entry per hour holding at least one reading, sorted by hour.
    ///
    /// The series is expected to cover a single day: readings of other days
    /// fall into the same hour slots.
    pub fn aggregate(&self, series: &Series) -> Vec<HourlyAggregate> {
        let mut hours: BTreeMap<u8, HourAccumulator> = BTreeMap::new();

        for reading in series {
            let hour = local_hour(reading.timestamp(), self.utc_offset_minutes);
            let accumulator = hours.entry(hour).or_default();
            accumulator.readings += 1;
            for metric in &self.metrics {
                if let Some(value) = reading.value(metric) {
                    let (sum, count) = accumulator.sums.entry(metric.clone()).or_default();
                    *sum += value;
                    *count += 1;
                }
            }
        }

        hours
            .into_iter()
            .map(|(hour, accumulator)| {
                let averages = accumulator
                    .sums
                    .into_iter()
                    .map(|(metric, (sum, count))| (metric, sum / count as f64))
                    .collect();
                HourlyAggregate::new(hour, averages, accumulator.readings)
            })
            .collect()
    }

    /// Parses per-hour aggregate records keyed by hour of day (`"0"`..`"23"`).
    ///
    /// Each record carries `avg<Metric>` fields and a `readings` count.
    /// Keys that are not an hour and entries that are not records are skipped.
    pub fn parse_precomputed(&self, records: &BTreeMap<String, Value>) -> Vec<HourlyAggregate> {
        let mut aggregates: Vec<(u8, HourlyAggregate)> = records
            .iter()
            .filter_map(|(key, raw)| {
                let Some(hour) = key.trim().parse::<u8>().ok().filter(|hour| *hour < 24) else {
                    tracing::debug!(key = %key, "Skipping hourly record with an invalid hour");
                    return None;
                };
                let Some(record) = raw.as_object() else {
                    tracing::debug!(key = %key, "Skipping hourly entry that is not a record");
                    return None;
                };

                let mut averages = BTreeMap::new();
                for metric in &self.metrics {
                    let value = average_field_names(metric)
                        .iter()
                        .find_map(|field| record.get(field).and_then(coerce_number));
                    if let Some(value) = value {
                        averages.insert(metric.clone(), value);
                    }
                }
                let reading_count = record
                    .get("readings")
                    .and_then(coerce_number)
                    .filter(|count| *count >= 0.0)
                    .map(|count| count.trunc() as u64)
                    .unwrap_or(0);

                Some((hour, HourlyAggregate::new(hour, averages, reading_count)))
            })
            .collect();

        if aggregates.is_empty() && !records.is_empty() {
            tracing::warn!("Every hourly record was skipped");
        }
        aggregates.sort_by_key(|(hour, _)| *hour);
        aggregates.into_iter().map(|(_, aggregate)| aggregate).collect()
    }
}

/// `avgAirQuality_ppm` then `avgAirQuality` for `airQuality_ppm`.
fn average_field_names(metric: &str) -> Vec<String> {
    let mut names = vec![average_field_name(metric)];
    if let Some((base, _)) = metric.split_once('_')
        && !base.is_empty()
    {
        names.push(average_field_name(base));
    }
    names
}

fn average_field_name(metric: &str) -> String {
    let mut chars = metric.chars();
    match chars.next() {
        Some(first) => format!("avg{}{}", first.to_uppercase(), chars.as_str()),
        None => "avg".to_string(),
    }
}
