use crate::datamodel::envscore_datetime::local_time_label;
use crate::datamodel::{CalendarDate, SCORE_FIELD, Series, TIMESTAMP_FIELD};

/// Wraps a string-typed field in double quotes, doubling internal quotes.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn number(value: Option<f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

/// Converter for a Series to CSV format
pub struct CsvConverter;

impl CsvConverter {
    /// One line per reading: `timestamp,date,time,<metrics...>,score`.
    ///
    /// `date` and `time` are local wall-clock strings and are quoted, absent
    /// values are left empty. An empty series exports as an empty string.
    ///
    /// The column set is fixed by the metric list rather than taken from the
    /// fields of the first record, so every row has the same columns even
    /// when the first reading lacks some metrics.
    pub fn to_csv(series: &Series, metrics: &[&str], utc_offset_minutes: i32) -> String {
        if series.is_empty() {
            return String::new();
        }

        let mut csv_output = String::new();
        let mut header = vec![TIMESTAMP_FIELD, "date", "time"];
        header.extend(metrics.iter().copied().filter(|metric| *metric != SCORE_FIELD));
        header.push(SCORE_FIELD);
        csv_output.push_str(&header.join(","));
        csv_output.push('\n');

        for reading in series {
            let timestamp = reading.timestamp();
            let mut fields = vec![
                timestamp.to_string(),
                quote(&CalendarDate::containing(timestamp, utc_offset_minutes).to_string()),
                quote(&local_time_label(timestamp, utc_offset_minutes)),
            ];
            fields.extend(
                header[3..]
                    .iter()
                    .map(|metric| number(reading.value(metric))),
            );
            csv_output.push_str(&fields.join(","));
            csv_output.push('\n');
        }

        csv_output
    }
}
