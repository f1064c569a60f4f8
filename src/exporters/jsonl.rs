use crate::datamodel::Series;
use anyhow::Result;

/// Converter for a Series to JSON Lines format
pub struct JsonlConverter;

impl JsonlConverter {
    /// One flat JSON object per reading, in series order.
    pub fn to_jsonl(series: &Series) -> Result<String> {
        let mut jsonl_output = String::new();
        for reading in series {
            jsonl_output.push_str(&serde_json::to_string(reading)?);
            jsonl_output.push('\n');
        }
        Ok(jsonl_output)
    }
}
