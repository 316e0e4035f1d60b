// Emotion dataset loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// One dataset row subject to generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique key; also names the record's artifact directory
    #[serde(rename = "ID")]
    pub id: i64,

    /// Stimulus text shown to the model
    pub text: String,

    /// Category of the stimulus
    #[serde(rename = "Domain")]
    pub domain: String,
}

/// Load every record from a CSV file, preserving row order.
///
/// Columns other than `ID`, `text` and `Domain` are ignored.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open emotion dataset: {}", path.display()))?;
    let records = collect_records(reader)
        .with_context(|| format!("Failed to parse emotion dataset: {}", path.display()))?;

    tracing::info!("Selected data points length: {}", records.len());
    Ok(records)
}

/// Load records from any CSV source (headers required)
pub fn read_records<R: Read>(source: R) -> Result<Vec<Record>> {
    collect_records(csv::Reader::from_reader(source))
}

fn collect_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Record>> {
    reader
        .deserialize::<Record>()
        .enumerate()
        .map(|(row, result)| result.with_context(|| format!("Invalid record at row {}", row + 1)))
        .collect()
}
