//! Tidy CSV Output
//!
//! One row per present sample: `account_id,county,timestamp,avg_mvl_metric`.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::app::fleet::windows::to_iso;
use crate::app::fleet::FleetResult;

pub const TIDY_HEADER: [&str; 4] = ["account_id", "county", "timestamp", "avg_mvl_metric"];

/// A serialized tidy row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TidyRow {
    pub account_id: String,
    pub county: String,
    pub timestamp: String,
    pub avg_mvl_metric: String,
}

/// A tidy row read back for plotting
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TidyRecord {
    pub account_id: String,
    pub county: String,
    pub timestamp: String,
    pub avg_mvl_metric: f64,
}

/// Flatten a fleet result into sorted tidy rows
pub fn tidy_rows(result: &FleetResult) -> Vec<TidyRow> {
    result
        .samples()
        .into_iter()
        .map(|sample| TidyRow {
            account_id: sample.account_id,
            county: sample.category,
            timestamp: to_iso(sample.window_end),
            avg_mvl_metric: format!("{:.4}", sample.value),
        })
        .collect()
}

/// Write the header and every row to `writer`; returns the number of data rows
pub fn write_tidy_csv<W: Write>(writer: W, result: &FleetResult) -> Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    // Written explicitly so an empty result still gets a header
    csv_writer.write_record(TIDY_HEADER)?;

    let rows = tidy_rows(result);
    for row in &rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;

    Ok(rows.len())
}

/// Write the tidy CSV to `path`
pub fn write_tidy_file(path: &Path, result: &FleetResult) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let rows = write_tidy_csv(file, result)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Results saved to {} ({} rows)", path.display(), rows);
    Ok(rows)
}

/// Read a tidy CSV back
pub fn read_tidy_file(path: &Path) -> Result<Vec<TidyRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record.with_context(|| format!("Malformed row in {}", path.display()))?);
    }
    Ok(records)
}
