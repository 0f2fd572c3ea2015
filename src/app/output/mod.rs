//! Run Artifacts
//!
//! The tidy CSV and the chart rendered from it, both named after the run timestamp.

#![warn(clippy::all, rust_2018_idioms)]

pub mod chart;
pub mod tidy;

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub use chart::render_chart;
pub use tidy::{read_tidy_file, tidy_rows, write_tidy_csv, write_tidy_file, TidyRecord, TidyRow};

/// File paths for one run's outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArtifacts {
    pub csv_path: PathBuf,
    pub chart_path: PathBuf,
}

impl RunArtifacts {
    /// `metrics_<YYYYmmdd_HHMMSS>.{csv,svg}` inside `output_dir`
    pub fn new(output_dir: &Path, run_time: DateTime<Utc>) -> Self {
        let stem = format!("metrics_{}", run_time.format("%Y%m%d_%H%M%S"));
        Self {
            csv_path: output_dir.join(format!("{stem}.csv")),
            chart_path: output_dir.join(format!("{stem}.svg")),
        }
    }
}
