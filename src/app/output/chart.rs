//! Time-series chart of the tidy CSV: one line per (account, county).

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use super::tidy::read_tidy_file;

const CHART_SIZE: (u32, u32) = (1600, 800);
const CHART_TITLE: &str = "MVL Completeness Metrics Over Time (by Account + County)";

type Series = BTreeMap<String, Vec<(DateTime<Utc>, f64)>>;

/// Group tidy rows into sorted series keyed by "account - county".
///
/// Non-finite values cannot be placed on an axis and are dropped.
pub fn load_series(csv_path: &Path) -> Result<Series> {
    let mut series = Series::new();

    for record in read_tidy_file(csv_path)? {
        let timestamp = DateTime::parse_from_rfc3339(&record.timestamp)
            .with_context(|| format!("Invalid timestamp '{}'", record.timestamp))?
            .with_timezone(&Utc);
        if !record.avg_mvl_metric.is_finite() {
            warn!(
                "Skipping non-finite value {} for {} - {} at {}",
                record.avg_mvl_metric, record.account_id, record.county, record.timestamp
            );
            continue;
        }
        series
            .entry(format!("{} - {}", record.account_id, record.county))
            .or_default()
            .push((timestamp, record.avg_mvl_metric));
    }

    for points in series.values_mut() {
        points.sort_by_key(|(timestamp, _)| *timestamp);
    }
    Ok(series)
}

/// Render the tidy CSV at `csv_path` as an SVG chart at `output_path`
pub fn render_chart(csv_path: &Path, output_path: &Path) -> Result<()> {
    let series = load_series(csv_path)?;
    if series.is_empty() {
        bail!("{} contains no metric rows to plot", csv_path.display());
    }

    let mut points = series.values().flatten().copied();
    let (mut first, start_value) = points
        .next()
        .ok_or_else(|| anyhow!("{} contains no metric rows to plot", csv_path.display()))?;
    let (mut last, mut low, mut high) = (first, start_value, start_value);
    for (timestamp, value) in points {
        first = first.min(timestamp);
        last = last.max(timestamp);
        low = low.min(value);
        high = high.max(value);
    }
    if first == last {
        first -= Duration::minutes(30);
        last += Duration::minutes(30);
    }
    let padding = ((high - low) * 0.05).max(0.01);

    let root = SVGBackend::new(output_path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(CHART_TITLE, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(first..last, (low - padding)..(high + padding))?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Avg MVL Metric")
        .x_label_formatter(&|timestamp| timestamp.format("%H:%M").to_string())
        .draw()?;

    for (index, (label, points)) in series.iter().enumerate() {
        let color = Palette99::pick(index).mix(0.8);
        chart
            .draw_series(
                LineSeries::new(points.iter().copied(), color.stroke_width(2)).point_size(3),
            )?
            .label(label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()
        .map_err(|e| anyhow!("Failed to write {}: {}", output_path.display(), e))?;

    info!(
        "Visualization saved to {} ({} series)",
        output_path.display(),
        series.len()
    );
    Ok(())
}
