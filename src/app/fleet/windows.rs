use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// A fixed-length query interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Position counted back from `now`; 0 is the most recent window
    pub offset: usize,
}

impl TimeWindow {
    /// Window end as UTC ISO-8601 with a `Z` suffix
    pub fn end_iso(&self) -> String {
        to_iso(self.end)
    }
}

/// Number of whole windows of `granularity_minutes` that fit in `lookback_hours`
pub fn window_count(lookback_hours: u32, granularity_minutes: u32) -> usize {
    if granularity_minutes == 0 {
        return 0;
    }
    let granularity_seconds = u64::from(granularity_minutes) * 60;
    (u64::from(lookback_hours) * 3600 / granularity_seconds) as usize
}

/// Partition the lookback interval ending at `now` into contiguous windows,
/// most recent first.
///
/// Fails when the oldest window would start outside the representable time range.
pub fn plan_windows(
    now: DateTime<Utc>,
    lookback_hours: u32,
    granularity_minutes: u32,
) -> Result<Vec<TimeWindow>> {
    let count = window_count(lookback_hours, granularity_minutes);
    let step_seconds = i64::from(granularity_minutes) * 60;

    let out_of_range = || {
        anyhow!(
            "Lookback of {} hours in {} minute windows is outside the supported time range",
            lookback_hours,
            granularity_minutes
        )
    };
    let span_seconds = i64::try_from(count)
        .ok()
        .and_then(|count| step_seconds.checked_mul(count))
        .ok_or_else(out_of_range)?;
    let span = Duration::try_seconds(span_seconds).ok_or_else(out_of_range)?;
    now.checked_sub_signed(span).ok_or_else(out_of_range)?;

    // Every boundary lies between the oldest start and `now`
    let windows = (0..count)
        .map(|offset| {
            let end = now - Duration::seconds(step_seconds * offset as i64);
            TimeWindow {
                start: end - Duration::seconds(step_seconds),
                end,
                offset,
            }
        })
        .collect();
    Ok(windows)
}

/// Render an instant as UTC ISO-8601 with a literal `Z`
pub fn to_iso(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}
