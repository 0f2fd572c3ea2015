//! Windowed Insights Query Executor
//!
//! Runs the aggregation query over one time window and turns the result rows into
//! category values. Every failure degrades to "no data for this window".

#![warn(clippy::all, rust_2018_idioms)]

use tracing::{debug, warn};

use crate::app::fleet::windows::TimeWindow;

use super::client::InsightsApi;
use super::types::{CategoryValue, QueryState, ResultRow, StartQueryRequest, WindowQuery};

/// Run `query` over `window` against `log_group_name` and collect its values
pub async fn run_window(
    logs: &dyn InsightsApi,
    log_group_name: &str,
    window: &TimeWindow,
    query: &WindowQuery,
) -> Vec<CategoryValue> {
    let request = StartQueryRequest {
        log_group_name: log_group_name.to_string(),
        start_time: window.start.timestamp(),
        end_time: window.end.timestamp(),
        query_string: query.query_string.clone(),
        limit: query.limit,
    };

    let query_id = match logs.start_query(&request).await {
        Ok(query_id) => query_id,
        Err(e) => {
            warn!("Failed to start query for {}: {:#}", log_group_name, e);
            return Vec::new();
        }
    };

    let mut state = QueryState::Submitted;
    let mut polls = 0u32;
    loop {
        let page = match logs.query_results(&query_id).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to poll query {}: {:#}", query_id, e);
                return Vec::new();
            }
        };
        polls += 1;
        state = state.advance(page.state);

        match state {
            QueryState::Succeeded => {
                debug!(
                    "Query {} complete after {} polls with {} rows",
                    query_id,
                    polls,
                    page.rows.len()
                );
                return page
                    .rows
                    .iter()
                    .filter_map(|row| parse_row(row, &query.category_field, &query.value_field))
                    .collect();
            }
            QueryState::Failed | QueryState::Cancelled => {
                warn!("Query {} ended with status {:?}", query_id, state);
                return Vec::new();
            }
            QueryState::Submitted | QueryState::Running => {
                tokio::time::sleep(query.poll_interval).await;
            }
        }
    }
}

/// Extract a category value from one result row, or `None` if the row is unusable
pub fn parse_row(row: &ResultRow, category_field: &str, value_field: &str) -> Option<CategoryValue> {
    let category = row.get(category_field).filter(|c| !c.is_empty())?;
    let raw_value = row.get(value_field)?;

    match raw_value.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(CategoryValue {
            category: category.clone(),
            value,
        }),
        Ok(_) => {
            warn!("Ignoring non-finite {} value '{}'", value_field, raw_value);
            None
        }
        Err(_) => {
            warn!("Could not parse {} value '{}'", value_field, raw_value);
            None
        }
    }
}
