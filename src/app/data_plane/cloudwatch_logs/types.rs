//! CloudWatch Logs Insights Data Types
//!
//! Data structures for Insights queries, their lifecycle, and their results.

#![warn(clippy::all, rust_2018_idioms)]

use std::collections::HashMap;
use std::time::Duration;

use crate::app::settings::CollectorConfig;

/// Parameters for a single StartQuery call
#[derive(Debug, Clone, PartialEq)]
pub struct StartQueryRequest {
    /// Log group to query
    pub log_group_name: String,
    /// Start time (Unix timestamp in seconds, inclusive)
    pub start_time: i64,
    /// End time (Unix timestamp in seconds)
    pub end_time: i64,
    /// Logs Insights query string
    pub query_string: String,
    /// Maximum number of result rows
    pub limit: i32,
}

/// How window queries are issued and how their rows are read
#[derive(Debug, Clone)]
pub struct WindowQuery {
    pub query_string: String,
    pub limit: i32,
    pub poll_interval: Duration,
    pub category_field: String,
    pub value_field: String,
}

impl WindowQuery {
    pub fn from_config(config: &CollectorConfig) -> Self {
        Self {
            query_string: config.query.clone(),
            limit: config.query_limit,
            poll_interval: config.poll_interval(),
            category_field: config.category_field.clone(),
            value_field: config.value_field.clone(),
        }
    }
}

impl Default for WindowQuery {
    fn default() -> Self {
        Self::from_config(&CollectorConfig::default())
    }
}

/// Lifecycle of an Insights query job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    /// Accepted by StartQuery, not yet executing
    Submitted,
    /// Executing on the service
    Running,
    /// Finished; results are complete
    Succeeded,
    /// Failed or timed out on the service side
    Failed,
    /// Cancelled before completion
    Cancelled,
}

impl QueryState {
    /// Map a GetQueryResults status string onto the query lifecycle
    pub fn from_service_status(status: &str) -> Self {
        match status {
            "Scheduled" => QueryState::Submitted,
            "Running" => QueryState::Running,
            "Complete" => QueryState::Succeeded,
            "Cancelled" => QueryState::Cancelled,
            // Timeout and Unknown never recover; treat anything unrecognised the same way
            _ => QueryState::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryState::Succeeded | QueryState::Failed | QueryState::Cancelled
        )
    }

    /// Apply an observed status. Terminal states are absorbing.
    pub fn advance(self, observed: QueryState) -> QueryState {
        if self.is_terminal() {
            self
        } else {
            observed
        }
    }
}

/// One result row: field name to string value
pub type ResultRow = HashMap<String, String>;

/// Response of a single GetQueryResults call
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResultsPage {
    pub state: QueryState,
    pub rows: Vec<ResultRow>,
}

impl QueryResultsPage {
    pub fn new(state: QueryState, rows: Vec<ResultRow>) -> Self {
        Self { state, rows }
    }

    pub fn pending() -> Self {
        Self::new(QueryState::Running, Vec::new())
    }
}

/// One aggregated value from a window query
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryValue {
    pub category: String,
    pub value: f64,
}
