//! CloudWatch Logs Insights Integration Module
//!
//! Runs aggregation queries against a log group, one time window at a time.
//!
//! ## Features
//!
//! - StartQuery / GetQueryResults behind the [`InsightsApi`] trait
//! - Explicit query lifecycle ([`QueryState`]) with absorbing terminal states
//! - Row parsing that drops unusable rows instead of failing the window
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fleetmetrics::app::data_plane::cloudwatch_logs::{run_window, CloudWatchLogsClient, WindowQuery};
//! use fleetmetrics::app::fleet::windows::plan_windows;
//!
//! # async fn example(aws_config: aws_config::SdkConfig) -> anyhow::Result<()> {
//! let client = CloudWatchLogsClient::new(&aws_config);
//! let windows = plan_windows(chrono::Utc::now(), 1, 60)?;
//!
//! for value in run_window(&client, "/aws/validator", &windows[0], &WindowQuery::default()).await {
//!     println!("{}: {}", value.category, value.value);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod client;
pub mod query;
pub mod types;

pub use client::{CloudWatchLogsClient, InsightsApi};
pub use query::{parse_row, run_window};
pub use types::{
    CategoryValue, QueryResultsPage, QueryState, ResultRow, StartQueryRequest, WindowQuery,
};
