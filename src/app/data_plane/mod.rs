//! Data Plane Services Module
//!
//! AWS data plane integrations: services that query data inside AWS resources, as
//! opposed to control plane lookups such as stack discovery.
//!
//! ## Available Services
//!
//! - **CloudWatch Logs Insights**: windowed aggregation queries over a log group

pub mod cloudwatch_logs;

pub use cloudwatch_logs::{
    CloudWatchLogsClient, InsightsApi, QueryState as CloudWatchLogsQueryState,
    WindowQuery as CloudWatchLogsWindowQuery,
};
