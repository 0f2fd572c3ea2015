//! CloudWatch Logs Insights Client Wrapper
//!
//! Provides the two Insights calls the collector needs behind a small trait so the
//! query executor can run against the SDK or an in-memory fake.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs as cloudwatchlogs;

use super::types::{QueryResultsPage, QueryState, ResultRow, StartQueryRequest};

/// The Logs Insights operations used by the window executor
#[async_trait]
pub trait InsightsApi: Send + Sync {
    /// Submit a query and return its id
    async fn start_query(&self, request: &StartQueryRequest) -> Result<String>;

    /// Fetch the current status and any available rows of a query
    async fn query_results(&self, query_id: &str) -> Result<QueryResultsPage>;
}

/// CloudWatch Logs client wrapper
#[derive(Clone)]
pub struct CloudWatchLogsClient {
    client: cloudwatchlogs::Client,
}

impl CloudWatchLogsClient {
    /// Create a new client from an account-scoped SDK config
    pub fn new(aws_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: cloudwatchlogs::Client::new(aws_config),
        }
    }
}

#[async_trait]
impl InsightsApi for CloudWatchLogsClient {
    async fn start_query(&self, request: &StartQueryRequest) -> Result<String> {
        let response = self
            .client
            .start_query()
            .log_group_name(&request.log_group_name)
            .start_time(request.start_time)
            .end_time(request.end_time)
            .query_string(&request.query_string)
            .limit(request.limit)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to start query for log group: {}",
                    request.log_group_name
                )
            })?;

        response
            .query_id()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("StartQuery returned no query id"))
    }

    async fn query_results(&self, query_id: &str) -> Result<QueryResultsPage> {
        let response = self
            .client
            .get_query_results()
            .query_id(query_id)
            .send()
            .await
            .with_context(|| format!("Failed to get results for query {}", query_id))?;

        let state = response
            .status()
            .map(|status| QueryState::from_service_status(status.as_str()))
            // No status yet means the query has not been picked up
            .unwrap_or(QueryState::Submitted);

        let rows = response
            .results()
            .iter()
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|field| match (field.field(), field.value()) {
                        (Some(name), Some(value)) => Some((name.to_string(), value.to_string())),
                        _ => None,
                    })
                    .collect::<ResultRow>()
            })
            .collect();

        Ok(QueryResultsPage::new(state, rows))
    }
}
