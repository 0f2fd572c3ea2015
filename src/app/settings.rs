//! Collector Settings
//!
//! Everything the collector needs to know about where the metric lives and how hard
//! it may hit the AWS APIs. Values default to the MVL completeness deployment and can
//! be overridden from a TOML file or the command line.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Logs Insights expression averaging the completeness metric per county.
pub const DEFAULT_QUERY: &str = r#"fields
    message.county as county,
    message.global_completeness as completeness,
    message.msg as msg
| filter msg = "mvl_completeness_metric"
| stats avg(completeness) as avg_global_completeness by county"#;

/// Configuration for one collection run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Region used for both CloudFormation and CloudWatch Logs
    pub region: String,
    /// Stack that exports the validator log group
    pub stack_name: String,
    /// Stack output key holding the log group name
    pub log_group_output_key: String,
    /// Number of accounts processed concurrently
    pub max_workers: usize,
    /// Delay between GetQueryResults polls (milliseconds)
    pub poll_interval_ms: u64,
    /// Maximum rows returned by one Insights query
    pub query_limit: i32,
    /// Logs Insights query string
    pub query: String,
    /// Result field used as the category (group-by key)
    pub category_field: String,
    /// Result field holding the aggregated value
    pub value_field: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            stack_name: "elephant-oracle-node".to_string(),
            log_group_output_key: "WorkflowMirrorValidatorLogGroupName".to_string(),
            max_workers: 6,
            poll_interval_ms: 1000,
            query_limit: 10_000,
            query: DEFAULT_QUERY.to_string(),
            category_field: "county".to_string(),
            value_field: "avg_global_completeness".to_string(),
        }
    }
}

impl CollectorConfig {
    /// Load settings from an optional TOML file, falling back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read settings file {}", path.display()))?;
                toml::from_str::<CollectorConfig>(&content)
                    .with_context(|| format!("Failed to parse settings file {}", path.display()))?
            }
            None => CollectorConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the collector cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            bail!("max_workers must be at least 1");
        }
        if self.query_limit <= 0 {
            bail!("query_limit must be positive, got {}", self.query_limit);
        }
        if self.region.trim().is_empty() {
            bail!("region must not be empty");
        }
        Ok(())
    }

    /// Override the region
    pub fn with_region(mut self, region: String) -> Self {
        self.region = region;
        self
    }

    /// Override the stack name
    pub fn with_stack_name(mut self, stack_name: String) -> Self {
        self.stack_name = stack_name;
        self
    }

    /// Override the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Override the worker pool size
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
