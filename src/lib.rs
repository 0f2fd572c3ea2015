//! fleetmetrics - MVL completeness metrics across a fleet of AWS accounts
//!
//! Every account in the fleet runs the same CloudFormation stack, and its workflow
//! validator logs a `mvl_completeness_metric` message carrying a per-county
//! `global_completeness` value. This crate collects that metric from every account
//! with CloudWatch Logs Insights and writes it out as a tidy time series.
//!
//! # Flow
//!
//! 1. Load the account registry ([`app::accounts`]) and collector settings
//!    ([`app::settings`]).
//! 2. Split the lookback interval into fixed windows ([`app::fleet::windows`]).
//! 3. For each account, on a bounded worker pool ([`app::fleet::FleetCollector`]):
//!    resolve the validator log group from the stack outputs
//!    ([`app::cloudformation`]) and run one Insights query per window
//!    ([`app::data_plane::cloudwatch_logs`]).
//! 4. Write the merged [`app::fleet::FleetResult`] as CSV and render a chart
//!    ([`app::output`]).
//!
//! # Failure Model
//!
//! Only startup problems (missing or malformed accounts file, invalid settings) are
//! fatal. A failing account, window, or chart is logged and treated as missing data.

#![warn(clippy::all, rust_2018_idioms)]

pub mod app;

pub use app::{CollectorConfig, FleetCollector, FleetResult};

/// Build metadata captured by build.rs
pub const GIT_BRANCH: &str = env!("GIT_BRANCH");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");
