//! Core modules for the fleet metrics collector.
//!
//! # Module Organization
//!
//! ## Configuration
//! - [`accounts`] - Account registry loaded from YAML
//! - [`settings`] - Collector settings (region, stack, query, worker pool)
//!
//! ## AWS Integration
//! - [`credentials`] - Account-scoped SDK configuration from static keys
//! - [`cloudformation`] - Stack output lookup used to discover each account's log group
//! - [`data_plane`] - CloudWatch Logs Insights window queries
//!
//! ## Collection and Output
//! - [`fleet`] - Window planning and the bounded multi-account collector
//! - [`output`] - Tidy CSV writer and chart renderer
//!
//! # Architecture
//!
//! - [`accounts`] and [`settings`] are loaded once at startup
//! - [`fleet::FleetCollector`] opens a session per account, resolves its log group via
//!   [`cloudformation`] and runs one [`data_plane`] query per window
//! - [`output`] consumes the merged [`fleet::FleetResult`]

pub mod accounts;
pub mod cloudformation;
pub mod credentials;
pub mod data_plane;
pub mod fleet;
pub mod output;
pub mod settings;

pub use accounts::{load_accounts, AccountCredential, ConfigError};
pub use fleet::{FleetCollector, FleetResult};
pub use settings::CollectorConfig;
