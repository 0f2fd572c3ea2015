//! Fleet Collection
//!
//! Fans the windowed Insights query out across every configured account and merges
//! the per-account results.
//!
//! Each account runs as its own tokio task and owns the [`AccountResult`] it fills;
//! a semaphore caps how many accounts are in flight. Results are merged into the
//! [`FleetResult`] only after a task finishes, so no state is shared between workers.

#![warn(clippy::all, rust_2018_idioms)]

pub mod collector;
pub mod result;
pub mod session;
pub mod windows;

pub use collector::FleetCollector;
pub use result::{AccountOutcome, AccountResult, CategorySeries, FleetResult, MetricSample};
pub use session::{AccountSession, AccountSessionFactory, AwsSessionFactory};
pub use windows::{plan_windows, window_count, TimeWindow};
