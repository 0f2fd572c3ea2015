use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::warn;

use super::windows::TimeWindow;

/// category -> one optional value per window offset
pub type CategorySeries = BTreeMap<String, Vec<Option<f64>>>;

/// Values collected for one account, owned by the task that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct AccountResult {
    pub account_id: String,
    num_windows: usize,
    pub series: CategorySeries,
}

impl AccountResult {
    pub fn new(account_id: impl Into<String>, num_windows: usize) -> Self {
        Self {
            account_id: account_id.into(),
            num_windows,
            series: CategorySeries::new(),
        }
    }

    /// Store `value` for `category` in the slot for `offset`
    pub fn record(&mut self, offset: usize, category: &str, value: f64) {
        if offset >= self.num_windows {
            warn!(
                "Ignoring value for {} at window offset {} (only {} windows)",
                category, offset, self.num_windows
            );
            return;
        }
        let num_windows = self.num_windows;
        let slots = self
            .series
            .entry(category.to_string())
            .or_insert_with(|| vec![None; num_windows]);
        slots[offset] = Some(value);
    }
}

/// What one account task reported back to the collector
#[derive(Debug, Clone, PartialEq)]
pub enum AccountOutcome {
    /// The log group was found and queried
    Collected(AccountResult),
    /// No log group could be resolved; the account contributes nothing
    Skipped { account_id: String },
}

/// A present value for one account, category and window
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub account_id: String,
    pub category: String,
    pub window_end: DateTime<Utc>,
    pub value: f64,
}

/// Merged output of a collection run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetResult {
    pub windows: Vec<TimeWindow>,
    pub accounts: BTreeMap<String, CategorySeries>,
    pub skipped_accounts: Vec<String>,
    pub failed_accounts: Vec<String>,
}

impl FleetResult {
    pub fn new(windows: Vec<TimeWindow>) -> Self {
        Self {
            windows,
            ..Default::default()
        }
    }

    /// Merge one finished account. A repeated account id replaces the earlier series.
    pub fn merge(&mut self, outcome: AccountOutcome) {
        match outcome {
            AccountOutcome::Collected(result) => {
                if self
                    .accounts
                    .insert(result.account_id.clone(), result.series)
                    .is_some()
                {
                    warn!(
                        "Account {} reported twice; keeping the latest result",
                        result.account_id
                    );
                }
            }
            AccountOutcome::Skipped { account_id } => self.skipped_accounts.push(account_id),
        }
    }

    pub fn record_failure(&mut self, account_id: impl Into<String>) {
        self.failed_accounts.push(account_id.into());
    }

    /// Every present value, sorted by account, category, then window offset
    pub fn samples(&self) -> Vec<MetricSample> {
        let mut samples = Vec::new();
        for (account_id, series) in &self.accounts {
            for (category, slots) in series {
                for (window, slot) in self.windows.iter().zip(slots) {
                    if let Some(value) = slot {
                        samples.push(MetricSample {
                            account_id: account_id.clone(),
                            category: category.clone(),
                            window_end: window.end,
                            value: *value,
                        });
                    }
                }
            }
        }
        samples
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.values().all(|series| {
            series
                .values()
                .all(|slots| slots.iter().all(Option::is_none))
        })
    }
}
