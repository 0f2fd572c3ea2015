use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::app::accounts::AccountCredential;
use crate::app::cloudformation::resolve_stack_output;
use crate::app::data_plane::cloudwatch_logs::{run_window, WindowQuery};
use crate::app::settings::CollectorConfig;

use super::result::{AccountOutcome, AccountResult, FleetResult};
use super::session::AccountSessionFactory;
use super::windows::{plan_windows, to_iso, TimeWindow};

/// Runs the window queries for every account on a bounded worker pool
#[derive(Clone)]
pub struct FleetCollector {
    config: Arc<CollectorConfig>,
    sessions: Arc<dyn AccountSessionFactory>,
}

impl FleetCollector {
    pub fn new(config: CollectorConfig, sessions: Arc<dyn AccountSessionFactory>) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
        }
    }

    /// Collect every account over the windows ending at `now`.
    ///
    /// Never fails as a whole: accounts that error or panic are logged and listed in
    /// [`FleetResult::failed_accounts`].
    pub async fn collect(
        &self,
        accounts: &[AccountCredential],
        now: DateTime<Utc>,
        lookback_hours: u32,
        granularity_minutes: u32,
    ) -> FleetResult {
        let windows: Arc<[TimeWindow]> = match plan_windows(now, lookback_hours, granularity_minutes) {
            Ok(windows) => windows.into(),
            Err(e) => {
                error!("Cannot plan collection windows: {:#}", e);
                return FleetResult::new(Vec::new());
            }
        };
        let mut fleet = FleetResult::new(windows.to_vec());

        info!(
            "Collecting {} accounts over {} windows with {} workers",
            accounts.len(),
            windows.len(),
            self.config.max_workers
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let query = Arc::new(WindowQuery::from_config(&self.config));

        let mut tasks: FuturesUnordered<_> = accounts
            .iter()
            .cloned()
            .map(|account| {
                let account_id = account.account_id.clone();
                let semaphore = semaphore.clone();
                let config = self.config.clone();
                let sessions = self.sessions.clone();
                let windows = windows.clone();
                let query = query.clone();

                let handle = tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .context("Worker pool closed")?;
                    process_account(&config, sessions.as_ref(), &account, &windows, &query).await
                });

                async move { (account_id, handle.await) }
            })
            .collect();

        while let Some((account_id, joined)) = tasks.next().await {
            match joined {
                Ok(Ok(outcome)) => fleet.merge(outcome),
                Ok(Err(e)) => {
                    error!("Account {} failed: {:#}", account_id, e);
                    fleet.record_failure(account_id);
                }
                Err(join_error) => {
                    error!("Account {} task aborted: {}", account_id, join_error);
                    fleet.record_failure(account_id);
                }
            }
        }

        info!(
            "Collection finished: {} accounts with data, {} skipped, {} failed",
            fleet.accounts.len(),
            fleet.skipped_accounts.len(),
            fleet.failed_accounts.len()
        );
        fleet
    }
}

/// Resolve one account's log group and query every window, serially
async fn process_account(
    config: &CollectorConfig,
    sessions: &dyn AccountSessionFactory,
    account: &AccountCredential,
    windows: &[TimeWindow],
    query: &WindowQuery,
) -> Result<AccountOutcome> {
    let account_id = &account.account_id;
    info!("=== Processing account {} ===", account_id);

    let session = sessions
        .open(account, &config.region)
        .await
        .with_context(|| format!("Failed to open session for account {}", account_id))?;

    let Some(log_group) = resolve_stack_output(
        session.stacks.as_ref(),
        &config.stack_name,
        &config.log_group_output_key,
    )
    .await
    else {
        warn!("Skipping account {}: log group not found", account_id);
        return Ok(AccountOutcome::Skipped {
            account_id: account_id.clone(),
        });
    };

    info!("Account {} using log group: {}", account_id, log_group);

    let mut result = AccountResult::new(account_id.clone(), windows.len());
    for window in windows {
        info!(
            "  Account {} | window_offset={} | window={} .. {}",
            account_id,
            window.offset,
            to_iso(window.start),
            window.end_iso()
        );

        for value in run_window(session.logs.as_ref(), &log_group, window, query).await {
            result.record(window.offset, &value.category, value.value);
        }
    }

    Ok(AccountOutcome::Collected(result))
}
