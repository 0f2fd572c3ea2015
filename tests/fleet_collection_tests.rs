use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fleetmetrics::app::accounts::AccountCredential;
use fleetmetrics::app::cloudformation::{StackDescriber, StackOutput};
use fleetmetrics::app::data_plane::cloudwatch_logs::{
    InsightsApi, QueryResultsPage, QueryState, ResultRow, StartQueryRequest,
};
use fleetmetrics::app::fleet::{AccountSession, AccountSessionFactory};
use fleetmetrics::app::output::write_tidy_csv;
use fleetmetrics::{CollectorConfig, FleetCollector};

const OUTPUT_KEY: &str = "WorkflowMirrorValidatorLogGroupName";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn account(id: &str) -> AccountCredential {
    AccountCredential {
        account_id: id.to_string(),
        access_key: format!("AKIA{id}"),
        secret_key: "secret".to_string(),
    }
}

fn row(county: &str, value: &str) -> ResultRow {
    HashMap::from([
        ("county".to_string(), county.to_string()),
        ("avg_global_completeness".to_string(), value.to_string()),
    ])
}

fn fast_config() -> CollectorConfig {
    CollectorConfig::default().with_poll_interval(Duration::ZERO)
}

/// Shared counters for every fake query issued during a run
#[derive(Default)]
struct QueryLog {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<(String, StartQueryRequest)>>,
}

struct FakeStack {
    outputs: Option<Vec<StackOutput>>,
}

#[async_trait]
impl StackDescriber for FakeStack {
    async fn stack_outputs(&self, stack_name: &str) -> Result<Vec<StackOutput>> {
        self.outputs
            .clone()
            .ok_or_else(|| anyhow!("Stack with id {} does not exist", stack_name))
    }
}

/// Serves completed results keyed by window end time
struct FakeInsights {
    account_id: String,
    rows_by_window_end: HashMap<i64, Vec<ResultRow>>,
    delay: Duration,
    log: Arc<QueryLog>,
}

#[async_trait]
impl InsightsApi for FakeInsights {
    async fn start_query(&self, request: &StartQueryRequest) -> Result<String> {
        let current = self.log.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.log
            .requests
            .lock()
            .unwrap()
            .push((self.account_id.clone(), request.clone()));

        tokio::time::sleep(self.delay).await;
        self.log.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(request.end_time.to_string())
    }

    async fn query_results(&self, query_id: &str) -> Result<QueryResultsPage> {
        let end_time: i64 = query_id.parse()?;
        let rows = self
            .rows_by_window_end
            .get(&end_time)
            .cloned()
            .unwrap_or_default();
        Ok(QueryResultsPage::new(QueryState::Succeeded, rows))
    }
}

#[derive(Clone)]
enum Behavior {
    /// Stack resolves; each entry is (hours before now of the window end, rows for that window)
    Metrics {
        rows: Vec<(i64, Vec<ResultRow>)>,
        delay: Duration,
    },
    NoLogGroup,
    SessionError,
    Panic,
}

struct FakeFleet {
    behaviors: HashMap<String, Behavior>,
    log: Arc<QueryLog>,
}

impl FakeFleet {
    fn new(behaviors: Vec<(&str, Behavior)>) -> Arc<Self> {
        Arc::new(Self {
            behaviors: behaviors
                .into_iter()
                .map(|(id, behavior)| (id.to_string(), behavior))
                .collect(),
            log: Arc::new(QueryLog::default()),
        })
    }
}

#[async_trait]
impl AccountSessionFactory for FakeFleet {
    async fn open(&self, account: &AccountCredential, _region: &str) -> Result<AccountSession> {
        let behavior = self
            .behaviors
            .get(&account.account_id)
            .cloned()
            .unwrap_or(Behavior::NoLogGroup);

        let (outputs, rows, delay) = match behavior {
            Behavior::Metrics { rows, delay } => (
                Some(vec![StackOutput::new(
                    OUTPUT_KEY,
                    format!("/aws/validator/{}", account.account_id),
                )]),
                rows,
                delay,
            ),
            Behavior::NoLogGroup => (None, Vec::new(), Duration::ZERO),
            Behavior::SessionError => bail!("InvalidClientTokenId"),
            Behavior::Panic => panic!("simulated worker crash"),
        };

        let rows_by_window_end = rows
            .into_iter()
            .map(|(hours_ago, rows)| ((now() - chrono::Duration::hours(hours_ago)).timestamp(), rows))
            .collect();

        Ok(AccountSession {
            stacks: Arc::new(FakeStack { outputs }),
            logs: Arc::new(FakeInsights {
                account_id: account.account_id.clone(),
                rows_by_window_end,
                delay,
                log: self.log.clone(),
            }),
        })
    }
}

fn metrics(rows: Vec<(i64, Vec<ResultRow>)>) -> Behavior {
    Behavior::Metrics {
        rows,
        delay: Duration::ZERO,
    }
}

fn csv_of(result: &fleetmetrics::FleetResult) -> String {
    let mut buffer = Vec::new();
    write_tidy_csv(&mut buffer, result).unwrap();
    String::from_utf8(buffer).unwrap()
}

#[tokio::test]
async fn test_single_row_becomes_one_tidy_line() {
    let fleet = FakeFleet::new(vec![("111111111111", metrics(vec![(0, vec![row("X", "0.87")])]))]);
    let collector = FleetCollector::new(fast_config(), fleet);

    let result = collector
        .collect(&[account("111111111111")], now(), 24, 60)
        .await;

    assert_eq!(
        csv_of(&result),
        "account_id,county,timestamp,avg_mvl_metric\n\
         111111111111,X,2024-05-01T12:00:00Z,0.8700\n"
    );
}

#[tokio::test]
async fn test_every_window_is_queried_once_per_account() {
    let fleet = FakeFleet::new(vec![
        ("111111111111", metrics(Vec::new())),
        ("222222222222", metrics(Vec::new())),
    ]);
    let collector = FleetCollector::new(fast_config(), fleet.clone());

    collector
        .collect(
            &[account("111111111111"), account("222222222222")],
            now(),
            24,
            60,
        )
        .await;

    let requests = fleet.log.requests.lock().unwrap();
    assert_eq!(requests.len(), 48);

    let first: Vec<_> = requests
        .iter()
        .filter(|(id, _)| id == "111111111111")
        .map(|(_, request)| request)
        .collect();
    assert_eq!(first.len(), 24);
    // Serial within the account, most recent window first
    for pair in first.windows(2) {
        assert_eq!(pair[0].start_time, pair[1].end_time);
    }
    assert_eq!(first[0].log_group_name, "/aws/validator/111111111111");
    assert_eq!(first[0].end_time, now().timestamp());
}

#[tokio::test]
async fn test_accounts_without_log_group_are_skipped() {
    let fleet = FakeFleet::new(vec![
        ("111111111111", Behavior::NoLogGroup),
        ("222222222222", metrics(vec![(1, vec![row("Lee", "0.5")])])),
    ]);
    let collector = FleetCollector::new(fast_config(), fleet);

    let result = collector
        .collect(
            &[account("111111111111"), account("222222222222")],
            now(),
            3,
            60,
        )
        .await;

    assert_eq!(result.skipped_accounts, vec!["111111111111".to_string()]);
    assert!(result.failed_accounts.is_empty());
    assert!(!result.accounts.contains_key("111111111111"));
    assert_eq!(
        csv_of(&result),
        "account_id,county,timestamp,avg_mvl_metric\n\
         222222222222,Lee,2024-05-01T11:00:00Z,0.5000\n"
    );
}

#[tokio::test]
async fn test_failing_accounts_do_not_block_others() {
    let fleet = FakeFleet::new(vec![
        ("111111111111", Behavior::SessionError),
        ("222222222222", Behavior::Panic),
        ("333333333333", metrics(vec![(0, vec![row("Polk", "0.25")])])),
    ]);
    let collector = FleetCollector::new(fast_config(), fleet);

    let result = collector
        .collect(
            &[
                account("111111111111"),
                account("222222222222"),
                account("333333333333"),
            ],
            now(),
            2,
            60,
        )
        .await;

    let mut failed = result.failed_accounts.clone();
    failed.sort();
    assert_eq!(
        failed,
        vec!["111111111111".to_string(), "222222222222".to_string()]
    );
    assert_eq!(
        csv_of(&result),
        "account_id,county,timestamp,avg_mvl_metric\n\
         333333333333,Polk,2024-05-01T12:00:00Z,0.2500\n"
    );
}

#[tokio::test]
async fn test_output_order_ignores_completion_order() {
    let slow = Behavior::Metrics {
        rows: vec![(0, vec![row("Polk", "0.1"), row("Dade", "0.2")])],
        delay: Duration::from_millis(30),
    };
    let fleet = FakeFleet::new(vec![
        ("111111111111", slow),
        ("222222222222", metrics(vec![(0, vec![row("Lee", "0.3")])])),
    ]);
    let collector = FleetCollector::new(fast_config(), fleet);

    let result = collector
        .collect(
            &[account("222222222222"), account("111111111111")],
            now(),
            1,
            60,
        )
        .await;

    assert_eq!(
        csv_of(&result),
        "account_id,county,timestamp,avg_mvl_metric\n\
         111111111111,Dade,2024-05-01T12:00:00Z,0.2000\n\
         111111111111,Polk,2024-05-01T12:00:00Z,0.1000\n\
         222222222222,Lee,2024-05-01T12:00:00Z,0.3000\n"
    );
}

#[tokio::test]
async fn test_worker_pool_is_bounded() {
    let ids: Vec<String> = (0..10).map(|i| format!("{:012}", i)).collect();
    let behaviors = ids
        .iter()
        .map(|id| {
            (
                id.as_str(),
                Behavior::Metrics {
                    rows: Vec::new(),
                    delay: Duration::from_millis(20),
                },
            )
        })
        .collect();
    let fleet = FakeFleet::new(behaviors);
    let collector = FleetCollector::new(fast_config().with_max_workers(3), fleet.clone());

    let accounts: Vec<_> = ids.iter().map(|id| account(id)).collect();
    let result = collector.collect(&accounts, now(), 2, 60).await;

    assert_eq!(result.accounts.len(), 10);
    let max_in_flight = fleet.log.max_in_flight.load(Ordering::SeqCst);
    assert!(max_in_flight <= 3, "max in flight was {max_in_flight}");
    assert!(max_in_flight >= 2, "accounts never overlapped");
}

#[tokio::test]
async fn test_unparseable_rows_are_dropped() {
    let fleet = FakeFleet::new(vec![(
        "111111111111",
        metrics(vec![(
            0,
            vec![
                row("Lee", "not-a-number"),
                HashMap::from([("avg_global_completeness".to_string(), "0.9".to_string())]),
                row("Polk", "0.75"),
            ],
        )]),
    )]);
    let collector = FleetCollector::new(fast_config(), fleet);

    let result = collector
        .collect(&[account("111111111111")], now(), 1, 60)
        .await;

    assert_eq!(
        csv_of(&result),
        "account_id,county,timestamp,avg_mvl_metric\n\
         111111111111,Polk,2024-05-01T12:00:00Z,0.7500\n"
    );
}

#[tokio::test]
async fn test_no_accounts_or_windows_is_empty() {
    let collector = FleetCollector::new(fast_config(), FakeFleet::new(Vec::new()));

    let result = collector.collect(&[], now(), 24, 60).await;
    assert!(result.is_empty());
    assert_eq!(result.windows.len(), 24);

    let fleet = FakeFleet::new(vec![("111111111111", metrics(Vec::new()))]);
    let collector = FleetCollector::new(fast_config(), fleet.clone());
    let result = collector
        .collect(&[account("111111111111")], now(), 1, 90)
        .await;

    assert!(result.windows.is_empty());
    assert!(fleet.log.requests.lock().unwrap().is_empty());
    assert_eq!(csv_of(&result), "account_id,county,timestamp,avg_mvl_metric\n");
}

#[tokio::test]
async fn test_unrepresentable_lookback_collects_nothing() {
    let fleet = FakeFleet::new(vec![("111111111111", metrics(vec![(0, vec![row("X", "0.5")])]))]);
    let collector = FleetCollector::new(fast_config(), fleet.clone());

    let result = collector
        .collect(&[account("111111111111")], now(), u32::MAX, u32::MAX)
        .await;

    assert!(result.is_empty());
    assert!(result.windows.is_empty());
    assert!(result.failed_accounts.is_empty());
    assert!(fleet.log.requests.lock().unwrap().is_empty());
}
