#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{bail, Context, Result};
use chrono::{SubsecRound, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use fleetmetrics::app::fleet::{plan_windows, AwsSessionFactory};
use fleetmetrics::app::output::{render_chart, write_tidy_file, RunArtifacts};
use fleetmetrics::app::{load_accounts, CollectorConfig, FleetCollector};

#[derive(Parser, Debug)]
#[command(name = "fleetmetrics")]
#[command(
    about = "Collect MVL completeness metrics from AWS CloudWatch Logs across multiple accounts"
)]
#[command(version)]
struct Cli {
    /// How many hours to look back
    #[arg(long, default_value_t = 24)]
    range_hours: u32,

    /// Size of each time window in minutes
    #[arg(long, default_value_t = 60)]
    granularity_minutes: u32,

    /// YAML file listing account IDs and access keys
    #[arg(long, env = "FLEETMETRICS_ACCOUNTS_FILE", default_value = "accounts-dev.yaml")]
    accounts_file: PathBuf,

    /// Optional TOML file with collector settings
    #[arg(long, env = "FLEETMETRICS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the AWS region
    #[arg(long)]
    region: Option<String>,

    /// Override the CloudFormation stack name
    #[arg(long)]
    stack_name: Option<String>,

    /// Directory for the CSV and chart
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    // RUST_LOG wins over the built-in defaults
    let default_directives = format!(
        "fleetmetrics={},aws_config=warn,aws_sigv4=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,aws_smithy_http=warn,hyper=warn",
        if verbose { "debug" } else { "info" }
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directives));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // Persistent copy of every run's log; skipped when the data dir is not writable
    let mut log_path = None;
    let file_layer = directories::ProjectDirs::from("com", "", "fleetmetrics").and_then(|dirs| {
        let log_dir = dirs.data_dir().join("logs");
        std::fs::create_dir_all(&log_dir).ok()?;

        let path = log_dir.join("fleetmetrics.log");
        let file = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .ok()?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)) {
                eprintln!("[SECURITY] Failed to set log file permissions: {}", e);
            }
        }

        log_path = Some(path);
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false),
        )
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer);

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    // Bridge log crate events from dependencies to tracing
    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::warn!("Failed to initialize log-to-tracing bridge: {}", e);
    }

    if let Some(path) = log_path {
        tracing::debug!("Logging to: {:?}", path);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    tracing::info!(
        "fleetmetrics {} ({}@{})",
        env!("CARGO_PKG_VERSION"),
        fleetmetrics::GIT_BRANCH,
        fleetmetrics::GIT_COMMIT
    );

    if cli.granularity_minutes == 0 {
        bail!("--granularity-minutes must be at least 1");
    }

    let mut config = CollectorConfig::load(cli.config.as_deref())?;
    if let Some(region) = cli.region {
        config = config.with_region(region);
    }
    if let Some(stack_name) = cli.stack_name {
        config = config.with_stack_name(stack_name);
    }
    config.validate()?;

    let now = Utc::now().trunc_subsecs(0);
    let windows = plan_windows(now, cli.range_hours, cli.granularity_minutes)?;

    tracing::info!("Configuration:");
    tracing::info!("  Time range: {} hours", cli.range_hours);
    tracing::info!("  Granularity: {} minutes", cli.granularity_minutes);
    tracing::info!("  Number of windows: {}", windows.len());
    tracing::info!("  Region: {}, stack: {}", config.region, config.stack_name);

    let accounts = load_accounts(&cli.accounts_file)?;
    tracing::info!(
        "Loaded {} accounts from {}",
        accounts.len(),
        cli.accounts_file.display()
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    let collector = FleetCollector::new(config, Arc::new(AwsSessionFactory));
    let result = runtime.block_on(collector.collect(
        &accounts,
        now,
        cli.range_hours,
        cli.granularity_minutes,
    ));

    let artifacts = RunArtifacts::new(&cli.output_dir, Utc::now());
    write_tidy_file(&artifacts.csv_path, &result)?;

    if let Err(e) = render_chart(&artifacts.csv_path, &artifacts.chart_path) {
        tracing::warn!("Failed to create visualization: {:#}", e);
    }

    Ok(())
}
