//! Sheetsync - publish spreadsheets as static JSON

use anyhow::Result;
use clap::Parser;
use sheetsync::config::Config;
use sheetsync::sheets::{GoogleSheetsClient, SpreadsheetSource};
use sheetsync::storage::{config::StorageConfig, MemoryStore, ObjectStore, S3Storage};
use sheetsync::sync::{BatchOutcome, CycleRunner, CycleScheduler};
use sheetsync_common::logging::{init_logging, LogConfig, LogLevel};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "sheetsync")]
#[command(author, version, about = "Publish spreadsheets as JSON to an object store")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Sync on a fixed interval until interrupted
    Run {
        /// Nominal seconds between cycle starts
        #[arg(short, long, env = "SHEETSYNC_INTERVAL_SECS")]
        interval: Option<u64>,

        /// Maximum simultaneous fetches or uploads
        #[arg(short, long, env = "SHEETSYNC_CONCURRENCY")]
        concurrency: Option<usize>,
    },

    /// Run a single cycle and exit
    Once {
        /// Maximum simultaneous fetches or uploads
        #[arg(short, long, env = "SHEETSYNC_CONCURRENCY")]
        concurrency: Option<usize>,

        /// Keep uploads in memory instead of writing to the bucket
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env values must be visible to clap's env fallbacks
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("sheetsync")
        .build()
        .merge_env()?;

    init_logging(&log_config)?;

    let mut config = Config::load()?;
    let source: Arc<dyn SpreadsheetSource> = Arc::new(GoogleSheetsClient::new(config.sheets.clone())?);

    match cli.command {
        Command::Run {
            interval,
            concurrency,
        } => {
            if let Some(secs) = interval {
                config.sync.interval_secs = secs;
            }
            if let Some(limit) = concurrency {
                config.sync.concurrency = limit;
            }
            config.sync.validate()?;

            let store: Arc<dyn ObjectStore> = Arc::new(S3Storage::new(StorageConfig::from_env()?).await?);
            let runner = CycleRunner::from_config(&config.sync, source, store);
            let scheduler = CycleScheduler::new(config.sync.interval());

            let shutdown = CancellationToken::new();
            let trigger = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received; stopping after the current cycle");
                    trigger.cancel();
                }
            });

            info!(
                "Syncing manifest {} every {}s",
                config.sync.master_key, config.sync.interval_secs
            );
            scheduler.run(|| runner.run_cycle(), shutdown).await;
        },
        Command::Once {
            concurrency,
            dry_run,
        } => {
            if let Some(limit) = concurrency {
                config.sync.concurrency = limit;
            }
            config.sync.validate()?;

            let memory = MemoryStore::new();
            let store: Arc<dyn ObjectStore> = if dry_run {
                warn!("Dry run: nothing will be written to the bucket");
                Arc::new(memory.clone())
            } else {
                Arc::new(S3Storage::new(StorageConfig::from_env()?).await?)
            };

            let report = CycleRunner::from_config(&config.sync, source, store)
                .run_cycle()
                .await;

            if dry_run {
                for key in memory.keys() {
                    info!("Would publish {}", key);
                }
            }

            if report.outcome() == BatchOutcome::Aborted {
                anyhow::bail!("Manifest {} could not be read", config.sync.master_key);
            }
            info!(
                "Published {} of {} objects",
                report.batch.published,
                report.batch.published + report.batch.publish_failures
            );
        },
    }

    Ok(())
}
