//! One complete cycle: reset the status log, run the batch, flush the log

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use super::orchestrator::{BatchOrchestrator, BatchOutcome, BatchReport, BatchSettings};
use super::status::StatusRecorder;
use crate::config::SyncConfig;
use crate::sheets::SpreadsheetSource;
use crate::storage::ObjectStore;
use crate::upload::{ObjectStorePublisher, UploadFormatter};

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub batch: BatchReport,
}

impl CycleReport {
    pub fn outcome(&self) -> BatchOutcome {
        self.batch.outcome
    }
}

pub struct CycleRunner {
    orchestrator: BatchOrchestrator,
    status: StatusRecorder,
}

impl CycleRunner {
    pub fn new(orchestrator: BatchOrchestrator, status: StatusRecorder) -> Self {
        Self {
            orchestrator,
            status,
        }
    }

    /// Wire a runner from configuration. The store is shared by document
    /// uploads and the status log.
    pub fn from_config(
        config: &SyncConfig,
        source: Arc<dyn SpreadsheetSource>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        let publisher = ObjectStorePublisher::new(store, config.gzip);
        let formatter = UploadFormatter::new(config.dest_folder.clone(), config.output_formats());
        let status_object = formatter.path_for(&config.status_object);

        let orchestrator = BatchOrchestrator::new(
            source,
            formatter,
            publisher.clone(),
            BatchSettings {
                master_key: config.master_key.clone(),
                master_sheet: config.master_sheet.clone(),
                concurrency: config.concurrency,
                item_timeout: config.item_timeout(),
            },
        );

        let status = StatusRecorder::new(config.status_file.clone(), status_object, publisher);

        Self::new(orchestrator, status)
    }

    pub async fn run_cycle(&self) -> CycleReport {
        let start = Instant::now();
        let mut status = self.status.begin();
        let started_at = status.started_at();
        status.record("Cycle started");

        let batch = self.orchestrator.run(&mut status).await;
        let elapsed = start.elapsed();

        let summary = match batch.outcome {
            BatchOutcome::Success => "complete",
            BatchOutcome::Partial => "complete with failures",
            BatchOutcome::Aborted => "aborted",
        };
        status.record(format!(
            "Cycle {} in {:.1}s: {}/{} published",
            summary,
            elapsed.as_secs_f64(),
            batch.published,
            batch.published + batch.publish_failures
        ));

        self.status.flush(&status).await;
        info!("Cycle {} after {:?}", summary, elapsed);

        CycleReport {
            started_at,
            elapsed,
            batch,
        }
    }
}
