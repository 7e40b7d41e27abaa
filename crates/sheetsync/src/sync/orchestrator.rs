//! Batch orchestrator
//!
//! One pass over the manifest: fetch the master, fetch every child with at most
//! `concurrency` requests in flight, format the survivors, then publish with
//! the same bound. Every fetch and every publish settles on its own; a failure
//! is recorded against its entry and never stops the siblings.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use sheetsync_common::{Result, SyncError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::status::CycleStatus;
use crate::manifest::{Manifest, ManifestEntry};
use crate::sheets::{is_valid_key, Sheets, SpreadsheetSource};
use crate::storage::PutReceipt;
use crate::upload::{ObjectStorePublisher, UploadFormatter, UploadObject};

/// Outcome of fetching one child spreadsheet
#[derive(Debug)]
pub enum FetchResult {
    Success { entry: ManifestEntry, sheets: Sheets },
    Failure { entry: ManifestEntry, cause: SyncError },
}

/// How a batch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every object published
    Success,
    /// Some entries failed to fetch, format or publish
    Partial,
    /// The manifest itself could not be read
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    pub manifest_entries: usize,
    pub fetched: usize,
    pub fetch_failures: usize,
    pub published: usize,
    pub publish_failures: usize,
}

impl BatchReport {
    fn aborted() -> Self {
        Self {
            outcome: BatchOutcome::Aborted,
            manifest_entries: 0,
            fetched: 0,
            fetch_failures: 0,
            published: 0,
            publish_failures: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub master_key: String,
    pub master_sheet: String,
    pub concurrency: usize,
    pub item_timeout: Duration,
}

pub struct BatchOrchestrator {
    source: Arc<dyn SpreadsheetSource>,
    formatter: UploadFormatter,
    publisher: ObjectStorePublisher,
    settings: BatchSettings,
}

impl BatchOrchestrator {
    pub fn new(
        source: Arc<dyn SpreadsheetSource>,
        formatter: UploadFormatter,
        publisher: ObjectStorePublisher,
        settings: BatchSettings,
    ) -> Self {
        Self {
            source,
            formatter,
            publisher,
            settings,
        }
    }

    /// Run one batch end to end, recording progress into `status`
    pub async fn run(&self, status: &mut CycleStatus) -> BatchReport {
        let Some(manifest) = self.fetch_manifest(status).await else {
            return BatchReport::aborted();
        };

        let manifest_entries = manifest.entries.len();
        let results = self.fetch_children(manifest.entries).await;

        let fetched = self.keep_successes(results, status);
        let fetch_failures = manifest_entries - fetched.len();

        let (objects, format_failures) = self.format_all(&fetched, status);

        let uploads = objects.len();
        let publish_results = self.publish_all(objects).await;

        let mut published = 0;
        for (path, result) in publish_results {
            match result {
                Ok(receipt) => {
                    published += 1;
                    status.record(format!(
                        "Published {} ({} bytes, sha256 {})",
                        receipt.key, receipt.size, receipt.checksum
                    ));
                },
                Err(e) => {
                    error!("Failed to publish {}: {}", path, e);
                    status.record(format!("{}: {}", e.kind(), e));
                },
            }
        }
        let publish_failures = uploads - published;

        let outcome = if fetch_failures == 0 && format_failures == 0 && publish_failures == 0 {
            BatchOutcome::Success
        } else {
            BatchOutcome::Partial
        };

        info!(
            "Batch complete: {} entries, {} fetched, {} published, {} publish failures",
            manifest_entries,
            fetched.len(),
            published,
            publish_failures
        );

        BatchReport {
            outcome,
            manifest_entries,
            fetched: fetched.len(),
            fetch_failures,
            published,
            publish_failures,
        }
    }

    async fn fetch_manifest(&self, status: &mut CycleStatus) -> Option<Manifest> {
        let key = &self.settings.master_key;

        let sheets = match self
            .with_timeout(format!("manifest fetch {}", key), self.source.fetch(key))
            .await
        {
            Ok(sheets) => sheets,
            Err(e) => {
                error!("Manifest fetch failed: {}", e);
                status.record(format!("{}: manifest {}: {}", e.kind(), key, e));
                status.record("Cycle skipped; retrying on next tick");
                return None;
            },
        };

        let Some(manifest) = Manifest::from_sheets(&sheets, &self.settings.master_sheet) else {
            status.record(format!("FetchFailure: manifest {} has no sub-sheets", key));
            return None;
        };

        for rejection in &manifest.rejected {
            status.record(format!("Skipped manifest {}", rejection));
        }
        for warning in &manifest.warnings {
            status.record(format!("Manifest {}", warning));
        }
        status.record(format!(
            "Manifest lists {} spreadsheets ({} rows skipped)",
            manifest.entries.len(),
            manifest.rejected.len()
        ));

        Some(manifest)
    }

    /// Fetch every entry, at most `concurrency` at a time, waiting for all to settle
    async fn fetch_children(&self, entries: Vec<ManifestEntry>) -> Vec<FetchResult> {
        stream::iter(entries)
            .map(|entry| async move {
                if !is_valid_key(&entry.key) {
                    return FetchResult::Failure {
                        cause: SyncError::InvalidKey(entry.key.clone()),
                        entry,
                    };
                }

                let result = self
                    .with_timeout(format!("fetch {}", entry.key), self.source.fetch(&entry.key))
                    .await;

                match result {
                    Ok(sheets) => FetchResult::Success { entry, sheets },
                    Err(cause) => FetchResult::Failure { entry, cause },
                }
            })
            .buffer_unordered(self.settings.concurrency)
            .collect()
            .await
    }

    /// Drop failures (recording each) and any entry whose key is malformed
    fn keep_successes(
        &self,
        results: Vec<FetchResult>,
        status: &mut CycleStatus,
    ) -> Vec<(ManifestEntry, Sheets)> {
        let mut kept = Vec::with_capacity(results.len());

        for result in results {
            match result {
                FetchResult::Success { entry, .. } if !is_valid_key(&entry.key) => {
                    status.record(format!("InvalidKey: {}", entry.key));
                },
                FetchResult::Success { entry, sheets } => {
                    status.record(format!(
                        "Fetched {} ({}, {} sub-sheets)",
                        entry.key,
                        entry.display_name(),
                        sheets.len()
                    ));
                    kept.push((entry, sheets));
                },
                FetchResult::Failure { entry, cause } => {
                    warn!("Fetch of {} failed: {}", entry.key, cause);
                    status.record(format!("{}: {}: {}", cause.kind(), entry.key, cause));
                },
            }
        }

        kept
    }

    fn format_all(
        &self,
        fetched: &[(ManifestEntry, Sheets)],
        status: &mut CycleStatus,
    ) -> (Vec<UploadObject>, usize) {
        let updated = Utc::now();
        let mut objects = Vec::new();
        let mut failures = 0;

        for (entry, sheets) in fetched {
            match self.formatter.format(entry, sheets, updated) {
                Ok(formatted) => objects.extend(formatted),
                Err(e) => {
                    failures += 1;
                    status.record(format!("{}: {}", e.kind(), e));
                },
            }
        }

        (objects, failures)
    }

    /// Publish every object, at most `concurrency` at a time, waiting for all to settle
    async fn publish_all(&self, objects: Vec<UploadObject>) -> Vec<(String, Result<PutReceipt>)> {
        stream::iter(objects)
            .map(|object| async move {
                let path = object.destination_path.clone();
                let result = self
                    .with_timeout(format!("publish {}", path), self.publisher.publish(object))
                    .await;
                (path, result)
            })
            .buffer_unordered(self.settings.concurrency)
            .collect()
            .await
    }

    async fn with_timeout<T>(
        &self,
        operation: String,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.settings.item_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout {
                operation,
                secs: self.settings.item_timeout.as_secs(),
            }),
        }
    }
}
