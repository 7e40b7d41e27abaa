//! Per-cycle status log
//!
//! A [`CycleStatus`] is created when a cycle starts, appended to as the cycle
//! runs, and handed to [`StatusRecorder::flush`] exactly once at the end.
//! Flushing is best-effort: failures are logged and swallowed.

use chrono::{DateTime, Utc};
use sheetsync_common::time::status_timestamp;
use sheetsync_common::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::upload::{ObjectStorePublisher, UploadObject, NO_CACHE};

/// Timestamped status lines for one cycle
#[derive(Debug, Clone)]
pub struct CycleStatus {
    started_at: DateTime<Utc>,
    lines: Vec<String>,
}

impl CycleStatus {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            lines: Vec::new(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Append `"<timestamp>: <message>"`
    pub fn record(&mut self, message: impl AsRef<str>) {
        self.record_at(Utc::now(), message);
    }

    pub fn record_at(&mut self, at: DateTime<Utc>, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!(target: "sheetsync::status", "{}", message);
        self.lines
            .push(format!("{}: {}", status_timestamp(at), message));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Writes the status log to a local file and to the object store
#[derive(Clone)]
pub struct StatusRecorder {
    local_path: Option<PathBuf>,
    object_path: String,
    publisher: ObjectStorePublisher,
}

impl StatusRecorder {
    pub fn new(local_path: Option<PathBuf>, object_path: impl Into<String>, publisher: ObjectStorePublisher) -> Self {
        Self {
            local_path,
            object_path: object_path.into(),
            publisher,
        }
    }

    /// Start a fresh log for a new cycle
    pub fn begin(&self) -> CycleStatus {
        CycleStatus::new(Utc::now())
    }

    /// Write and publish the log. Never fails; problems go to diagnostics.
    pub async fn flush(&self, status: &CycleStatus) {
        let text = status.render();

        if let Some(path) = &self.local_path {
            match write_local(path, &text).await {
                Ok(()) => info!("Status written to {}", path.display()),
                Err(e) => warn!("Failed to write status file {}: {}", path.display(), e),
            }
        }

        let object = UploadObject {
            destination_path: self.object_path.clone(),
            body: text,
            content_type: "text/plain".to_string(),
            cache_control: NO_CACHE.to_string(),
        };

        match self.publisher.publish(object).await {
            Ok(receipt) => info!("Status published to {}", receipt.key),
            Err(e) => warn!("Failed to publish status to {}: {}", self.object_path, e),
        }
    }
}

/// Overwrite the local status file in place
async fn write_local(path: &Path, text: &str) -> Result<()> {
    tokio::fs::write(path, text).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, ObjectStore, PutObject, PutReceipt};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use sheetsync_common::SyncError;
    use std::sync::Arc;

    struct BrokenStore;

    #[async_trait]
    impl ObjectStore for BrokenStore {
        async fn put(&self, object: PutObject) -> Result<PutReceipt> {
            Err(SyncError::publish(object.key, "access denied"))
        }
    }

    #[test]
    fn test_record_prefixes_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let mut status = CycleStatus::new(at);
        status.record_at(at, "Fetched master");

        assert_eq!(status.lines(), ["2026-10-19T08:00:00.000Z: Fetched master"]);
        assert_eq!(status.render(), "2026-10-19T08:00:00.000Z: Fetched master\n");
    }

    #[tokio::test]
    async fn test_flush_writes_file_and_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.txt");
        std::fs::write(&path, "stale contents from the previous cycle").unwrap();

        let store = MemoryStore::new();
        let recorder = StatusRecorder::new(
            Some(path.clone()),
            "sheets/status.txt",
            ObjectStorePublisher::new(Arc::new(store.clone()), false),
        );

        let mut status = recorder.begin();
        status.record("one");
        status.record("two");
        recorder.flush(&status).await;

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(written.lines().next().unwrap().ends_with(": one"));

        let object = store.get("sheets/status.txt").unwrap();
        assert_eq!(object.body, written.as_bytes());
        assert_eq!(object.content_type, "text/plain");
        assert_eq!(object.cache_control, "no-cache");
    }

    #[tokio::test]
    async fn test_flush_failures_are_swallowed() {
        let recorder = StatusRecorder::new(
            Some(PathBuf::from("/nonexistent-dir/for/sure/status.txt")),
            "status.txt",
            ObjectStorePublisher::new(Arc::new(BrokenStore), false),
        );

        let mut status = recorder.begin();
        status.record("still fine");
        recorder.flush(&status).await;
    }

    #[tokio::test]
    async fn test_write_local_reports_io_failure() {
        let err = write_local(Path::new("/nonexistent-dir/for/sure/status.txt"), "x")
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Io(_)));
        assert_eq!(err.kind(), "IoFailure");
    }
}
