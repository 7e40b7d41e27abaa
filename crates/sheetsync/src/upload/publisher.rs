//! Object store writes for formatted documents, with optional gzip

use flate2::write::GzEncoder;
use flate2::Compression;
use sheetsync_common::{Result, SyncError};
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

use super::formatter::UploadObject;
use crate::storage::{ObjectStore, PutObject, PutReceipt};

/// Cache-Control for objects that must never be cached (the status log)
pub const NO_CACHE: &str = "no-cache";

/// Writes formatted objects to the object store, optionally gzipped
#[derive(Clone)]
pub struct ObjectStorePublisher {
    store: Arc<dyn ObjectStore>,
    gzip: bool,
}

impl ObjectStorePublisher {
    pub fn new(store: Arc<dyn ObjectStore>, gzip: bool) -> Self {
        Self { store, gzip }
    }

    /// Publish one object; failures are returned, never retried
    pub async fn publish(&self, object: UploadObject) -> Result<PutReceipt> {
        let put = self.prepare(object)?;
        self.store.put(put).await
    }

    fn prepare(&self, object: UploadObject) -> Result<PutObject> {
        let (body, content_encoding) = if self.gzip {
            (gzip(object.body.as_bytes())?, Some("gzip".to_string()))
        } else {
            (object.body.into_bytes(), None)
        };

        Ok(PutObject {
            key: object.destination_path,
            body,
            content_type: object.content_type,
            cache_control: object.cache_control,
            content_encoding,
        })
    }
}

pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| SyncError::Compression(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| SyncError::Compression(e.to_string()))?;
    debug!("Compressed {} -> {} bytes", data.len(), compressed.len());
    Ok(compressed)
}
