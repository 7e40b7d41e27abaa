//! In-memory object store

use async_trait::async_trait;
use sheetsync_common::Result;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::info;

use super::{ObjectStore, PutObject, PutReceipt};

/// Keeps the latest version of every object in memory.
///
/// Backs `sheetsync once --dry-run` and the pipeline tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<Mutex<BTreeMap<String, PutObject>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<PutObject> {
        self.lock().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, PutObject>> {
        // A panic while holding the lock cannot leave the map half-written
        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, object: PutObject) -> Result<PutReceipt> {
        let receipt = PutReceipt::for_object(&object);
        info!(
            "Stored {} ({} bytes, {})",
            object.key, receipt.size, object.content_type
        );
        self.lock().insert(object.key.clone(), object);
        Ok(receipt)
    }
}
