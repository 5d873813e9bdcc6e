//! In-memory store adapter.

use crate::error::StoreError;
use crate::ports::BlockStoreApi;
use crate::watch::{WatchEvent, WatchStream, WATCH_CHANNEL_CAPACITY};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::BlockRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// A process-local block store with broadcast watch fan-out.
///
/// Backs the in-process runtime mode and the test suite. Revisions increase
/// monotonically across all writes; watch events are fanned out to every
/// open stream, which filters them by namespace.
pub struct InMemoryBlockStore {
    records: RwLock<HashMap<(String, String), BlockRecord>>,
    revision: AtomicU64,
    events: broadcast::Sender<WatchEvent>,
}

impl InMemoryBlockStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        Self {
            records: RwLock::new(HashMap::new()),
            revision: AtomicU64::new(0),
            events,
        }
    }

    /// Number of records across all namespaces.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn publish(&self, event: WatchEvent) {
        // A send error only means no stream is currently open.
        let _ = self.events.send(event);
    }
}

impl Default for InMemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStoreApi for InMemoryBlockStore {
    async fn list(&self, namespace: &str) -> Result<Vec<BlockRecord>, StoreError> {
        let records = self.records.read();
        let mut listed: Vec<BlockRecord> = records
            .values()
            .filter(|r| r.meta.namespace == namespace)
            .cloned()
            .collect();
        // Stable listing order for deterministic resyncs.
        listed.sort_by(|a, b| a.meta.name.cmp(&b.meta.name));
        Ok(listed)
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<BlockRecord, StoreError> {
        self.records
            .read()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn create(&self, mut record: BlockRecord) -> Result<BlockRecord, StoreError> {
        let key = (record.meta.namespace.clone(), record.meta.name.clone());
        let mut records = self.records.write();
        if records.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                namespace: key.0,
                name: key.1,
            });
        }
        record.meta.revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        records.insert(key, record.clone());
        drop(records);

        debug!(key = %record.key(), revision = record.meta.revision, "record created");
        self.publish(WatchEvent::Added(record.clone()));
        Ok(record)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let key = (namespace.to_string(), name.to_string());
        let removed = self.records.write().remove(&key);
        match removed {
            Some(record) => {
                debug!(key = %record.key(), "record deleted");
                self.publish(WatchEvent::Deleted(record));
                Ok(())
            }
            None => Err(StoreError::NotFound {
                namespace: key.0,
                name: key.1,
            }),
        }
    }

    fn watch(&self, namespace: &str) -> WatchStream {
        WatchStream::new(self.events.subscribe(), namespace.to_string())
    }
}
