//! The store port consumed by the reconciler.

use crate::error::StoreError;
use crate::watch::WatchStream;
use async_trait::async_trait;
use shared_types::BlockRecord;

/// CRUD-and-watch access to block records in the external store.
///
/// Implementations own transport concerns entirely: a remote client retries
/// its connection with backoff and surfaces a reconnect to the consumer as a
/// resync, never as a partial stream.
#[async_trait]
pub trait BlockStoreApi: Send + Sync {
    /// List every record in `namespace`.
    async fn list(&self, namespace: &str) -> Result<Vec<BlockRecord>, StoreError>;

    /// Fetch one record by name.
    async fn get(&self, namespace: &str, name: &str) -> Result<BlockRecord, StoreError>;

    /// Create a record; the store assigns its revision.
    async fn create(&self, record: BlockRecord) -> Result<BlockRecord, StoreError>;

    /// Remove a record by name.
    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    /// Open a change-notification stream for `namespace`.
    fn watch(&self, namespace: &str) -> WatchStream;
}
