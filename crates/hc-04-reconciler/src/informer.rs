//! List-then-watch feed from the store into the cache and queue.

use crate::cache::WatchCache;
use crate::queue::WorkQueue;
use hc_01_block_store::{BlockStoreApi, WatchError, WatchEvent};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Delay before retrying a failed listing.
const RELIST_BACKOFF: Duration = Duration::from_secs(1);

/// Feeds store changes into the watch cache and work queue.
///
/// One informer runs per controller. Every add notification updates the
/// cache and enqueues the key exactly once per distinct event; a resync
/// replays adds for known keys, which the reconciler tolerates.
pub struct Informer {
    store: Arc<dyn BlockStoreApi>,
    cache: Arc<WatchCache>,
    queue: Arc<WorkQueue>,
    namespace: String,
}

impl Informer {
    /// Wire an informer to its collaborators.
    pub fn new(
        store: Arc<dyn BlockStoreApi>,
        cache: Arc<WatchCache>,
        queue: Arc<WorkQueue>,
        namespace: String,
    ) -> Self {
        Self {
            store,
            cache,
            queue,
            namespace,
        }
    }

    /// Run until `shutdown` flips to `true`.
    ///
    /// Each pass opens the watch stream before listing, so no event falls
    /// between the snapshot and the stream. A lagged or closed stream
    /// triggers a full resync: fresh list, resumed watch.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }

            let mut stream = self.store.watch(&self.namespace);
            let records = match self.store.list(&self.namespace).await {
                Ok(records) => records,
                Err(err) => {
                    error!(namespace = %self.namespace, error = %err, "listing failed; retrying");
                    tokio::time::sleep(RELIST_BACKOFF).await;
                    continue;
                }
            };

            info!(
                namespace = %self.namespace,
                records = records.len(),
                "listing complete; cache syncing"
            );
            let mut listed_keys = HashSet::with_capacity(records.len());
            for record in records {
                let key = record.key();
                listed_keys.insert(key.clone());
                self.cache.insert(record);
                self.queue.add(key);
            }
            // The listing is the full truth: anything cached but not listed
            // was deleted while the watch was lagging.
            self.cache.retain_keys(&listed_keys);
            self.cache.mark_synced();

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            return;
                        }
                    }
                    event = stream.recv() => match event {
                        Ok(WatchEvent::Added(record)) => {
                            let key = record.key();
                            debug!(key = %key, "record added");
                            self.cache.insert(record);
                            self.queue.add(key);
                        }
                        Ok(WatchEvent::Modified(record)) => {
                            debug!(key = %record.key(), "record modified");
                            self.cache.insert(record);
                        }
                        Ok(WatchEvent::Deleted(record)) => {
                            let key = record.key();
                            debug!(key = %key, "record deleted");
                            self.cache.remove(&key);
                        }
                        Err(WatchError::Resync) => {
                            warn!(namespace = %self.namespace, "watch lagged; full resync");
                            break;
                        }
                        Err(WatchError::Closed) => {
                            warn!(namespace = %self.namespace, "watch closed; reconnecting");
                            tokio::time::sleep(RELIST_BACKOFF).await;
                            break;
                        }
                    }
                }
            }
        }
    }
}
