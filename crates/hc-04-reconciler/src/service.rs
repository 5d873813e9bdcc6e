//! The reconciler service: worker pool, deadline race, chain append.

use crate::cache::{Lookup, WatchCache};
use crate::config::ReconcilerConfig;
use crate::error::{ReconcileError, Result};
use crate::informer::Informer;
use crate::queue::WorkQueue;
use hc_01_block_store::{BlockStoreApi, StoreError};
use hc_02_proof_of_work::{CancelToken, ProofOfWork};
use hc_03_chain::Chain;
use parking_lot::Mutex;
use shared_types::{BlockKey, BlockRecord, Hash};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Terminal state of one reconcile attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The record was sealed and appended to the chain.
    Appended,
    /// The record was already chained; replay no-op.
    AlreadyChained,
    /// The record is no longer present; nothing to do.
    Gone,
}

/// Converts dequeued keys into chain-affecting decisions.
///
/// Clones share all state; the worker pool is a set of clones draining one
/// queue. The queue's in-flight exclusion means no two workers ever hold
/// the same key, and the chain mutex is the single append serialization
/// point.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn BlockStoreApi>,
    cache: Arc<WatchCache>,
    queue: Arc<WorkQueue>,
    chain: Arc<Mutex<Chain>>,
    pow: ProofOfWork,
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Build a reconciler over `store` with `config`.
    pub fn new(store: Arc<dyn BlockStoreApi>, config: ReconcilerConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(ReconcileError::InvalidConfig(
                "worker pool size must be at least 1".to_string(),
            ));
        }
        let pow = ProofOfWork::new(config.difficulty)?;
        Ok(Self {
            store,
            cache: Arc::new(WatchCache::new()),
            queue: Arc::new(WorkQueue::new()),
            chain: Arc::new(Mutex::new(Chain::new())),
            pow,
            config,
        })
    }

    /// Shared handle to the chain.
    pub fn chain(&self) -> Arc<Mutex<Chain>> {
        Arc::clone(&self.chain)
    }

    /// Shared handle to the watch cache.
    pub fn cache(&self) -> Arc<WatchCache> {
        Arc::clone(&self.cache)
    }

    /// Shared handle to the work queue.
    pub fn queue(&self) -> Arc<WorkQueue> {
        Arc::clone(&self.queue)
    }

    /// Run the controller until `shutdown` flips to `true`.
    ///
    /// Startup: spawn the informer, block until the cache's initial listing
    /// completes (fatal on timeout), seed the genesis block, then start the
    /// worker pool. Shutdown drains in-flight work before returning.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            namespace = %self.config.namespace,
            workers = self.config.workers,
            difficulty = self.pow.difficulty(),
            deadline = ?self.config.mining_deadline,
            "starting reconciler"
        );

        let informer = Informer::new(
            Arc::clone(&self.store),
            Arc::clone(&self.cache),
            Arc::clone(&self.queue),
            self.config.namespace.clone(),
        );
        let informer_handle = tokio::spawn(informer.run(shutdown.clone()));

        if !self.cache.wait_for_sync(self.config.sync_timeout).await {
            error!(timeout = ?self.config.sync_timeout, "cache never synced; aborting");
            self.queue.shut_down();
            informer_handle.abort();
            return Err(ReconcileError::SyncTimeout(self.config.sync_timeout));
        }
        info!(records = self.cache.len(), "cache synced");

        self.chain
            .lock()
            .add_genesis_if_empty(&self.config.namespace, &self.pow);

        let mut workers = Vec::with_capacity(self.config.workers);
        for worker_id in 0..self.config.workers {
            let worker = self.clone();
            workers.push(tokio::spawn(worker.worker_loop(worker_id)));
        }

        // Park until shutdown is requested, then drain.
        while !*shutdown.borrow() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }
        info!("shutdown requested; draining work queue");
        self.queue.shut_down();
        for handle in workers {
            let _ = handle.await;
        }
        let _ = informer_handle.await;
        info!(chain_height = self.chain.lock().len(), "reconciler stopped");
        Ok(())
    }

    /// Drain the queue until shutdown.
    async fn worker_loop(self, worker_id: usize) {
        debug!(worker_id, "worker started");
        while let Some(key) = self.queue.get().await {
            match self.reconcile(&key).await {
                Ok(outcome) => {
                    debug!(worker_id, key = %key, ?outcome, "reconcile finished");
                    self.queue.forget(&key);
                    self.queue.done(&key);
                }
                Err(err) => {
                    error!(worker_id, key = %key, error = %err, "reconcile failed");
                    self.queue.done(&key);
                    self.queue.add_rate_limited(key);
                }
            }
        }
        debug!(worker_id, "worker stopped");
    }

    /// Reconcile one key: the per-dequeue state machine.
    async fn reconcile(&self, key: &BlockKey) -> Result<Outcome> {
        if self.chain.lock().contains_key(key) {
            // Full resyncs replay add events for already-chained records.
            debug!(key = %key, "already chained; replay ignored");
            return Ok(Outcome::AlreadyChained);
        }

        let record = match self.cache.get_by_key(key) {
            Lookup::NotFound => {
                info!(key = %key, "record no longer present; nothing to reconcile");
                return Ok(Outcome::Gone);
            }
            Lookup::Malformed(reason) => {
                return Err(ReconcileError::Malformed {
                    key: key.clone(),
                    reason,
                });
            }
            Lookup::Found(record) => record,
        };

        if record.is_sealed() {
            // Sealed but not chained: verify instead of re-mining.
            if let Some(hash) = record.spec.hash {
                if self.chain.lock().contains_hash(&hash) {
                    return Ok(Outcome::AlreadyChained);
                }
            }
            if !self.pow.validate(&record.spec) {
                return Err(ReconcileError::InvalidSeal { key: key.clone() });
            }
            let height = {
                let mut chain = self.chain.lock();
                chain.append(record.clone())?;
                chain.len()
            };
            info!(key = %key, height, "pre-sealed block verified and appended");
            return Ok(Outcome::Appended);
        }

        self.mine_and_append(key, record).await
    }

    /// Race a mining task against the configured deadline.
    async fn mine_and_append(
        &self,
        key: &BlockKey,
        mut record: BlockRecord,
    ) -> Result<Outcome> {
        // Mining-start guess; append re-checks against the tip it finds.
        record.spec.prev_hash = self.chain.lock().tip_hash();

        let cancel = CancelToken::new();
        let mining_cancel = cancel.clone();
        let pow = self.pow.clone();
        let spec = record.spec.clone();
        let mining = tokio::task::spawn_blocking(move || pow.mine(&spec, &mining_cancel));

        tokio::select! {
            joined = mining => {
                let seal = joined
                    .map_err(|_| ReconcileError::MiningTaskFailed { key: key.clone() })??;
                record.spec.seal(seal.nonce, seal.hash)?;
                let height = {
                    let mut chain = self.chain.lock();
                    chain.append(record)?;
                    chain.len()
                };
                info!(
                    key = %key,
                    nonce = seal.nonce,
                    hash = %short_hash(&seal.hash),
                    height,
                    "block sealed and appended"
                );
                Ok(Outcome::Appended)
            }
            _ = tokio::time::sleep(self.config.mining_deadline) => {
                cancel.cancel();
                warn!(
                    key = %key,
                    deadline = ?self.config.mining_deadline,
                    "mining deadline elapsed; purging record"
                );
                match self.store.delete(&key.namespace, &key.name).await {
                    Ok(()) => {}
                    // Already gone is as purged as it gets.
                    Err(StoreError::NotFound { .. }) => {}
                    Err(err) => {
                        error!(key = %key, error = %err, "purge failed");
                        return Err(err.into());
                    }
                }
                Err(ReconcileError::MiningTimeout { key: key.clone() })
            }
        }
    }
}

/// First four bytes of a hash, hex encoded, for log lines.
fn short_hash(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}

#[cfg(test)]
mod tests {
    use super::*;
    use hc_01_block_store::InMemoryBlockStore;
    use std::time::Duration;

    fn reconciler(difficulty: u32, deadline: Duration) -> Reconciler {
        Reconciler::new(
            Arc::new(InMemoryBlockStore::new()),
            ReconcilerConfig {
                difficulty,
                mining_deadline: deadline,
                ..ReconcilerConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = Reconciler::new(
            Arc::new(InMemoryBlockStore::new()),
            ReconcilerConfig {
                workers: 0,
                ..ReconcilerConfig::default()
            },
        );
        assert!(matches!(result, Err(ReconcileError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_missing_key_is_a_no_op() {
        let r = reconciler(8, Duration::from_secs(30));
        let outcome = r
            .reconcile(&BlockKey::new("default", "nowhere"))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Gone);
    }

    #[tokio::test]
    async fn test_malformed_record_errors_without_purge() {
        let r = reconciler(8, Duration::from_secs(30));
        let mut record = BlockRecord::new("default", "broken", vec![1]);
        record.spec.nonce = Some(3); // partial seal
        let key = record.key();
        r.cache.insert(record);

        assert!(matches!(
            r.reconcile(&key).await,
            Err(ReconcileError::Malformed { .. })
        ));
        assert!(r.chain.lock().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unsealed_record_is_mined_and_appended() {
        let r = reconciler(8, Duration::from_secs(30));
        r.chain.lock().add_genesis_if_empty("default", &r.pow);

        let record = BlockRecord::new("default", "block-0", b"data".to_vec());
        let key = record.key();
        r.cache.insert(record);

        assert_eq!(r.reconcile(&key).await.unwrap(), Outcome::Appended);
        let chain = r.chain.lock();
        assert_eq!(chain.len(), 2);
        assert!(chain.verify_linkage());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_replayed_key_is_ignored_after_append() {
        let r = reconciler(8, Duration::from_secs(30));
        r.chain.lock().add_genesis_if_empty("default", &r.pow);

        let record = BlockRecord::new("default", "block-0", b"data".to_vec());
        let key = record.key();
        r.cache.insert(record);

        assert_eq!(r.reconcile(&key).await.unwrap(), Outcome::Appended);
        // Cache still holds the unsealed copy; a replayed add must not mine
        // a duplicate.
        assert_eq!(r.reconcile(&key).await.unwrap(), Outcome::AlreadyChained);
        assert_eq!(r.chain.lock().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_record_named_genesis_is_mined_not_skipped() {
        let r = reconciler(8, Duration::from_secs(30));
        r.chain.lock().add_genesis_if_empty("default", &r.pow);

        // The seeded genesis block must not classify this as a replay.
        let record = BlockRecord::new("default", "genesis", b"real payload".to_vec());
        let key = record.key();
        r.cache.insert(record);

        assert_eq!(r.reconcile(&key).await.unwrap(), Outcome::Appended);
        let chain = r.chain.lock();
        assert_eq!(chain.len(), 2);
        assert!(chain.verify_linkage());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_deadline_purges_record_and_skips_append() {
        // Difficulty 60 cannot be mined within 50 ms.
        let r = reconciler(60, Duration::from_millis(50));
        let record = BlockRecord::new("default", "stuck", b"data".to_vec());
        let key = record.key();
        r.store.create(record.clone()).await.unwrap();
        r.cache.insert(record);

        assert!(matches!(
            r.reconcile(&key).await,
            Err(ReconcileError::MiningTimeout { .. })
        ));
        assert!(matches!(
            r.store.get("default", "stuck").await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(r.chain.lock().is_empty());
    }
}
