//! Failure paths: mining deadline purge and reconciliation after a purge.

#[cfg(test)]
mod tests {
    use crate::integration::support::wait_until;
    use hc_01_block_store::{BlockStoreApi, InMemoryBlockStore, StoreError};
    use hc_04_reconciler::{Reconciler, ReconcilerConfig};
    use shared_types::BlockRecord;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;

    /// Difficulty 60 cannot be satisfied within tens of milliseconds, so
    /// every mining attempt loses the deadline race.
    fn impossible_config() -> ReconcilerConfig {
        ReconcilerConfig {
            namespace: "default".to_string(),
            workers: 1,
            difficulty: 60,
            mining_deadline: Duration::from_millis(50),
            sync_timeout: Duration::from_secs(5),
        }
    }

    async fn gone(store: &Arc<InMemoryBlockStore>, name: &str) -> bool {
        matches!(
            store.get("default", name).await,
            Err(StoreError::NotFound { .. })
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_deadline_triggers_purge_and_chain_never_grows() {
        let store = Arc::new(InMemoryBlockStore::new());
        store
            .create(BlockRecord::new("default", "stuck", b"unminable".to_vec()))
            .await
            .unwrap();

        let reconciler = Reconciler::new(store.clone(), impossible_config()).unwrap();
        let chain = reconciler.chain();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let controller = tokio::spawn(reconciler.run(shutdown_rx));

        {
            let store = store.clone();
            wait_until(move || {
                let store = store.clone();
                async move { gone(&store, "stuck").await }
            })
            .await;
        }

        // Genesis only; the timed-out block was never appended.
        assert_eq!(chain.lock().len(), 1);
        assert!(chain.lock().verify_linkage());

        shutdown_tx.send(true).unwrap();
        controller.await.unwrap().unwrap();
    }

    /// A key re-observed after a purge is reconciled from scratch: the
    /// recreated record is processed like any fresh block, here timing out
    /// and being purged a second time.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_recreated_key_after_purge_is_processed_fresh() {
        let store = Arc::new(InMemoryBlockStore::new());
        let reconciler = Reconciler::new(store.clone(), impossible_config()).unwrap();
        let chain = reconciler.chain();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let controller = tokio::spawn(reconciler.run(shutdown_rx));

        store
            .create(BlockRecord::new("default", "flaky", b"one".to_vec()))
            .await
            .unwrap();
        {
            let store = store.clone();
            wait_until(move || {
                let store = store.clone();
                async move { gone(&store, "flaky").await }
            })
            .await;
        }

        // Same key, new record: must go through the full state machine
        // again rather than being blocked by the purged attempt's history.
        store
            .create(BlockRecord::new("default", "flaky", b"two".to_vec()))
            .await
            .unwrap();
        {
            let store = store.clone();
            wait_until(move || {
                let store = store.clone();
                async move { gone(&store, "flaky").await }
            })
            .await;
        }

        assert_eq!(chain.lock().len(), 1);

        shutdown_tx.send(true).unwrap();
        controller.await.unwrap().unwrap();
    }

    /// Repeated timeouts for one key must space out: the failure count only
    /// resets on success, so the backoff delay keeps growing.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timed_out_key_is_backed_off_not_forgotten() {
        let store = Arc::new(InMemoryBlockStore::new());
        store
            .create(BlockRecord::new("default", "stuck", b"unminable".to_vec()))
            .await
            .unwrap();

        let reconciler = Reconciler::new(store.clone(), impossible_config()).unwrap();
        let queue = reconciler.queue();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let controller = tokio::spawn(reconciler.run(shutdown_rx));

        let key = shared_types::BlockKey::new("default", "stuck");
        {
            let queue = queue.clone();
            let key = key.clone();
            wait_until(move || {
                let queue = queue.clone();
                let key = key.clone();
                async move { queue.num_requeues(&key) >= 1 }
            })
            .await;
        }

        shutdown_tx.send(true).unwrap();
        controller.await.unwrap().unwrap();
    }
}
