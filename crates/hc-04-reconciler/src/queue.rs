//! Deduplicating, rate-limited work queue.
//!
//! Semantics:
//!
//! - `add` collapses duplicates: a key that is already pending is not
//!   queued twice, and a key currently being processed is only marked
//!   dirty, to be re-queued when its worker calls `done`.
//! - `get` never hands the same key to two workers at once; this in-flight
//!   exclusion is what gives the reconciler its single-writer-per-key
//!   guarantee.
//! - `add_rate_limited` delays the re-add by a per-key exponential backoff
//!   (base 5 ms, cap 1000 s), reset by `forget`.

use parking_lot::Mutex;
use shared_types::BlockKey;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::trace;

/// First backoff delay for a failing key.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(5);

/// Upper bound on the per-key backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(1000);

#[derive(Default)]
struct QueueState {
    /// Pending keys in arrival order.
    queue: VecDeque<BlockKey>,
    /// Keys that need processing: pending or re-observed while in flight.
    dirty: HashSet<BlockKey>,
    /// Keys currently held by a worker.
    processing: HashSet<BlockKey>,
    shutting_down: bool,
}

/// A work queue of block keys with in-flight exclusion and per-key backoff.
pub struct WorkQueue {
    state: Mutex<QueueState>,
    wakeup: Notify,
    failures: Mutex<HashMap<BlockKey, u32>>,
    base_delay: Duration,
    max_delay: Duration,
}

impl WorkQueue {
    /// Create a queue with the default backoff parameters.
    pub fn new() -> Self {
        Self::with_backoff(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }

    /// Create a queue with explicit backoff parameters.
    pub fn with_backoff(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            wakeup: Notify::new(),
            failures: Mutex::new(HashMap::new()),
            base_delay,
            max_delay,
        }
    }

    /// Enqueue `key` unless it is already pending.
    ///
    /// If the key is in flight it is only marked dirty and will be
    /// re-queued by `done`. No-op after shutdown.
    pub fn add(&self, key: BlockKey) {
        {
            let mut state = self.state.lock();
            if state.shutting_down || state.dirty.contains(&key) {
                return;
            }
            state.dirty.insert(key.clone());
            if state.processing.contains(&key) {
                trace!(key = %key, "key in flight; marked dirty");
                return;
            }
            state.queue.push_back(key);
        }
        self.wakeup.notify_waiters();
    }

    /// Dequeue the next key, waiting until one is available.
    ///
    /// Returns `None` once the queue has been shut down and drained. The
    /// returned key stays excluded from other workers until `done`.
    pub async fn get(&self) -> Option<BlockKey> {
        loop {
            // Register for a wakeup before checking, so an add racing with
            // the check cannot be missed.
            let notified = self.wakeup.notified();
            {
                let mut state = self.state.lock();
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    return Some(key);
                }
                if state.shutting_down {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Mark processing of `key` finished.
    ///
    /// If `add` was called while the key was in flight it is re-queued now.
    pub fn done(&self, key: &BlockKey) {
        let requeue = {
            let mut state = self.state.lock();
            state.processing.remove(key);
            if state.dirty.contains(key) {
                state.queue.push_back(key.clone());
                true
            } else {
                false
            }
        };
        if requeue {
            self.wakeup.notify_waiters();
        }
    }

    /// Clear the key's failure history; call on success.
    pub fn forget(&self, key: &BlockKey) {
        self.failures.lock().remove(key);
    }

    /// How many times the key has been re-queued with backoff.
    pub fn num_requeues(&self, key: &BlockKey) -> u32 {
        self.failures.lock().get(key).copied().unwrap_or(0)
    }

    /// Compute the key's next delay and bump its failure count.
    fn next_delay(&self, key: &BlockKey) -> Duration {
        let mut failures = self.failures.lock();
        let count = failures.entry(key.clone()).or_insert(0);
        let exponent = (*count).min(63);
        *count += 1;

        let millis = (self.base_delay.as_millis() as u128) << exponent;
        let capped = millis.min(self.max_delay.as_millis()) as u64;
        Duration::from_millis(capped)
    }

    /// Re-add `key` after its exponential backoff delay.
    pub fn add_rate_limited(self: &Arc<Self>, key: BlockKey) {
        let delay = self.next_delay(&key);
        trace!(key = %key, ?delay, "re-queueing with backoff");
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(key);
        });
    }

    /// Stop accepting keys and wake all blocked workers.
    ///
    /// Already-queued keys are still handed out until drained.
    pub fn shut_down(&self) {
        self.state.lock().shutting_down = true;
        self.wakeup.notify_waiters();
    }

    /// Number of pending keys.
    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Whether no key is pending.
    pub fn is_empty(&self) -> bool {
        self.state.lock().queue.is_empty()
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}
