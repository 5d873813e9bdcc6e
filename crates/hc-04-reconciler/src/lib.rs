//! # hc-04-reconciler
//!
//! The reconciliation engine of the HashChain Operator.
//!
//! ## Data flow
//!
//! ```text
//! store ──watch──→ [Informer] ──→ [WatchCache]
//!                      │
//!                      └─enqueue──→ [WorkQueue] ──get()──→ worker pool
//!                                                              │
//!                                              mine ⟂ deadline race
//!                                              │              │
//!                                        Chain.append    store.delete
//!                                       (seal + forget)  (purge + backoff)
//! ```
//!
//! The informer consumes typed watch events, mirrors them into the cache
//! and enqueues keys; workers drain the queue, look up the current record,
//! and drive the proof-of-work engine under a deadline. The work queue's
//! in-flight exclusion guarantees at most one worker per key; the chain is
//! mutated only behind a single mutex, so linkage is decided at append
//! time regardless of which mining run finishes first.

pub mod cache;
pub mod config;
pub mod error;
pub mod informer;
pub mod queue;
pub mod service;

pub use cache::{Lookup, WatchCache};
pub use config::ReconcilerConfig;
pub use error::{ReconcileError, Result};
pub use informer::Informer;
pub use queue::WorkQueue;
pub use service::{Outcome, Reconciler};
