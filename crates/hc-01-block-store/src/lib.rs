//! # hc-01-block-store
//!
//! The external resource store boundary for the HashChain Operator.
//!
//! The reconciler never talks to storage directly; it consumes the
//! [`BlockStoreApi`] port. Watch delivery is explicit message passing:
//! the store pushes typed [`WatchEvent`]s onto a broadcast channel and the
//! consumer drains a [`WatchStream`]; there are no event-handler closures
//! capturing shared state.
//!
//! ## Resync semantics
//!
//! A consumer that falls behind the broadcast buffer gets
//! [`WatchError::Resync`] instead of silently missing events. Recovery is a
//! fresh `list()` followed by a resumed `watch()`, which may re-deliver add
//! events for already-known records; the reconciler is idempotent to that
//! replay.
//!
//! [`InMemoryBlockStore`] is the in-process adapter used by the runtime and
//! the test suite.

pub mod error;
pub mod memory;
pub mod ports;
pub mod watch;

pub use error::StoreError;
pub use memory::InMemoryBlockStore;
pub use ports::BlockStoreApi;
pub use watch::{WatchError, WatchEvent, WatchStream, WATCH_CHANNEL_CAPACITY};
