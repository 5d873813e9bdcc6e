//! Typed watch events and the stream that delivers them.

use shared_types::BlockRecord;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

/// Events buffered per watcher before a forced resync.
pub const WATCH_CHANNEL_CAPACITY: usize = 256;

/// A change notification from the store.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A record was created.
    Added(BlockRecord),
    /// An existing record was replaced.
    Modified(BlockRecord),
    /// A record was removed.
    Deleted(BlockRecord),
}

impl WatchEvent {
    /// The record the event refers to.
    pub fn record(&self) -> &BlockRecord {
        match self {
            Self::Added(r) | Self::Modified(r) | Self::Deleted(r) => r,
        }
    }
}

/// Errors from a watch stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchError {
    /// The consumer fell behind and events were dropped; re-list and
    /// resume watching.
    #[error("watch stream lagged; full resync required")]
    Resync,

    /// The store side of the channel is gone.
    #[error("watch stream closed")]
    Closed,
}

/// An unbounded ordered sequence of change notifications for one namespace.
pub struct WatchStream {
    receiver: broadcast::Receiver<WatchEvent>,
    namespace: String,
}

impl WatchStream {
    pub(crate) fn new(receiver: broadcast::Receiver<WatchEvent>, namespace: String) -> Self {
        Self {
            receiver,
            namespace,
        }
    }

    /// Receive the next event in the watched namespace.
    ///
    /// Events for other namespaces are filtered out here, so the consumer
    /// only ever sees its own scope.
    pub async fn recv(&mut self) -> Result<WatchEvent, WatchError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if event.record().meta.namespace == self.namespace {
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(dropped)) => {
                    warn!(dropped, namespace = %self.namespace, "watch consumer lagged");
                    return Err(WatchError::Resync);
                }
                Err(broadcast::error::RecvError::Closed) => return Err(WatchError::Closed),
            }
        }
    }
}
