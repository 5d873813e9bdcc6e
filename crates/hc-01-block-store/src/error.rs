//! Error types for store operations.

use thiserror::Error;

/// Errors returned by a block store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record under this namespace/name.
    #[error("block not found: {namespace}/{name}")]
    NotFound {
        /// Scope of the missing record.
        namespace: String,
        /// Name of the missing record.
        name: String,
    },

    /// A record with this name already exists in the namespace.
    #[error("block already exists: {namespace}/{name}")]
    AlreadyExists {
        /// Scope of the conflicting record.
        namespace: String,
        /// Name of the conflicting record.
        name: String,
    },
}
