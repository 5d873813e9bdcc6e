//! Error types for chain mutation.

use shared_types::BlockKey;
use thiserror::Error;

/// Result type alias for chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;

/// Errors that can occur while appending to the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Only sealed blocks may be appended.
    #[error("block {key} is not sealed")]
    NotSealed {
        /// Key of the rejected record.
        key: BlockKey,
    },
}
