//! # Error Types
//!
//! Errors raised by the shared entity layer.

use thiserror::Error;

/// Errors from entity-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// A seal was already attached; sealed fields are immutable.
    #[error("block is already sealed")]
    AlreadySealed,
}
