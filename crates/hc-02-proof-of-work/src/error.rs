//! Error types for the proof-of-work engine.

use thiserror::Error;

/// Result type alias for proof-of-work operations.
pub type Result<T> = std::result::Result<T, PowError>;

/// Errors that can occur while mining or validating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowError {
    /// Difficulty outside the representable range of leading zero bits.
    #[error("difficulty {difficulty} outside valid range 1..=255")]
    InvalidDifficulty {
        /// The rejected difficulty value.
        difficulty: u32,
    },

    /// The cancel token was raised before a satisfying nonce was found.
    #[error("mining cancelled")]
    Cancelled,

    /// Every nonce in the search space was tried without success.
    #[error("nonce space exhausted without satisfying the target")]
    NonceSpaceExhausted,
}
