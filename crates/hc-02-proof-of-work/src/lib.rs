//! # hc-02-proof-of-work
//!
//! Proof-of-work engine for the HashChain Operator.
//!
//! Given an unsealed block spec and a difficulty (required leading zero bits
//! on the sealing hash), the engine searches nonces from zero upward until
//! `sha256(prev_hash ∥ data ∥ timestamp ∥ difficulty ∥ nonce)`, read as a
//! big-endian integer, falls strictly below `2^(256 - difficulty)`.
//!
//! ## Encoding contract
//!
//! The pre-image byte layout is an external contract, not an implementation
//! detail: stored nonces and timestamps must re-validate identically later.
//! Integers are encoded as fixed-width 8-byte big-endian; an absent
//! `prev_hash` contributes zero bytes.
//!
//! ## Cancellation
//!
//! The nonce search is CPU-bound and unbounded in wall-clock time. Callers
//! bound it by racing [`ProofOfWork::mine`] against a deadline and raising
//! the shared [`CancelToken`]; the search loop polls the token and exits
//! promptly with [`PowError::Cancelled`].

pub mod cancel;
pub mod engine;
pub mod error;

pub use cancel::CancelToken;
pub use engine::{ProofOfWork, Seal, DEFAULT_DIFFICULTY};
pub use error::{PowError, Result};
