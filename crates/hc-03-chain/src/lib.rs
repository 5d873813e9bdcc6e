//! # hc-03-chain
//!
//! The append-only ordered chain of sealed block records.
//!
//! ## Linkage invariant
//!
//! For every index `i > 0`, `blocks[i].spec.prev_hash ==
//! blocks[i-1].spec.hash`, and the first block carries no predecessor hash.
//! [`Chain::append`] enforces this by rewriting a stale `prev_hash` to the
//! current tip hash immediately before insertion, so blocks mined against an
//! older tip still link correctly when concurrent appends interleave.
//!
//! The chain itself is single-threaded; callers serialize mutation through
//! one mutex, which is the sole append serialization point.

pub mod chain;
pub mod error;

pub use chain::{Chain, GENESIS_PAYLOAD};
pub use error::{ChainError, Result};
