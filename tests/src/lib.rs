//! # HashChain Operator Test Suite
//!
//! Unified test crate for cross-subsystem scenarios.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── end_to_end.rs     # listing + watch → mined, linked chain
//!     └── failure_paths.rs  # deadline purge, replay, recreate-after-purge
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p hc-tests
//! cargo test -p hc-tests integration::
//! ```

pub mod integration;
