//! # shared-types
//!
//! Core entities shared by every subsystem of the HashChain Operator.
//!
//! ## Clusters
//!
//! - **Records**: [`BlockRecord`], [`BlockSpec`], [`ObjectMeta`], the typed
//!   representation of a block resource as stored in the external store.
//! - **Keys**: [`BlockKey`], the stable `namespace/name` identifier used for
//!   cache lookup and work-queue deduplication.
//! - **Shape**: [`RecordShape`], explicit classification of a record as
//!   complete or malformed, so the malformed case is a testable branch rather
//!   than a runtime type assertion.

pub mod entities;
pub mod errors;

pub use entities::{unix_timestamp, BlockKey, BlockRecord, BlockSpec, Hash, ObjectMeta, RecordShape};
pub use errors::EntityError;
