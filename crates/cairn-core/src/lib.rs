//! # cairn-core
//!
//! Core types, traits, and abstractions for the Cairn resource
//! synchronization engine.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other Cairn crates depend on: the resource and chunk models,
//! deterministic identity derivation, the pure snapshot diff, and the
//! repository/collaborator traits.

pub mod defaults;
pub mod diff;
pub mod error;
pub mod ident;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use diff::{diff, snapshot_from_entries, Snapshot, SnapshotDiff};
pub use error::{Error, Result};
pub use ident::{chunk_id, content_checksum, resource_identity};
pub use models::*;
pub use traits::*;
