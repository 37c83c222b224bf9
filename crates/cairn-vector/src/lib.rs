//! # cairn-vector
//!
//! Vector index backends for the Cairn synchronization engine.
//!
//! The engine treats the vector index as a black box keyed by
//! deterministic chunk ids: it hands over text plus display metadata
//! and the index embeds server-side. Two backends are provided:
//!
//! - [`HttpVectorIndex`]: a Weaviate-style object REST API client,
//!   the production backend
//! - [`InMemoryVectorIndex`]: a recording fake for tests

pub mod http;
pub mod memory;

pub use http::HttpVectorIndex;
pub use memory::{IndexCall, InMemoryVectorIndex, StoredObject};

// Re-export the trait backends implement
pub use cairn_core::VectorIndex;
