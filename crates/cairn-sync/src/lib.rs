//! # cairn-sync
//!
//! Synchronization engine for Cairn: the worker draining the pending
//! queue, the per-resource pipeline, and the submission service.
//!
//! This crate provides:
//! - Snapshot-diff synchronization (only changed content touches the
//!   vector index)
//! - Concurrent bounded processing with per-run timeouts
//! - Event-driven wake-ups plus polling fallback
//! - Submission, throttled update, and cascade delete operations
//!
//! ## Example
//!
//! ```ignore
//! use cairn_sync::{LoaderRegistry, ResourceService, SyncWorker, WorkerConfig};
//! use cairn_db::Database;
//! use cairn_vector::HttpVectorIndex;
//! use std::sync::Arc;
//!
//! let db = Database::connect("cairn.db").await?;
//! let index = Arc::new(HttpVectorIndex::from_env());
//!
//! let service = ResourceService::new(db.clone(), index.clone());
//! service.resume().await?;
//!
//! let handle = SyncWorker::new(
//!     db,
//!     index,
//!     LoaderRegistry::from_env(),
//!     WorkerConfig::from_env(),
//! )
//! .start();
//!
//! service
//!     .submit_website("Docs", "https://docs.example.com", "proj-1")
//!     .await?;
//!
//! // Graceful shutdown
//! handle.shutdown().await?;
//! ```

pub mod loader;
pub mod pipeline;
pub mod service;
pub mod testsupport;
pub mod worker;

// Re-export core types
pub use cairn_core::*;

pub use loader::{HttpLoader, LoaderRegistry};
pub use pipeline::sync_resource;
pub use service::ResourceService;
pub use testsupport::ScriptedLoader;
pub use worker::{SyncEvent, SyncWorker, WorkerConfig, WorkerHandle};

/// Default polling interval for the worker (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = cairn_core::defaults::SYNC_POLL_INTERVAL_MS;
