//! Centralized default constants for the Cairn system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their
//! own magic numbers; environment overrides are noted per constant.

// =============================================================================
// DATABASE
// =============================================================================

/// Default SQLite database path. Override: `DATABASE_PATH`.
pub const DATABASE_PATH: &str = "cairn.db";

/// Default maximum pool connections. Override: `DATABASE_MAX_CONNECTIONS`.
pub const DATABASE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds.
pub const DATABASE_BUSY_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server bind host. Override: `HOST`.
pub const SERVER_HOST: &str = "127.0.0.1";

/// Default HTTP server port. Override: `PORT`.
pub const SERVER_PORT: u16 = 3000;

// =============================================================================
// SYNC WORKER
// =============================================================================

/// Default maximum concurrent synchronization runs.
/// Override: `SYNC_MAX_CONCURRENT`.
pub const SYNC_MAX_CONCURRENT: usize = 4;

/// Default worker safety-net poll interval in milliseconds.
///
/// The worker normally sleeps until the registry wakes it; this
/// interval only covers rows created outside the process (external SQL
/// inserts, crash recovery). Override: `SYNC_POLL_INTERVAL_MS`.
pub const SYNC_POLL_INTERVAL_MS: u64 = 500;

/// Default per-run timeout in seconds (10 minutes).
/// Override: `SYNC_RUN_TIMEOUT_SECS`.
pub const SYNC_RUN_TIMEOUT_SECS: u64 = 600;

/// Default re-sync cooldown for finished resources in hours.
/// Override: `SYNC_UPDATE_COOLDOWN_HOURS`.
pub const UPDATE_COOLDOWN_HOURS: i64 = 24;

/// Default worker event broadcast channel capacity.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// VECTOR INDEX
// =============================================================================

/// Default vector index base URL. Override: `VECTOR_BASE_URL`.
pub const VECTOR_BASE_URL: &str = "http://127.0.0.1:8080";

/// Default vector index class (collection) name. Override: `VECTOR_INDEX`.
pub const VECTOR_INDEX: &str = "CairnChunk";

/// Default property key the chunk text is stored under.
/// Override: `VECTOR_TEXT_KEY`.
pub const VECTOR_TEXT_KEY: &str = "text";

/// Timeout for vector index requests in seconds.
pub const VECTOR_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// DOCUMENT LOADER
// =============================================================================

/// Default loader service base URL. Override: `LOADER_BASE_URL`.
pub const LOADER_BASE_URL: &str = "http://127.0.0.1:8090";

/// Timeout for loader requests in seconds. Site crawls and repository
/// clones are slow, so this is deliberately generous.
pub const LOADER_TIMEOUT_SECS: u64 = 300;

/// Branch assumed for repository resources submitted without one.
pub const REPOSITORY_DEFAULT_BRANCH: &str = "main";
