//! Structured logging schema and field name constants for Cairn.
//!
//! All crates use these constants for consistent structured logging
//! fields, so log aggregation tools can query by standardized field
//! names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, request rejected or fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), completed sync runs |
//! | DEBUG | Decision points, diff results, config choices |
//! | TRACE | Per-chunk iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → sync run → sub-calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "sync", "vector"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "worker", "pipeline", "service", "http_loader"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "submit", "claim_next_pending", "sync_resource", "delete"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Resource UUID being operated on.
pub const RESOURCE_ID: &str = "resource_id";

/// Resource kind ("website", "webpage", "video", "repository").
pub const RESOURCE_KIND: &str = "kind";

/// Owning project identifier.
pub const PROJECT_ID: &str = "project_id";

/// Lifecycle state a resource moved to.
pub const STATE: &str = "state";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of chunks produced by a loader fetch.
pub const CHUNK_COUNT: &str = "chunk_count";

/// Number of chunks written during a sync run.
pub const INSERTED: &str = "inserted";

/// Number of stale chunks removed during a sync run.
pub const DELETED: &str = "deleted";

/// Number of paths left untouched by a sync run.
pub const UNCHANGED: &str = "unchanged";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
