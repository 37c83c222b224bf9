//! Schema initialization.
//!
//! The full schema is applied on every connect. Statements are
//! idempotent (`IF NOT EXISTS`), so running against an existing
//! database is a no-op.

use sqlx::SqlitePool;
use tracing::info;

use cairn_core::Result;

/// Resource registry table.
///
/// `id` is a deterministic UUIDv5 over the resource's identity fields,
/// so re-registering the same resource conflicts on the primary key
/// instead of creating a second row. `spec` holds the per-kind
/// parameters as JSON.
const CREATE_RESOURCES: &str = r#"
CREATE TABLE IF NOT EXISTS resources (
    id              BLOB PRIMARY KEY,
    name            TEXT NOT NULL,
    kind            TEXT NOT NULL,
    project_id      TEXT NOT NULL,
    spec            TEXT NOT NULL,
    state           TEXT NOT NULL,
    error           TEXT,
    created_at      TEXT NOT NULL,
    last_updated_at TEXT NOT NULL
)
"#;

/// Chunk metadata table.
///
/// One row per indexed document chunk. `id` matches the vector store
/// object id. No foreign key to `resources`: the service layer owns
/// the delete cascade so a half-finished cascade never blocks on a
/// constraint.
const CREATE_CHUNKS: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    id            BLOB PRIMARY KEY,
    resource_id   BLOB NOT NULL,
    source_type   TEXT NOT NULL,
    path          TEXT NOT NULL,
    content_hash  TEXT NOT NULL,
    metadata      TEXT NOT NULL,
    created_at    TEXT NOT NULL
)
"#;

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_resources_state ON resources(state)",
    "CREATE INDEX IF NOT EXISTS idx_resources_project ON resources(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_resources_kind ON resources(kind)",
    "CREATE INDEX IF NOT EXISTS idx_chunks_resource ON chunks(resource_id)",
];

/// Apply the schema to a freshly opened pool.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_RESOURCES).execute(pool).await?;
    sqlx::query(CREATE_CHUNKS).execute(pool).await?;
    for stmt in CREATE_INDEXES {
        sqlx::query(stmt).execute(pool).await?;
    }

    info!(
        subsystem = "db",
        component = "schema",
        op = "init",
        "Database schema initialized"
    );
    Ok(())
}
