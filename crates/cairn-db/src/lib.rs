//! # cairn-db
//!
//! SQLite storage layer for the Cairn synchronization engine.
//!
//! This crate provides:
//! - Connection pool management (WAL mode, busy timeout)
//! - The resource registry with its atomic claim/cooldown statements
//! - The chunk metadata store backing the snapshot diff
//! - Schema initialization on connect
//!
//! ## Example
//!
//! ```rust,ignore
//! use cairn_db::Database;
//! use cairn_core::{NewResource, ResourceSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("cairn.db").await?;
//!
//!     let outcome = db
//!         .resources
//!         .register(NewResource::new(
//!             "Docs",
//!             ResourceSpec::Website { url: "https://docs.example.com".into() },
//!             "proj-1",
//!         ))
//!         .await?;
//!
//!     println!("registered: {:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod chunks;
pub mod pool;
pub mod resources;
pub mod schema;

// Re-export core types
pub use cairn_core::*;

pub use chunks::SqliteChunkRepository;
pub use pool::{
    create_memory_pool, create_pool, create_pool_with_config, log_pool_metrics, PoolConfig,
};
pub use resources::SqliteResourceRepository;
pub use schema::init_schema;

use sqlx::SqlitePool;

/// Main database handle bundling the pool and all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: SqlitePool,
    /// Resource registry with lifecycle state and the pending queue.
    pub resources: SqliteResourceRepository,
    /// Chunk metadata store, the record of what is currently indexed.
    pub chunks: SqliteChunkRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    ///
    /// The pool must already have the schema applied; the `connect_*`
    /// constructors do both.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            resources: SqliteResourceRepository::new(pool.clone()),
            chunks: SqliteChunkRepository::new(pool.clone()),
            pool,
        }
    }

    /// Open (creating if missing) the database file and apply the schema.
    pub async fn connect(path: &str) -> Result<Self> {
        let pool = create_pool(path).await?;
        schema::init_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Connect with custom pool configuration.
    pub async fn connect_with_config(path: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(path, config).await?;
        schema::init_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Open a fresh in-memory database. Used by integration tests, so
    /// compiled unconditionally.
    pub async fn connect_memory() -> Result<Self> {
        let pool = create_memory_pool().await?;
        schema::init_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
