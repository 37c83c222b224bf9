//! SQLite-backed chunk metadata store.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use cairn_core::{ChunkRecord, ChunkRepository, Result, SnapshotEntry};

/// Chunk metadata store backed by the `chunks` table.
#[derive(Clone)]
pub struct SqliteChunkRepository {
    pool: SqlitePool,
}

impl SqliteChunkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChunkRepository for SqliteChunkRepository {
    async fn save(&self, chunks: &[ChunkRecord]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for chunk in chunks {
            // Chunk ids are content-derived, so a conflicting insert
            // means the same content at the same path; only the
            // display metadata can meaningfully differ.
            sqlx::query(
                r#"
                INSERT INTO chunks (id, resource_id, source_type, path, content_hash, metadata, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT(id) DO UPDATE SET metadata = excluded.metadata
                "#,
            )
            .bind(chunk.id)
            .bind(chunk.resource_id)
            .bind(chunk.source_type.as_str())
            .bind(&chunk.path)
            .bind(&chunk.content_hash)
            .bind(Json(&chunk.metadata))
            .bind(chunk.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!(
            subsystem = "db",
            chunk_count = chunks.len(),
            "Saved chunk metadata batch"
        );
        Ok(())
    }

    async fn ids_for_resource(&self, resource_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar("SELECT id FROM chunks WHERE resource_id = $1")
            .bind(resource_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn delete_for_resource(&self, resource_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chunks WHERE resource_id = $1")
            .bind(resource_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_ids(&self, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut deleted = 0u64;
        for id in ids {
            let result = sqlx::query("DELETE FROM chunks WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            deleted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(deleted)
    }

    async fn snapshot(&self, resource_id: Uuid) -> Result<Vec<SnapshotEntry>> {
        let rows = sqlx::query("SELECT path, content_hash FROM chunks WHERE resource_id = $1")
            .bind(resource_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(SnapshotEntry {
                    path: row.try_get("path")?,
                    content_hash: row.try_get("content_hash")?,
                })
            })
            .collect()
    }

    async fn count_for_resource(&self, resource_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE resource_id = $1")
            .bind(resource_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
