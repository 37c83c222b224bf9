//! SQLite-backed resource registry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{Row, SqlitePool};
use tokio::sync::Notify;
use tracing::{debug, info};
use uuid::Uuid;

use cairn_core::{
    Error, NewResource, RegisterOutcome, Resource, ResourceKind, ResourceRepository,
    ResourceSpec, ResourceState, Result, UpdateOutcome,
};

/// Resource registry backed by the `resources` table.
///
/// Holds a [`Notify`] that is signalled whenever a row (re)enters the
/// Pending state, so a sync worker can sleep on it instead of polling.
#[derive(Clone)]
pub struct SqliteResourceRepository {
    pool: SqlitePool,
    notify: Arc<Notify>,
}

impl SqliteResourceRepository {
    /// Create a new repository with its own wake-up handle.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            notify: Arc::new(Notify::new()),
        }
    }

    /// Create a repository sharing an externally owned wake-up handle.
    pub fn with_notify(pool: SqlitePool, notify: Arc<Notify>) -> Self {
        Self { pool, notify }
    }

    /// Handle signalled whenever new Pending work appears.
    pub fn pending_notify(&self) -> Arc<Notify> {
        self.notify.clone()
    }
}

fn row_to_resource(row: &SqliteRow) -> Result<Resource> {
    let kind: String = row.try_get("kind")?;
    let kind: ResourceKind = kind.parse().map_err(Error::Internal)?;
    let state: String = row.try_get("state")?;
    let state: ResourceState = state.parse().map_err(Error::Internal)?;
    let spec: Json<ResourceSpec> = row.try_get("spec")?;

    Ok(Resource {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        kind,
        project_id: row.try_get("project_id")?,
        spec: spec.0,
        state,
        error: row.try_get("error")?,
        created_at: row.try_get("created_at")?,
        last_updated_at: row.try_get("last_updated_at")?,
    })
}

#[async_trait]
impl ResourceRepository for SqliteResourceRepository {
    async fn register(&self, new: NewResource) -> Result<RegisterOutcome> {
        let now = Utc::now();
        let kind = new.kind();

        let result = sqlx::query(
            r#"
            INSERT INTO resources (id, name, kind, project_id, spec, state, error, created_at, last_updated_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', NULL, $6, $7)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(new.id)
        .bind(&new.name)
        .bind(kind.as_str())
        .bind(&new.project_id)
        .bind(Json(&new.spec))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(
                subsystem = "db",
                resource_id = %new.id,
                kind = %kind,
                "Resource already registered"
            );
            return Ok(RegisterOutcome::AlreadyExists(new.id));
        }

        info!(
            subsystem = "db",
            resource_id = %new.id,
            kind = %kind,
            project_id = %new.project_id,
            "Resource registered"
        );
        self.notify.notify_waiters();
        Ok(RegisterOutcome::Created(new.id))
    }

    async fn set_state(&self, id: Uuid, state: ResourceState) -> Result<()> {
        let result = sqlx::query(
            "UPDATE resources SET state = $1, error = NULL, last_updated_at = $2 WHERE id = $3",
        )
        .bind(state.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ResourceNotFound(id));
        }
        Ok(())
    }

    async fn set_failed(&self, id: Uuid, reason: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE resources SET state = 'failed', error = $1, last_updated_at = $2 WHERE id = $3",
        )
        .bind(reason)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ResourceNotFound(id));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Resource>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, kind, project_id, spec, state, error, created_at, last_updated_at
            FROM resources WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_resource).transpose()
    }

    async fn status(&self, id: Uuid) -> Result<Option<ResourceState>> {
        let state: Option<String> =
            sqlx::query_scalar("SELECT state FROM resources WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        state
            .map(|s| s.parse().map_err(Error::Internal))
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<Resource>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, kind, project_id, spec, state, error, created_at, last_updated_at
            FROM resources ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_resource).collect()
    }

    async fn list_by_project(&self, project_id: &str) -> Result<Vec<Resource>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, kind, project_id, spec, state, error, created_at, last_updated_at
            FROM resources WHERE project_id = $1 ORDER BY created_at DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_resource).collect()
    }

    async fn list_by_kind(&self, kind: ResourceKind) -> Result<Vec<Resource>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, kind, project_id, spec, state, error, created_at, last_updated_at
            FROM resources WHERE kind = $1 ORDER BY created_at DESC
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_resource).collect()
    }

    async fn list_unfinished(&self) -> Result<Vec<Resource>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, kind, project_id, spec, state, error, created_at, last_updated_at
            FROM resources
            WHERE state NOT IN ('finished', 'failed')
            ORDER BY last_updated_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_resource).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn claim_next_pending(&self) -> Result<Option<Resource>> {
        // Single atomic statement: pick, flip to loading, return the
        // claimed row. Concurrent claimers are serialized by the write
        // lock exactly as concurrent job claims are.
        let row = sqlx::query(
            r#"
            UPDATE resources
            SET state = 'loading', last_updated_at = $1
            WHERE id = (
                SELECT id FROM resources
                WHERE state = 'pending'
                ORDER BY last_updated_at ASC
                LIMIT 1
            )
            RETURNING id, name, kind, project_id, spec, state, error, created_at, last_updated_at
            "#,
        )
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_resource).transpose()
    }

    async fn begin_update(&self, id: Uuid, cooldown: Duration) -> Result<UpdateOutcome> {
        let now = Utc::now();
        let cutoff = now - cooldown;

        // Eligibility check and state flip in one statement, so two
        // racing update requests cannot both pass the cooldown.
        let result = sqlx::query(
            r#"
            UPDATE resources
            SET state = 'pending', error = NULL, last_updated_at = $1
            WHERE id = $2
              AND (state = 'failed' OR (state = 'finished' AND last_updated_at <= $3))
            "#,
        )
        .bind(now)
        .bind(id)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(
                subsystem = "db",
                resource_id = %id,
                "Resource re-queued for synchronization"
            );
            self.notify.notify_waiters();
            return Ok(UpdateOutcome::Accepted);
        }

        let since: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT last_updated_at FROM resources WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match since {
            Some(since) => Ok(UpdateOutcome::Rejected { since }),
            None => Ok(UpdateOutcome::NotFound),
        }
    }

    async fn requeue_interrupted(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE resources
            SET state = 'pending', last_updated_at = $1
            WHERE state IN ('loading', 'indexing')
            "#,
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let count = result.rows_affected();
        if count > 0 {
            info!(
                subsystem = "db",
                count,
                "Re-queued resources interrupted mid-synchronization"
            );
            self.notify.notify_waiters();
        }
        Ok(count)
    }
}
