//! Submission and update service, the engine's front door.

use std::sync::Arc;

use chrono::Duration;
use futures::stream::{self, TryStreamExt};
use tracing::info;
use uuid::Uuid;

use cairn_core::{
    defaults, ChunkRepository, Error, NewResource, RegisterOutcome, Resource, ResourceKind,
    ResourceRepository, ResourceSpec, ResourceState, Result, UpdateOutcome, VectorIndex,
};
use cairn_db::Database;

/// Concurrent vector index deletes per delete cascade.
const VECTOR_DELETE_CONCURRENCY: usize = 8;

/// Registers resources, throttles updates, and owns the delete cascade.
///
/// Submissions only enqueue: the resource lands in Pending and the
/// worker picks it up. Duplicate submissions are detected by the
/// deterministic id computed before any storage write.
#[derive(Clone)]
pub struct ResourceService {
    db: Database,
    index: Arc<dyn VectorIndex>,
    update_cooldown: Duration,
}

impl ResourceService {
    /// Create a new service.
    ///
    /// The update cooldown comes from `UPDATE_COOLDOWN_HOURS` (default
    /// 24).
    pub fn new(db: Database, index: Arc<dyn VectorIndex>) -> Self {
        let cooldown_hours = std::env::var("UPDATE_COOLDOWN_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(defaults::UPDATE_COOLDOWN_HOURS);

        Self {
            db,
            index,
            update_cooldown: Duration::hours(cooldown_hours),
        }
    }

    /// Override the update cooldown.
    pub fn with_update_cooldown(mut self, cooldown: Duration) -> Self {
        self.update_cooldown = cooldown;
        self
    }

    /// The cooldown window applied to update requests.
    pub fn update_cooldown(&self) -> Duration {
        self.update_cooldown
    }

    // =========================================================================
    // SUBMISSION
    // =========================================================================

    /// Submit a website for indexing. Returns `None` when the same
    /// site is already registered for the project.
    pub async fn submit_website(
        &self,
        name: &str,
        url: &str,
        project_id: &str,
    ) -> Result<Option<Uuid>> {
        self.submit(NewResource::new(
            name,
            ResourceSpec::Website {
                url: url.to_string(),
            },
            project_id,
        ))
        .await
    }

    /// Submit a single web page for indexing.
    pub async fn submit_webpage(
        &self,
        name: &str,
        url: &str,
        project_id: &str,
    ) -> Result<Option<Uuid>> {
        self.submit(NewResource::new(
            name,
            ResourceSpec::Webpage {
                url: url.to_string(),
            },
            project_id,
        ))
        .await
    }

    /// Submit a video for transcript indexing.
    pub async fn submit_video(
        &self,
        name: &str,
        url: &str,
        project_id: &str,
    ) -> Result<Option<Uuid>> {
        self.submit(NewResource::new(
            name,
            ResourceSpec::Video {
                url: url.to_string(),
            },
            project_id,
        ))
        .await
    }

    /// Submit a source repository for indexing.
    ///
    /// `branch` defaults to `main`; the branch is part of the identity,
    /// so the same repository on two branches is two resources.
    pub async fn submit_repository(
        &self,
        name: &str,
        language: &str,
        clone_url: &str,
        paths: &str,
        branch: Option<&str>,
        project_id: &str,
    ) -> Result<Option<Uuid>> {
        let branch = branch.unwrap_or(defaults::REPOSITORY_DEFAULT_BRANCH);
        self.submit(NewResource::new(
            name,
            ResourceSpec::Repository {
                clone_url: clone_url.to_string(),
                language: language.to_string(),
                paths: paths.to_string(),
                branch: branch.to_string(),
            },
            project_id,
        ))
        .await
    }

    async fn submit(&self, new: NewResource) -> Result<Option<Uuid>> {
        match self.db.resources.register(new).await? {
            RegisterOutcome::Created(id) => Ok(Some(id)),
            RegisterOutcome::AlreadyExists(_) => Ok(None),
        }
    }

    /// Request a re-synchronization, subject to the update cooldown.
    ///
    /// Failed resources are always eligible; Finished ones only once
    /// the cooldown has elapsed since they last settled.
    pub async fn submit_update(&self, id: Uuid) -> Result<UpdateOutcome> {
        self.db.resources.begin_update(id, self.update_cooldown).await
    }

    // =========================================================================
    // DELETION
    // =========================================================================

    /// Delete a resource and everything indexed under it.
    ///
    /// Cascade order: vector index objects, then chunk rows, then the
    /// resource row. A failed vector delete aborts the cascade with
    /// all rows still in place, so a retry sees the full id set.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let resource = self
            .db
            .resources
            .get(id)
            .await?
            .ok_or(Error::ResourceNotFound(id))?;

        let chunk_ids = self.db.chunks.ids_for_resource(id).await?;
        stream::iter(chunk_ids.iter().copied().map(Ok::<_, Error>))
            .try_for_each_concurrent(VECTOR_DELETE_CONCURRENCY, |chunk_id| {
                let index = self.index.clone();
                async move { index.delete(chunk_id).await }
            })
            .await?;

        let rows = self.db.chunks.delete_for_resource(id).await?;
        self.db.resources.delete(id).await?;

        info!(
            subsystem = "sync",
            component = "service",
            resource_id = %id,
            kind = %resource.kind,
            chunk_count = rows,
            "Resource deleted"
        );
        Ok(())
    }

    /// Delete every resource of a project. Returns the resource count.
    pub async fn delete_by_project(&self, project_id: &str) -> Result<usize> {
        let resources = self.db.resources.list_by_project(project_id).await?;
        let mut deleted = 0;
        for resource in resources {
            self.delete(resource.id).await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Delete every registered resource. Returns the resource count.
    pub async fn delete_all(&self) -> Result<usize> {
        let resources = self.db.resources.list_all().await?;
        let mut deleted = 0;
        for resource in resources {
            self.delete(resource.id).await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    // =========================================================================
    // READ SIDE
    // =========================================================================

    /// Fetch a resource by id.
    pub async fn get(&self, id: Uuid) -> Result<Option<Resource>> {
        self.db.resources.get(id).await
    }

    /// Fetch just the lifecycle state.
    pub async fn status(&self, id: Uuid) -> Result<Option<ResourceState>> {
        self.db.resources.status(id).await
    }

    /// List every registered resource.
    pub async fn list_all(&self) -> Result<Vec<Resource>> {
        self.db.resources.list_all().await
    }

    /// List resources owned by a project.
    pub async fn list_by_project(&self, project_id: &str) -> Result<Vec<Resource>> {
        self.db.resources.list_by_project(project_id).await
    }

    /// List resources of one kind.
    pub async fn list_by_kind(&self, kind: ResourceKind) -> Result<Vec<Resource>> {
        self.db.resources.list_by_kind(kind).await
    }

    /// Number of chunk rows currently indexed for a resource.
    pub async fn chunk_count(&self, id: Uuid) -> Result<i64> {
        self.db.chunks.count_for_resource(id).await
    }

    /// Re-queue synchronizations interrupted by a restart.
    ///
    /// Call once at boot, before starting the worker.
    pub async fn resume(&self) -> Result<u64> {
        self.db.resources.requeue_interrupted().await
    }
}
