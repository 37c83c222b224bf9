//! Core traits for Cairn abstractions.
//!
//! These traits define the seams between the engine and its storage and
//! collaborator backends, enabling pluggable implementations and
//! testability.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// RESOURCE REGISTRY
// =============================================================================

/// Durable registry of resources and their synchronization lifecycle.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Register a resource under its pre-derived id.
    ///
    /// Returns `AlreadyExists` when a row with the same id is present;
    /// the existing row is left untouched.
    async fn register(&self, new: NewResource) -> Result<RegisterOutcome>;

    /// Set the lifecycle state, stamping `last_updated_at` and clearing
    /// any recorded failure reason.
    async fn set_state(&self, id: Uuid, state: ResourceState) -> Result<()>;

    /// Move the resource to Failed and record the reason.
    async fn set_failed(&self, id: Uuid, reason: &str) -> Result<()>;

    /// Fetch a resource by id.
    async fn get(&self, id: Uuid) -> Result<Option<Resource>>;

    /// Fetch just the lifecycle state.
    async fn status(&self, id: Uuid) -> Result<Option<ResourceState>>;

    /// List every registered resource.
    async fn list_all(&self) -> Result<Vec<Resource>>;

    /// List resources owned by a project.
    async fn list_by_project(&self, project_id: &str) -> Result<Vec<Resource>>;

    /// List resources of one kind.
    async fn list_by_kind(&self, kind: ResourceKind) -> Result<Vec<Resource>>;

    /// List resources whose synchronization has not settled
    /// (state is neither Finished nor Failed).
    async fn list_unfinished(&self) -> Result<Vec<Resource>>;

    /// Delete a resource row. Returns false when no row matched.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Atomically claim the oldest Pending resource, moving it to
    /// Loading. The worker's queue primitive: two concurrent claims can
    /// never return the same resource.
    async fn claim_next_pending(&self) -> Result<Option<Resource>>;

    /// Re-queue a settled resource for synchronization, enforcing the
    /// update cooldown in a single atomic statement.
    ///
    /// Accepted iff the resource is Failed, or Finished with
    /// `last_updated_at` at least `cooldown` in the past. On accept the
    /// state resets to Pending and the failure reason is cleared.
    async fn begin_update(&self, id: Uuid, cooldown: chrono::Duration) -> Result<UpdateOutcome>;

    /// Reset resources stuck in Loading/Indexing back to Pending.
    /// Boot-time recovery for runs interrupted by a crash or restart.
    async fn requeue_interrupted(&self) -> Result<u64>;
}

// =============================================================================
// METADATA STORE
// =============================================================================

/// Store of per-chunk metadata rows, the engine's record of what is
/// currently indexed.
#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Upsert a batch of chunk rows in one transaction. Re-saving an
    /// existing id is a no-op apart from refreshed display metadata.
    async fn save(&self, chunks: &[ChunkRecord]) -> Result<()>;

    /// All chunk ids belonging to a resource.
    async fn ids_for_resource(&self, resource_id: Uuid) -> Result<Vec<Uuid>>;

    /// Delete every chunk row of a resource. Returns the row count.
    async fn delete_for_resource(&self, resource_id: Uuid) -> Result<u64>;

    /// Delete specific chunk rows by id. Returns the row count.
    async fn delete_ids(&self, ids: &[Uuid]) -> Result<u64>;

    /// The stored (path, content hash) pairs of a resource, one per
    /// chunk row. Input to the snapshot diff.
    async fn snapshot(&self, resource_id: Uuid) -> Result<Vec<SnapshotEntry>>;

    /// Number of chunk rows stored for a resource.
    async fn count_for_resource(&self, resource_id: Uuid) -> Result<i64>;
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Fetches and chunks the content behind a resource.
///
/// Implementations must be deterministic for identical source state:
/// repeated loads of unchanged content return the same paths with the
/// same content, otherwise the snapshot diff cannot detect no-ops.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Fetch the resource's current content as chunks.
    async fn load(&self, resource: &Resource) -> Result<Vec<DocumentChunk>>;
}

/// The vector similarity index, consumed as a black box.
///
/// Embedding computation happens behind this interface; the engine only
/// hands over text and display metadata under a deterministic id.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace the object stored under `id`.
    async fn upsert(&self, id: Uuid, text: &str, metadata: &JsonValue) -> Result<()>;

    /// Delete the object stored under `id`. Deleting an absent id is
    /// not an error.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Whether an object is stored under `id`.
    async fn exists(&self, id: Uuid) -> Result<bool>;
}
