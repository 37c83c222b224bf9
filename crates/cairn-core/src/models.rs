//! Core data models for Cairn.
//!
//! These types are shared across all Cairn crates and represent the
//! core domain entities: resources, their lifecycle, and indexed chunks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// RESOURCE TYPES
// =============================================================================

/// Kind of external content source a resource points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A website crawled from a root URL
    Website,
    /// A single web page
    Webpage,
    /// A video transcript
    Video,
    /// A source code repository
    Repository,
}

impl ResourceKind {
    /// All kinds, in registry order.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Website,
        ResourceKind::Webpage,
        ResourceKind::Video,
        ResourceKind::Repository,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Webpage => "webpage",
            Self::Video => "video",
            Self::Repository => "repository",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "website" => Ok(Self::Website),
            "webpage" => Ok(Self::Webpage),
            "video" => Ok(Self::Video),
            "repository" => Ok(Self::Repository),
            _ => Err(format!("Invalid resource kind: {}", s)),
        }
    }
}

/// Lifecycle state of a resource.
///
/// Normal progression is `Pending -> Loading -> Indexing -> Finished`.
/// An accepted update request moves `Finished` (or `Failed`) back to
/// `Pending`; any run error moves the resource to `Failed` with a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    /// Queued, waiting for a worker to claim it
    Pending,
    /// A worker is fetching content from the source
    Loading,
    /// Fetched content is being diffed and written to the index
    Indexing,
    /// Last synchronization completed successfully
    Finished,
    /// Last synchronization failed; see the resource's error field
    Failed,
}

impl ResourceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Loading => "loading",
            Self::Indexing => "indexing",
            Self::Finished => "finished",
            Self::Failed => "failed",
        }
    }

    /// True once a synchronization run has come to rest (success or failure).
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

impl std::fmt::Display for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResourceState {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "loading" => Ok(Self::Loading),
            "indexing" => Ok(Self::Indexing),
            "finished" => Ok(Self::Finished),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid resource state: {}", s)),
        }
    }
}

/// Type-specific defining parameters of a resource.
///
/// The variant fixes the resource kind, and the fields are exactly the
/// inputs to deterministic identity derivation (see [`crate::ident`]):
/// two specs with equal fields always map to the same resource id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResourceSpec {
    Website {
        url: String,
    },
    Webpage {
        url: String,
    },
    Video {
        url: String,
    },
    Repository {
        clone_url: String,
        /// Language filter passed through to the loader (e.g. "rust")
        language: String,
        /// Path filter within the repository (e.g. "src")
        paths: String,
        /// Branch to fetch; callers default this to "main" when unset
        branch: String,
    },
}

impl ResourceSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Website { .. } => ResourceKind::Website,
            Self::Webpage { .. } => ResourceKind::Webpage,
            Self::Video { .. } => ResourceKind::Video,
            Self::Repository { .. } => ResourceKind::Repository,
        }
    }
}

/// A registered external content source and its synchronization state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub kind: ResourceKind,
    pub project_id: String,
    pub spec: ResourceSpec,
    pub state: ResourceState,
    /// Failure reason, present while `state == Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// Parameters for registering a resource.
///
/// The id is derived from the spec and project before storage, which is
/// what makes resubmission of identical parameters a no-op.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub id: Uuid,
    pub name: String,
    pub project_id: String,
    pub spec: ResourceSpec,
}

impl NewResource {
    pub fn new(name: impl Into<String>, spec: ResourceSpec, project_id: impl Into<String>) -> Self {
        let project_id = project_id.into();
        let id = crate::ident::resource_identity(&spec, &project_id);
        Self {
            id,
            name: name.into(),
            project_id,
            spec,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.spec.kind()
    }
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A new resource row was created
    Created(Uuid),
    /// A resource with the same derived identity already exists
    AlreadyExists(Uuid),
}

impl RegisterOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Created(id) | Self::AlreadyExists(id) => *id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Outcome of a re-synchronization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Resource was moved back to Pending and will be re-synced
    Accepted,
    /// Rejected by the update cooldown; `since` is when the resource last settled
    Rejected { since: DateTime<Utc> },
    /// No resource with that id
    NotFound,
}

// =============================================================================
// CHUNK TYPES
// =============================================================================

/// One piece of loaded content as produced by a document loader.
///
/// The content hash is always the MD5 hex digest of `content`; chunks
/// built through [`DocumentChunk::new`] compute it on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Logical path within the source (file path, page URL, transcript URL)
    pub path: String,
    pub content: String,
    pub content_hash: String,
    /// Display metadata passed through to the index (title, URL, language, ...)
    #[serde(default)]
    pub metadata: JsonValue,
}

impl DocumentChunk {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let content_hash = crate::ident::content_checksum(&content);
        Self {
            path: path.into(),
            content,
            content_hash,
            metadata: JsonValue::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A persisted chunk row in the metadata store.
///
/// Rows are immutable: changed content at the same path produces a new
/// id (see [`crate::ident::chunk_id`]), never an in-place update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub source_type: ResourceKind,
    pub path: String,
    pub content_hash: String,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl ChunkRecord {
    /// Builds a record from loader output, deriving the deterministic chunk id.
    pub fn from_chunk(kind: ResourceKind, resource_id: Uuid, chunk: &DocumentChunk) -> Self {
        Self {
            id: crate::ident::chunk_id(kind, resource_id, &chunk.path, &chunk.content_hash),
            resource_id,
            source_type: kind,
            path: chunk.path.clone(),
            content_hash: chunk.content_hash.clone(),
            metadata: chunk.metadata.clone(),
            created_at: Utc::now(),
        }
    }
}

/// One (path, content hash) pair from the metadata store.
///
/// The set of entries for a resource is the stored side of the snapshot
/// diff; see [`crate::diff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub path: String,
    pub content_hash: String,
}

// =============================================================================
// SYNC TYPES
// =============================================================================

/// Counters describing one completed synchronization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Chunks produced by the loader, after in-run dedup
    pub fetched: usize,
    /// Chunks written to the vector index and metadata store
    pub inserted: usize,
    /// Stale chunk rows deleted from the vector index and metadata store
    pub deleted: usize,
    /// Paths left untouched because their content did not change
    pub unchanged_paths: usize,
}
