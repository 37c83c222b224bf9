//! Deterministic identity derivation.
//!
//! Resource and chunk ids are UUIDv5 values over fixed per-kind
//! namespaces, so identical defining parameters always derive the same
//! id. This is the dedup key for the whole engine: resubmitting a
//! resource, or re-inserting a chunk whose content did not change, hits
//! an existing id instead of creating a duplicate.

use uuid::{uuid, Uuid};

use crate::models::{ResourceKind, ResourceSpec};

/// Resource id namespaces, one per kind.
///
/// These values are fixed for the life of the deployment: changing one
/// would re-identify every resource of that kind and orphan its chunks.
pub const WEBSITE_NAMESPACE: Uuid = uuid!("f6eea9d5-8b70-11ee-b7b1-6c02e09469ba");
pub const WEBPAGE_NAMESPACE: Uuid = uuid!("a715a944-5eab-4293-9de5-d5c7989eb1fc");
pub const VIDEO_NAMESPACE: Uuid = uuid!("05980ffd-3506-4b2d-af0c-7c0afdbfe57e");
pub const REPOSITORY_NAMESPACE: Uuid = uuid!("b734ee40-169b-4c9e-9dd0-6bede6e6dfa3");

/// Chunk id namespaces, one per source kind.
pub const WEBSITE_CHUNK_NAMESPACE: Uuid = uuid!("c88b857e-be16-4d80-9f45-b5c41fdd4a11");
pub const WEBPAGE_CHUNK_NAMESPACE: Uuid = uuid!("f924e0a9-69a7-11ee-aa84-6c02e09469ba");
pub const VIDEO_CHUNK_NAMESPACE: Uuid = uuid!("1572e8de-29bf-464e-9253-656bd7c78938");
pub const REPOSITORY_CHUNK_NAMESPACE: Uuid = uuid!("86adfa90-25d6-45bc-894c-8e1bb5c8ce76");

fn resource_namespace(kind: ResourceKind) -> Uuid {
    match kind {
        ResourceKind::Website => WEBSITE_NAMESPACE,
        ResourceKind::Webpage => WEBPAGE_NAMESPACE,
        ResourceKind::Video => VIDEO_NAMESPACE,
        ResourceKind::Repository => REPOSITORY_NAMESPACE,
    }
}

fn chunk_namespace(kind: ResourceKind) -> Uuid {
    match kind {
        ResourceKind::Website => WEBSITE_CHUNK_NAMESPACE,
        ResourceKind::Webpage => WEBPAGE_CHUNK_NAMESPACE,
        ResourceKind::Video => VIDEO_CHUNK_NAMESPACE,
        ResourceKind::Repository => REPOSITORY_CHUNK_NAMESPACE,
    }
}

/// Derives the resource id from its defining parameters.
///
/// The seed is a plain concatenation: `url + project_id` for URL-based
/// kinds, `clone_url + language + paths + branch + project_id` for
/// repositories. The display name never participates.
pub fn resource_identity(spec: &ResourceSpec, project_id: &str) -> Uuid {
    let seed = match spec {
        ResourceSpec::Website { url }
        | ResourceSpec::Webpage { url }
        | ResourceSpec::Video { url } => format!("{}{}", url, project_id),
        ResourceSpec::Repository {
            clone_url,
            language,
            paths,
            branch,
        } => format!("{}{}{}{}{}", clone_url, language, paths, branch, project_id),
    };
    Uuid::new_v5(&resource_namespace(spec.kind()), seed.as_bytes())
}

/// Derives the chunk id for content at a logical path.
///
/// Seed shape is `"{kind}:{resource_id}:{path}:{content_hash}"`, so
/// identical content at the same path of the same resource always maps
/// to the same id, and changed content maps to a fresh one.
pub fn chunk_id(kind: ResourceKind, resource_id: Uuid, path: &str, content_hash: &str) -> Uuid {
    let seed = format!("{}:{}:{}:{}", kind.as_str(), resource_id, path, content_hash);
    Uuid::new_v5(&chunk_namespace(kind), seed.as_bytes())
}

/// MD5 hex digest of chunk text, the content hash used everywhere.
pub fn content_checksum(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}
