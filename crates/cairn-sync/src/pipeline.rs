//! The per-resource synchronization pipeline.
//!
//! One run takes a claimed resource from Loading to Finished: fetch the
//! current content, diff it against the stored snapshot, and apply only
//! the delta to the vector index and metadata store.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info};
use uuid::Uuid;

use cairn_core::ident::chunk_id;
use cairn_core::{
    diff, snapshot_from_entries, ChunkRecord, ChunkRepository, DocumentChunk, Resource,
    ResourceRepository, ResourceState, Result, SyncReport, VectorIndex,
};

use crate::loader::LoaderRegistry;

/// Synchronize one claimed resource.
///
/// The caller owns failure handling: any error leaves the resource in
/// Loading or Indexing, and the worker marks it Failed. Writes are not
/// transactional across chunks; a partially applied run converges on
/// the next one because the diff re-derives the remaining delta from
/// the stored snapshot.
pub async fn sync_resource(
    resources: &dyn ResourceRepository,
    chunks: &dyn ChunkRepository,
    index: &dyn VectorIndex,
    loaders: &LoaderRegistry,
    resource: &Resource,
) -> Result<SyncReport> {
    let start = Instant::now();

    let loader = loaders.get(resource.kind)?;
    let loaded = loader.load(resource).await?;
    let records = dedup_chunks(resource, loaded);
    let fetched = records.len();

    resources
        .set_state(resource.id, ResourceState::Indexing)
        .await?;

    let old_entries = chunks.snapshot(resource.id).await?;
    let old = snapshot_from_entries(
        old_entries
            .iter()
            .map(|e| (e.path.clone(), e.content_hash.clone())),
    );
    let new = snapshot_from_entries(
        records
            .iter()
            .map(|(r, _)| (r.path.clone(), r.content_hash.clone())),
    );
    let delta = diff(&old, &new);

    // Stale ids re-derive exactly from the stored (path, hash) pairs,
    // the same inputs their rows were written under.
    let delete_paths = delta.delete_paths();
    let delete_ids: Vec<Uuid> = old_entries
        .iter()
        .filter(|e| delete_paths.contains(e.path.as_str()))
        .map(|e| chunk_id(resource.kind, resource.id, &e.path, &e.content_hash))
        .collect();

    // Delete before insert, vector index first: a chunk row without an
    // index object is invisible, an index object without a row would
    // never be cleaned up.
    for id in &delete_ids {
        index.delete(*id).await?;
    }
    let deleted = chunks.delete_ids(&delete_ids).await? as usize;

    let mut to_save = Vec::new();
    for (record, chunk) in &records {
        if !delta.changed.contains(record.path.as_str()) {
            continue;
        }
        index
            .upsert(record.id, &chunk.content, &record.metadata)
            .await?;
        to_save.push(record.clone());
    }
    chunks.save(&to_save).await?;
    let inserted = to_save.len();

    resources
        .set_state(resource.id, ResourceState::Finished)
        .await?;

    let report = SyncReport {
        fetched,
        inserted,
        deleted,
        unchanged_paths: new.len() - delta.changed.len(),
    };
    info!(
        subsystem = "sync",
        component = "pipeline",
        resource_id = %resource.id,
        kind = %resource.kind,
        fetched = report.fetched,
        inserted = report.inserted,
        deleted = report.deleted,
        unchanged = report.unchanged_paths,
        duration_ms = start.elapsed().as_millis() as u64,
        "Resource synchronized"
    );
    Ok(report)
}

/// Pair each loaded chunk with its record, dropping id duplicates.
///
/// Ids are content-derived, so two chunks with the same path and hash
/// collapse to one; the first occurrence wins.
fn dedup_chunks(
    resource: &Resource,
    loaded: Vec<DocumentChunk>,
) -> Vec<(ChunkRecord, DocumentChunk)> {
    let raw = loaded.len();
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(raw);
    for chunk in loaded {
        let record = ChunkRecord::from_chunk(resource.kind, resource.id, &chunk);
        if seen.insert(record.id) {
            records.push((record, chunk));
        }
    }
    if records.len() < raw {
        debug!(
            subsystem = "sync",
            component = "pipeline",
            resource_id = %resource.id,
            dropped = raw - records.len(),
            "Dropped duplicate chunks from fetch"
        );
    }
    records
}
