//! In-memory vector index for deterministic testing.
//!
//! Stores objects in a plain map and records every call, so tests can
//! assert not just the end state but how the engine talked to the
//! index (how many upserts a re-sync issued, which ids were deleted).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cairn_vector::InMemoryVectorIndex;
//!
//! let index = InMemoryVectorIndex::new();
//! index.upsert(id, "text", &metadata).await?;
//! assert_eq!(index.upsert_count(), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use cairn_core::{Error, Result, VectorIndex};

/// An object held by the in-memory index.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub text: String,
    pub metadata: JsonValue,
}

/// One recorded index interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCall {
    Upsert(Uuid),
    Delete(Uuid),
    Exists(Uuid),
}

/// In-memory vector index for testing.
#[derive(Clone, Default)]
pub struct InMemoryVectorIndex {
    objects: Arc<Mutex<HashMap<Uuid, StoredObject>>>,
    call_log: Arc<Mutex<Vec<IndexCall>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryVectorIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, for error-path testing.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<IndexCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Clear the call log, keeping stored objects.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    /// Number of recorded upsert calls.
    pub fn upsert_count(&self) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, IndexCall::Upsert(_)))
            .count()
    }

    /// Number of recorded delete calls.
    pub fn delete_count(&self) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, IndexCall::Delete(_)))
            .count()
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Whether the index holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.lock().unwrap().is_empty()
    }

    /// Whether an object is stored under `id`, without logging a call.
    pub fn contains(&self, id: Uuid) -> bool {
        self.objects.lock().unwrap().contains_key(&id)
    }

    /// Fetch a stored object, without logging a call.
    pub fn get(&self, id: Uuid) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(&id).cloned()
    }

    fn check_failing(&self, op: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::VectorIndex(format!(
                "Simulated {} failure",
                op
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, id: Uuid, text: &str, metadata: &JsonValue) -> Result<()> {
        self.call_log.lock().unwrap().push(IndexCall::Upsert(id));
        self.check_failing("upsert")?;

        self.objects.lock().unwrap().insert(
            id,
            StoredObject {
                text: text.to_string(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.call_log.lock().unwrap().push(IndexCall::Delete(id));
        self.check_failing("delete")?;

        // Absent ids are not an error, matching the HTTP backend.
        self.objects.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        self.call_log.lock().unwrap().push(IndexCall::Exists(id));
        self.check_failing("exists")?;

        Ok(self.objects.lock().unwrap().contains_key(&id))
    }
}
