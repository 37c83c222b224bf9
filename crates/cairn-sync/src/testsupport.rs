//! Scripted document loader for deterministic testing.
//!
//! Each load consumes the next scripted outcome, so a test controls
//! exactly what every run fetches, run by run. An exhausted script
//! fails loudly instead of returning stale content.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use cairn_core::{DocumentChunk, DocumentLoader, Error, Resource, ResourceKind, Result};

enum ScriptedRun {
    Chunks(Vec<DocumentChunk>),
    Failure(String),
}

/// One recorded load invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCall {
    pub resource_id: Uuid,
    pub kind: ResourceKind,
}

/// Loader whose runs consume a scripted queue of outcomes.
#[derive(Clone, Default)]
pub struct ScriptedLoader {
    script: Arc<Mutex<VecDeque<ScriptedRun>>>,
    call_log: Arc<Mutex<Vec<LoadCall>>>,
    latency_ms: Arc<AtomicU64>,
}

impl ScriptedLoader {
    /// Create a loader with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful load returning these chunks.
    pub fn push_chunks(&self, chunks: Vec<DocumentChunk>) {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedRun::Chunks(chunks));
    }

    /// Queue a failing load.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedRun::Failure(message.into()));
    }

    /// Set simulated latency for every load.
    pub fn with_latency_ms(self, latency_ms: u64) -> Self {
        self.latency_ms.store(latency_ms, Ordering::SeqCst);
        self
    }

    /// Get all recorded load calls.
    pub fn calls(&self) -> Vec<LoadCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of load calls made so far.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// Number of scripted outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentLoader for ScriptedLoader {
    async fn load(&self, resource: &Resource) -> Result<Vec<DocumentChunk>> {
        self.call_log.lock().unwrap().push(LoadCall {
            resource_id: resource.id,
            kind: resource.kind,
        });

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        let run = self.script.lock().unwrap().pop_front();
        match run {
            Some(ScriptedRun::Chunks(chunks)) => Ok(chunks),
            Some(ScriptedRun::Failure(message)) => Err(Error::Loader(message)),
            None => Err(Error::Loader("Scripted loader exhausted".to_string())),
        }
    }
}
