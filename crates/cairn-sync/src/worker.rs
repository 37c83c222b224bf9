//! Synchronization worker draining the pending-resource queue.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, Notify};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use cairn_core::{defaults, Resource, ResourceKind, ResourceRepository, SyncReport, VectorIndex};
use cairn_db::Database;

use crate::loader::LoaderRegistry;
use crate::pipeline::sync_resource;
use crate::DEFAULT_POLL_INTERVAL_MS;

/// Configuration for the synchronization worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Polling interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum number of concurrent synchronization runs.
    pub max_concurrent: usize,
    /// Per-run timeout in seconds.
    pub run_timeout_secs: u64,
    /// Whether to enable synchronization processing.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_concurrent: defaults::SYNC_MAX_CONCURRENT,
            run_timeout_secs: defaults::SYNC_RUN_TIMEOUT_SECS,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SYNC_WORKER_ENABLED` | `true` | Enable/disable synchronization |
    /// | `SYNC_MAX_CONCURRENT` | `4` | Max concurrent runs |
    /// | `SYNC_POLL_INTERVAL_MS` | `500` | Polling interval when the queue is empty |
    /// | `SYNC_RUN_TIMEOUT_SECS` | `600` | Per-run timeout |
    pub fn from_env() -> Self {
        let enabled = std::env::var("SYNC_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let max_concurrent = std::env::var("SYNC_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::SYNC_MAX_CONCURRENT)
            .max(1);

        let poll_interval_ms = std::env::var("SYNC_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        let run_timeout_secs = std::env::var("SYNC_RUN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::SYNC_RUN_TIMEOUT_SECS);

        Self {
            poll_interval_ms,
            max_concurrent,
            run_timeout_secs,
            enabled,
        }
    }

    /// Create a new config with custom poll interval.
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set maximum concurrent runs.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Set the per-run timeout in seconds.
    pub fn with_run_timeout(mut self, secs: u64) -> Self {
        self.run_timeout_secs = secs;
        self
    }

    /// Enable or disable synchronization processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the synchronization worker.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A synchronization run was started.
    SyncStarted {
        resource_id: Uuid,
        kind: ResourceKind,
    },
    /// A run completed successfully.
    SyncFinished {
        resource_id: Uuid,
        kind: ResourceKind,
        report: SyncReport,
    },
    /// A run failed and the resource was marked Failed.
    SyncFailed {
        resource_id: Uuid,
        kind: ResourceKind,
        error: String,
    },
    /// Worker started.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<SyncEvent>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    pub async fn shutdown(&self) -> cairn_core::Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| cairn_core::Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_rx.resubscribe()
    }
}

/// Worker that drains pending resources from the registry.
pub struct SyncWorker {
    db: Database,
    index: Arc<dyn VectorIndex>,
    loaders: Arc<LoaderRegistry>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl SyncWorker {
    /// Create a new synchronization worker.
    pub fn new(
        db: Database,
        index: Arc<dyn VectorIndex>,
        loaders: LoaderRegistry,
        config: WorkerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_CHANNEL_CAPACITY);
        Self {
            db,
            index,
            loaders: Arc::new(loaders),
            config,
            event_tx,
        }
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    /// Run the worker loop with concurrent synchronization runs.
    ///
    /// Claims up to `max_concurrent` pending resources at a time. When
    /// the queue is empty the loop parks on the registry's wake-up
    /// handle; the poll interval is the backstop for wake-ups that land
    /// between an empty claim and the park.
    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Synchronization worker is disabled, not starting");
            return;
        }

        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            max_concurrent = self.config.max_concurrent,
            run_timeout_secs = self.config.run_timeout_secs,
            "Synchronization worker started"
        );

        let _ = self.event_tx.send(SyncEvent::WorkerStarted);

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let pending: Arc<Notify> = self.db.resources.pending_notify();

        loop {
            // Check for shutdown before claiming
            if shutdown_rx.try_recv().is_ok() {
                info!("Synchronization worker received shutdown signal");
                break;
            }

            // Claim up to max_concurrent resources
            let mut claimed = 0;
            let mut tasks = tokio::task::JoinSet::new();

            for _ in 0..self.config.max_concurrent {
                match self.claim_resource().await {
                    Some(resource) => {
                        claimed += 1;
                        let worker = self.clone_refs();
                        tasks.spawn(async move {
                            worker.execute_sync(resource).await;
                        });
                    }
                    None => break,
                }
            }

            if claimed == 0 {
                // Queue empty — park until woken or the poll backstop
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Synchronization worker received shutdown signal");
                        break;
                    }
                    _ = pending.notified() => {}
                    _ = sleep(poll_interval) => {}
                }
            } else {
                debug!(claimed, "Processing concurrent synchronization batch");
                // Wait for the whole batch before claiming more
                while let Some(result) = tasks.join_next().await {
                    if let Err(e) = result {
                        error!(error = ?e, "Synchronization task panicked");
                    }
                }
            }
        }

        let _ = self.event_tx.send(SyncEvent::WorkerStopped);
        info!("Synchronization worker stopped");
    }

    /// Claim the next pending resource without processing it.
    async fn claim_resource(&self) -> Option<Resource> {
        match self.db.resources.claim_next_pending().await {
            Ok(Some(resource)) => Some(resource),
            Ok(None) => None,
            Err(e) => {
                error!(error = ?e, "Failed to claim pending resource");
                None
            }
        }
    }

    /// Clone references needed for spawned run tasks.
    fn clone_refs(&self) -> SyncWorkerRef {
        SyncWorkerRef {
            db: self.db.clone(),
            index: self.index.clone(),
            loaders: self.loaders.clone(),
            event_tx: self.event_tx.clone(),
            run_timeout_secs: self.config.run_timeout_secs,
        }
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }
}

/// Lightweight reference bundle for executing a single run in a
/// spawned task.
struct SyncWorkerRef {
    db: Database,
    index: Arc<dyn VectorIndex>,
    loaders: Arc<LoaderRegistry>,
    event_tx: broadcast::Sender<SyncEvent>,
    run_timeout_secs: u64,
}

impl SyncWorkerRef {
    /// Execute a single claimed synchronization run.
    async fn execute_sync(self, resource: Resource) {
        let start = Instant::now();
        let resource_id = resource.id;
        let kind = resource.kind;

        info!(
            subsystem = "sync",
            component = "worker",
            resource_id = %resource_id,
            kind = %kind,
            "Processing resource"
        );
        let _ = self
            .event_tx
            .send(SyncEvent::SyncStarted { resource_id, kind });

        let run_timeout = Duration::from_secs(self.run_timeout_secs);
        let run = sync_resource(
            &self.db.resources,
            &self.db.chunks,
            self.index.as_ref(),
            &self.loaders,
            &resource,
        );

        let outcome = match tokio::time::timeout(run_timeout, run).await {
            Ok(outcome) => outcome,
            Err(_) => Err(cairn_core::Error::Timeout(format!(
                "Synchronization exceeded timeout of {}s",
                self.run_timeout_secs
            ))),
        };

        match outcome {
            Ok(report) => {
                info!(
                    subsystem = "sync",
                    component = "worker",
                    resource_id = %resource_id,
                    kind = %kind,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Synchronization completed"
                );
                let _ = self.event_tx.send(SyncEvent::SyncFinished {
                    resource_id,
                    kind,
                    report,
                });
            }
            Err(e) => {
                let error = e.to_string();
                if let Err(mark) = self.db.resources.set_failed(resource_id, &error).await {
                    error!(
                        error = ?mark,
                        resource_id = %resource_id,
                        "Failed to mark resource as failed"
                    );
                }
                warn!(
                    subsystem = "sync",
                    component = "worker",
                    resource_id = %resource_id,
                    kind = %kind,
                    %error,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Synchronization failed"
                );
                let _ = self.event_tx.send(SyncEvent::SyncFailed {
                    resource_id,
                    kind,
                    error,
                });
            }
        }
    }
}
