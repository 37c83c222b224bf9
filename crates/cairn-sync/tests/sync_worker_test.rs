//! Integration tests for the synchronization worker.
//!
//! This test suite validates:
//! - Pending resources are processed end to end
//! - Loader failures mark the resource Failed with the reason
//! - The per-run timeout bounds hung loaders
//! - Event broadcasting over the worker handle
//! - Wake-up on submission without waiting for the poll interval
//! - Graceful shutdown and boot-time resume

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use uuid::Uuid;

use cairn_core::{DocumentChunk, ResourceRepository, ResourceState};
use cairn_db::Database;
use cairn_sync::{
    LoaderRegistry, ResourceService, ScriptedLoader, SyncEvent, SyncWorker, WorkerConfig,
};
use cairn_vector::InMemoryVectorIndex;

struct Harness {
    db: Database,
    index: InMemoryVectorIndex,
    loader: ScriptedLoader,
    registry: LoaderRegistry,
    service: ResourceService,
}

async fn setup() -> Harness {
    let db = Database::connect_memory()
        .await
        .expect("Failed to open in-memory database");
    let index = InMemoryVectorIndex::new();
    let loader = ScriptedLoader::new();
    let registry = LoaderRegistry::new().register_all(Arc::new(loader.clone()));
    let service = ResourceService::new(db.clone(), Arc::new(index.clone()));
    Harness {
        db,
        index,
        loader,
        registry,
        service,
    }
}

impl Harness {
    fn worker(&self, config: WorkerConfig) -> SyncWorker {
        SyncWorker::new(
            self.db.clone(),
            Arc::new(self.index.clone()),
            self.registry.clone(),
            config,
        )
    }
}

/// Poll until the resource reaches the expected state.
async fn wait_for_state(
    db: &Database,
    id: Uuid,
    expected: ResourceState,
    timeout_secs: u64,
) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed().as_secs() < timeout_secs {
        if let Ok(Some(state)) = db.resources.status(id).await {
            if state == expected {
                return true;
            }
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_worker_processes_pending_resource() {
    let h = setup().await;
    h.loader
        .push_chunks(vec![DocumentChunk::new("docs/intro.md", "hello world")]);

    let id = h
        .service
        .submit_website("Docs", "https://docs.example.com", "proj-1")
        .await
        .expect("submit")
        .expect("created");

    let handle = h
        .worker(WorkerConfig::default().with_poll_interval(50).with_max_concurrent(2))
        .start();

    assert!(
        wait_for_state(&h.db, id, ResourceState::Finished, 5).await,
        "resource should finish"
    );
    assert_eq!(h.service.chunk_count(id).await.expect("count"), 1);
    assert_eq!(h.index.len(), 1);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_worker_marks_loader_failure() {
    let h = setup().await;
    h.loader.push_failure("crawler returned 503");

    let id = h
        .service
        .submit_website("Docs", "https://docs.example.com", "proj-1")
        .await
        .expect("submit")
        .expect("created");

    let handle = h.worker(WorkerConfig::default().with_poll_interval(50)).start();

    assert!(
        wait_for_state(&h.db, id, ResourceState::Failed, 5).await,
        "resource should fail"
    );
    let resource = h.service.get(id).await.expect("get").expect("exists");
    let reason = resource.error.expect("failure reason recorded");
    assert!(reason.contains("crawler returned 503"), "got: {reason}");

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_worker_enforces_run_timeout() {
    let h = setup().await;
    // A load that would outlive the run timeout by far.
    let loader = ScriptedLoader::new().with_latency_ms(10_000);
    loader.push_chunks(vec![DocumentChunk::new("docs/intro.md", "hello world")]);
    let registry = LoaderRegistry::new().register_all(Arc::new(loader));

    let id = h
        .service
        .submit_website("Docs", "https://docs.example.com", "proj-1")
        .await
        .expect("submit")
        .expect("created");

    let handle = SyncWorker::new(
        h.db.clone(),
        Arc::new(h.index.clone()),
        registry,
        WorkerConfig::default()
            .with_poll_interval(50)
            .with_run_timeout(1),
    )
    .start();

    assert!(
        wait_for_state(&h.db, id, ResourceState::Failed, 5).await,
        "hung run should be failed by the timeout"
    );
    let resource = h.service.get(id).await.expect("get").expect("exists");
    let reason = resource.error.expect("timeout reason recorded");
    assert!(reason.contains("timeout"), "got: {reason}");
    assert!(h.index.is_empty(), "nothing was indexed");

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_worker_emits_sync_events() {
    let h = setup().await;
    h.loader
        .push_chunks(vec![DocumentChunk::new("docs/intro.md", "hello world")]);

    let handle = h.worker(WorkerConfig::default().with_poll_interval(50)).start();
    let mut events = handle.events();

    let id = h
        .service
        .submit_website("Docs", "https://docs.example.com", "proj-1")
        .await
        .expect("submit")
        .expect("created");

    let mut started = false;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let event = tokio::time::timeout_at(deadline, events.recv())
            .await
            .expect("worker should emit events in time")
            .expect("event channel open");
        match event {
            SyncEvent::SyncStarted { resource_id, .. } if resource_id == id => {
                started = true;
            }
            SyncEvent::SyncFinished {
                resource_id,
                report,
                ..
            } if resource_id == id => {
                assert!(started, "start event precedes finish");
                assert_eq!(report.fetched, 1);
                assert_eq!(report.inserted, 1);
                break;
            }
            _ => {}
        }
    }

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_worker_wakes_on_submission() {
    let h = setup().await;
    h.loader
        .push_chunks(vec![DocumentChunk::new("docs/intro.md", "hello world")]);

    // A poll interval far beyond the test deadline: only the wake-up
    // from the registration can get this claimed in time.
    let handle = h
        .worker(WorkerConfig::default().with_poll_interval(60_000))
        .start();
    sleep(Duration::from_millis(300)).await;

    let id = h
        .service
        .submit_website("Docs", "https://docs.example.com", "proj-1")
        .await
        .expect("submit")
        .expect("created");

    assert!(
        wait_for_state(&h.db, id, ResourceState::Finished, 5).await,
        "submission should wake the parked worker"
    );

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn test_worker_graceful_shutdown() {
    let h = setup().await;

    let handle = h.worker(WorkerConfig::default().with_poll_interval(50)).start();
    let mut events = handle.events();
    sleep(Duration::from_millis(100)).await;

    handle.shutdown().await.expect("shutdown");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        let event = tokio::time::timeout_at(deadline, events.recv())
            .await
            .expect("worker should stop in time")
            .expect("event channel open");
        if matches!(event, SyncEvent::WorkerStopped) {
            break;
        }
    }
}

#[tokio::test]
async fn test_disabled_worker_does_not_claim() {
    let h = setup().await;
    h.loader
        .push_chunks(vec![DocumentChunk::new("docs/intro.md", "hello world")]);

    let id = h
        .service
        .submit_website("Docs", "https://docs.example.com", "proj-1")
        .await
        .expect("submit")
        .expect("created");

    let _handle = h
        .worker(WorkerConfig::default().with_poll_interval(50).with_enabled(false))
        .start();
    sleep(Duration::from_millis(300)).await;

    assert_eq!(
        h.service.status(id).await.expect("status"),
        Some(ResourceState::Pending),
        "a disabled worker must not touch the queue"
    );
}

#[tokio::test]
async fn test_resume_then_worker_picks_up_interrupted_run() {
    let h = setup().await;
    h.loader
        .push_chunks(vec![DocumentChunk::new("docs/intro.md", "hello world")]);

    let id = h
        .service
        .submit_website("Docs", "https://docs.example.com", "proj-1")
        .await
        .expect("submit")
        .expect("created");

    // Claim without running, as if the process died mid-sync.
    h.db.resources
        .claim_next_pending()
        .await
        .expect("claim")
        .expect("claimed");
    assert_eq!(
        h.service.status(id).await.expect("status"),
        Some(ResourceState::Loading)
    );

    // Boot sequence: resume, then start the worker.
    let resumed = h.service.resume().await.expect("resume");
    assert_eq!(resumed, 1);

    let handle = h.worker(WorkerConfig::default().with_poll_interval(50)).start();
    assert!(
        wait_for_state(&h.db, id, ResourceState::Finished, 5).await,
        "resumed resource should finish"
    );
    assert_eq!(h.service.chunk_count(id).await.expect("count"), 1);

    handle.shutdown().await.expect("shutdown");
}
