//! Integration tests for the resource registry.
//!
//! This test suite validates:
//! - Registration and duplicate detection via the deterministic id
//! - Lifecycle state transitions and failure reasons
//! - Listing by project, kind, and unfinished state
//! - Atomic claim of the oldest pending resource
//! - Update cooldown enforcement in `begin_update`
//! - Boot-time re-queue of interrupted synchronizations
//! - Pending-queue wake-ups over the shared `Notify`

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use uuid::Uuid;

use cairn_db::{
    Database, NewResource, RegisterOutcome, ResourceKind, ResourceRepository, ResourceSpec,
    ResourceState, UpdateOutcome,
};

/// Helper to open a fresh in-memory database.
async fn setup_test_db() -> Database {
    Database::connect_memory()
        .await
        .expect("Failed to open in-memory database")
}

fn website(name: &str, url: &str, project: &str) -> NewResource {
    NewResource::new(
        name,
        ResourceSpec::Website {
            url: url.to_string(),
        },
        project,
    )
}

/// Rewrite a resource's timestamp directly, bypassing the repository,
/// to simulate rows last touched in the past.
async fn backdate_last_updated(db: &Database, id: Uuid, hours: i64) {
    let ts = Utc::now() - Duration::hours(hours);
    sqlx::query("UPDATE resources SET last_updated_at = $1 WHERE id = $2")
        .bind(ts)
        .bind(id)
        .execute(db.pool())
        .await
        .expect("Failed to backdate resource");
}

#[tokio::test]
async fn test_register_creates_pending_resource() {
    let db = setup_test_db().await;

    let new = website("Docs", "https://docs.example.com", "proj-1");
    let id = new.id;
    let outcome = db.resources.register(new).await.expect("register");

    assert_eq!(outcome, RegisterOutcome::Created(id));

    let resource = db
        .resources
        .get(id)
        .await
        .expect("get")
        .expect("resource should exist");
    assert_eq!(resource.id, id);
    assert_eq!(resource.name, "Docs");
    assert_eq!(resource.kind, ResourceKind::Website);
    assert_eq!(resource.project_id, "proj-1");
    assert_eq!(resource.state, ResourceState::Pending);
    assert!(resource.error.is_none());
}

#[tokio::test]
async fn test_register_duplicate_leaves_existing_row_untouched() {
    let db = setup_test_db().await;

    let first = website("Original name", "https://docs.example.com", "proj-1");
    let id = first.id;
    db.resources.register(first).await.expect("first register");
    db.resources
        .set_state(id, ResourceState::Finished)
        .await
        .expect("finish");

    // Same identity fields, different display name.
    let dup = website("Renamed", "https://docs.example.com", "proj-1");
    assert_eq!(dup.id, id);
    let outcome = db.resources.register(dup).await.expect("dup register");

    assert_eq!(outcome, RegisterOutcome::AlreadyExists(id));
    assert!(!outcome.is_created());

    let resource = db.resources.get(id).await.expect("get").expect("exists");
    assert_eq!(resource.name, "Original name");
    assert_eq!(resource.state, ResourceState::Finished);
}

#[tokio::test]
async fn test_spec_round_trips_through_storage() {
    let db = setup_test_db().await;

    let new = NewResource::new(
        "Engine",
        ResourceSpec::Repository {
            clone_url: "https://github.com/example/engine.git".to_string(),
            language: "rust".to_string(),
            paths: "src".to_string(),
            branch: "main".to_string(),
        },
        "proj-1",
    );
    let id = new.id;
    db.resources.register(new).await.expect("register");

    let resource = db.resources.get(id).await.expect("get").expect("exists");
    assert_eq!(resource.kind, ResourceKind::Repository);
    match resource.spec {
        ResourceSpec::Repository {
            clone_url,
            language,
            paths,
            branch,
        } => {
            assert_eq!(clone_url, "https://github.com/example/engine.git");
            assert_eq!(language, "rust");
            assert_eq!(paths, "src");
            assert_eq!(branch, "main");
        }
        other => panic!("expected repository spec, got {other:?}"),
    }
}

#[tokio::test]
async fn test_set_state_and_status() {
    let db = setup_test_db().await;

    let new = website("Docs", "https://docs.example.com", "proj-1");
    let id = new.id;
    db.resources.register(new).await.expect("register");

    db.resources
        .set_state(id, ResourceState::Indexing)
        .await
        .expect("set_state");

    let status = db.resources.status(id).await.expect("status");
    assert_eq!(status, Some(ResourceState::Indexing));

    let missing = db.resources.status(Uuid::new_v4()).await.expect("status");
    assert_eq!(missing, None);
}

#[tokio::test]
async fn test_set_state_unknown_id_is_an_error() {
    let db = setup_test_db().await;

    let err = db
        .resources
        .set_state(Uuid::new_v4(), ResourceState::Finished)
        .await
        .expect_err("unknown id should fail");
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_set_failed_records_reason_and_set_state_clears_it() {
    let db = setup_test_db().await;

    let new = website("Docs", "https://docs.example.com", "proj-1");
    let id = new.id;
    db.resources.register(new).await.expect("register");

    db.resources
        .set_failed(id, "loader returned 503")
        .await
        .expect("set_failed");

    let resource = db.resources.get(id).await.expect("get").expect("exists");
    assert_eq!(resource.state, ResourceState::Failed);
    assert_eq!(resource.error.as_deref(), Some("loader returned 503"));

    db.resources
        .set_state(id, ResourceState::Pending)
        .await
        .expect("set_state");

    let resource = db.resources.get(id).await.expect("get").expect("exists");
    assert_eq!(resource.state, ResourceState::Pending);
    assert!(resource.error.is_none());
}

#[tokio::test]
async fn test_listing_by_project_kind_and_unfinished() {
    let db = setup_test_db().await;

    let a = website("A", "https://a.example.com", "proj-1");
    let b = website("B", "https://b.example.com", "proj-2");
    let c = NewResource::new(
        "C",
        ResourceSpec::Video {
            url: "https://videos.example.com/v/1".to_string(),
        },
        "proj-1",
    );
    let (a_id, b_id, c_id) = (a.id, b.id, c.id);
    db.resources.register(a).await.expect("register a");
    db.resources.register(b).await.expect("register b");
    db.resources.register(c).await.expect("register c");

    db.resources
        .set_state(a_id, ResourceState::Finished)
        .await
        .expect("finish a");

    let all = db.resources.list_all().await.expect("list_all");
    assert_eq!(all.len(), 3);

    let proj1 = db
        .resources
        .list_by_project("proj-1")
        .await
        .expect("list_by_project");
    let proj1_ids: Vec<Uuid> = proj1.iter().map(|r| r.id).collect();
    assert_eq!(proj1.len(), 2);
    assert!(proj1_ids.contains(&a_id));
    assert!(proj1_ids.contains(&c_id));

    let videos = db
        .resources
        .list_by_kind(ResourceKind::Video)
        .await
        .expect("list_by_kind");
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, c_id);

    let unfinished = db.resources.list_unfinished().await.expect("unfinished");
    let unfinished_ids: Vec<Uuid> = unfinished.iter().map(|r| r.id).collect();
    assert_eq!(unfinished.len(), 2);
    assert!(unfinished_ids.contains(&b_id));
    assert!(unfinished_ids.contains(&c_id));
}

#[tokio::test]
async fn test_claim_next_pending_takes_oldest_first() {
    let db = setup_test_db().await;

    let newer = website("Newer", "https://new.example.com", "proj-1");
    let older = website("Older", "https://old.example.com", "proj-1");
    let (newer_id, older_id) = (newer.id, older.id);
    db.resources.register(newer).await.expect("register newer");
    db.resources.register(older).await.expect("register older");
    backdate_last_updated(&db, older_id, 2).await;

    let first = db
        .resources
        .claim_next_pending()
        .await
        .expect("claim")
        .expect("should claim a resource");
    assert_eq!(first.id, older_id);
    assert_eq!(first.state, ResourceState::Loading);

    // The claim is visible to other readers immediately.
    let status = db.resources.status(older_id).await.expect("status");
    assert_eq!(status, Some(ResourceState::Loading));

    let second = db
        .resources
        .claim_next_pending()
        .await
        .expect("claim")
        .expect("second claim");
    assert_eq!(second.id, newer_id);

    let third = db.resources.claim_next_pending().await.expect("claim");
    assert!(third.is_none(), "queue should be drained");
}

#[tokio::test]
async fn test_claim_skips_settled_resources() {
    let db = setup_test_db().await;

    let done = website("Done", "https://done.example.com", "proj-1");
    let done_id = done.id;
    db.resources.register(done).await.expect("register");
    db.resources
        .set_state(done_id, ResourceState::Finished)
        .await
        .expect("finish");

    let claimed = db.resources.claim_next_pending().await.expect("claim");
    assert!(claimed.is_none());
}

#[tokio::test]
async fn test_begin_update_rejects_inside_cooldown() {
    let db = setup_test_db().await;

    let new = website("Docs", "https://docs.example.com", "proj-1");
    let id = new.id;
    db.resources.register(new).await.expect("register");
    db.resources
        .set_state(id, ResourceState::Finished)
        .await
        .expect("finish");

    let before = db.resources.get(id).await.expect("get").expect("exists");

    let outcome = db
        .resources
        .begin_update(id, Duration::hours(24))
        .await
        .expect("begin_update");
    assert_eq!(
        outcome,
        UpdateOutcome::Rejected {
            since: before.last_updated_at
        }
    );

    // Rejection leaves the row untouched.
    let status = db.resources.status(id).await.expect("status");
    assert_eq!(status, Some(ResourceState::Finished));
}

#[tokio::test]
async fn test_begin_update_accepts_after_cooldown() {
    let db = setup_test_db().await;

    let new = website("Docs", "https://docs.example.com", "proj-1");
    let id = new.id;
    db.resources.register(new).await.expect("register");
    db.resources
        .set_state(id, ResourceState::Finished)
        .await
        .expect("finish");
    backdate_last_updated(&db, id, 25).await;

    let outcome = db
        .resources
        .begin_update(id, Duration::hours(24))
        .await
        .expect("begin_update");
    assert_eq!(outcome, UpdateOutcome::Accepted);

    let status = db.resources.status(id).await.expect("status");
    assert_eq!(status, Some(ResourceState::Pending));
}

#[tokio::test]
async fn test_begin_update_failed_resource_bypasses_cooldown() {
    let db = setup_test_db().await;

    let new = website("Docs", "https://docs.example.com", "proj-1");
    let id = new.id;
    db.resources.register(new).await.expect("register");
    db.resources
        .set_failed(id, "loader returned 503")
        .await
        .expect("set_failed");

    // Failure just happened; a failed resource is retryable at once.
    let outcome = db
        .resources
        .begin_update(id, Duration::hours(24))
        .await
        .expect("begin_update");
    assert_eq!(outcome, UpdateOutcome::Accepted);

    let resource = db.resources.get(id).await.expect("get").expect("exists");
    assert_eq!(resource.state, ResourceState::Pending);
    assert!(resource.error.is_none(), "retry should clear the reason");
}

#[tokio::test]
async fn test_begin_update_rejects_resource_in_flight() {
    let db = setup_test_db().await;

    let new = website("Docs", "https://docs.example.com", "proj-1");
    let id = new.id;
    db.resources.register(new).await.expect("register");
    backdate_last_updated(&db, id, 48).await;

    // Pending is not a settled state, however old the row is.
    let outcome = db
        .resources
        .begin_update(id, Duration::hours(24))
        .await
        .expect("begin_update");
    assert!(matches!(outcome, UpdateOutcome::Rejected { .. }));
}

#[tokio::test]
async fn test_begin_update_unknown_id_is_not_found() {
    let db = setup_test_db().await;

    let outcome = db
        .resources
        .begin_update(Uuid::new_v4(), Duration::hours(24))
        .await
        .expect("begin_update");
    assert_eq!(outcome, UpdateOutcome::NotFound);
}

#[tokio::test]
async fn test_requeue_interrupted_resets_in_flight_states() {
    let db = setup_test_db().await;

    let loading = website("Loading", "https://a.example.com", "proj-1");
    let indexing = website("Indexing", "https://b.example.com", "proj-1");
    let finished = website("Finished", "https://c.example.com", "proj-1");
    let (loading_id, indexing_id, finished_id) = (loading.id, indexing.id, finished.id);
    db.resources.register(loading).await.expect("register");
    db.resources.register(indexing).await.expect("register");
    db.resources.register(finished).await.expect("register");

    db.resources
        .set_state(loading_id, ResourceState::Loading)
        .await
        .expect("set loading");
    db.resources
        .set_state(indexing_id, ResourceState::Indexing)
        .await
        .expect("set indexing");
    db.resources
        .set_state(finished_id, ResourceState::Finished)
        .await
        .expect("set finished");

    let count = db.resources.requeue_interrupted().await.expect("requeue");
    assert_eq!(count, 2);

    assert_eq!(
        db.resources.status(loading_id).await.expect("status"),
        Some(ResourceState::Pending)
    );
    assert_eq!(
        db.resources.status(indexing_id).await.expect("status"),
        Some(ResourceState::Pending)
    );
    assert_eq!(
        db.resources.status(finished_id).await.expect("status"),
        Some(ResourceState::Finished)
    );

    let again = db.resources.requeue_interrupted().await.expect("requeue");
    assert_eq!(again, 0);
}

#[tokio::test]
async fn test_delete_resource() {
    let db = setup_test_db().await;

    let new = website("Docs", "https://docs.example.com", "proj-1");
    let id = new.id;
    db.resources.register(new).await.expect("register");

    assert!(db.resources.delete(id).await.expect("delete"));
    assert!(db.resources.get(id).await.expect("get").is_none());
    assert!(!db.resources.delete(id).await.expect("second delete"));
}

#[tokio::test]
async fn test_register_wakes_pending_waiters() {
    let db = setup_test_db().await;

    let notify = db.resources.pending_notify();
    let notified = notify.notified();
    tokio::pin!(notified);
    notified.as_mut().enable();

    let outcome = db
        .resources
        .register(website("Docs", "https://docs.example.com", "proj-1"))
        .await
        .expect("register");
    assert!(outcome.is_created());

    tokio::time::timeout(StdDuration::from_secs(1), notified)
        .await
        .expect("registration should wake pending waiters");
}

#[tokio::test]
async fn test_duplicate_register_does_not_wake_waiters() {
    let db = setup_test_db().await;

    db.resources
        .register(website("Docs", "https://docs.example.com", "proj-1"))
        .await
        .expect("register");

    let notify = db.resources.pending_notify();
    let notified = notify.notified();
    tokio::pin!(notified);
    notified.as_mut().enable();

    let outcome = db
        .resources
        .register(website("Docs", "https://docs.example.com", "proj-1"))
        .await
        .expect("dup register");
    assert!(!outcome.is_created());

    let woken = tokio::time::timeout(StdDuration::from_millis(50), notified).await;
    assert!(woken.is_err(), "duplicate must not signal new work");
}

#[tokio::test]
async fn test_accepted_update_wakes_pending_waiters() {
    let db = setup_test_db().await;

    let new = website("Docs", "https://docs.example.com", "proj-1");
    let id = new.id;
    db.resources.register(new).await.expect("register");
    db.resources
        .set_failed(id, "transient failure")
        .await
        .expect("set_failed");

    let notify = db.resources.pending_notify();
    let notified = notify.notified();
    tokio::pin!(notified);
    notified.as_mut().enable();

    let outcome = db
        .resources
        .begin_update(id, Duration::hours(24))
        .await
        .expect("begin_update");
    assert_eq!(outcome, UpdateOutcome::Accepted);

    tokio::time::timeout(StdDuration::from_secs(1), notified)
        .await
        .expect("accepted update should wake pending waiters");
}
