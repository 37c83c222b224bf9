//! Integration tests for the resource HTTP endpoints.
//!
//! This test suite validates:
//! - Submission status codes (202 created, 409 duplicate, 400 bad input)
//! - Update gating (403 inside the cooldown, 404 unknown id)
//! - Delete (204, then 404 on reads)
//! - Read endpoints (get, status, filtered listing) and health
//!
//! Tests serve the real router over an ephemeral port against an
//! in-memory engine, so no external services are required.

use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use cairn_api::{router, AppState};
use cairn_db::Database;
use cairn_sync::ResourceService;
use cairn_vector::InMemoryVectorIndex;

/// Spin up the API over an in-memory engine; returns its base URL.
async fn serve() -> String {
    let db = Database::connect_memory()
        .await
        .expect("Failed to open in-memory database");
    let index = Arc::new(InMemoryVectorIndex::new());
    let service = ResourceService::new(db, index);

    let app = router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    format!("http://{}", addr)
}

async fn submit_website(client: &reqwest::Client, base: &str, url: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/v1/resources/website", base))
        .json(&json!({
            "name": "Docs",
            "url": url,
            "project_id": "proj-1"
        }))
        .send()
        .await
        .expect("request")
}

#[tokio::test]
async fn test_submit_website_then_duplicate() {
    let base = serve().await;
    let client = reqwest::Client::new();

    let response = submit_website(&client, &base, "https://docs.example.com").await;
    assert_eq!(response.status(), 202);
    let body: Value = response.json().await.expect("body");
    assert_eq!(body["status"], "pending");
    let id = Uuid::parse_str(body["resource_id"].as_str().expect("resource_id"))
        .expect("valid resource id");

    // Identical parameters are a duplicate, not a second resource.
    let dup = submit_website(&client, &base, "https://docs.example.com").await;
    assert_eq!(dup.status(), 409);

    let list: Value = client
        .get(format!("{}/api/v1/resources", base))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("body");
    assert_eq!(list["count"], 1);
    assert_eq!(
        list["data"][0]["id"].as_str().expect("id"),
        id.to_string()
    );
}

#[tokio::test]
async fn test_submit_rejects_blank_url() {
    let base = serve().await;
    let client = reqwest::Client::new();

    let response = submit_website(&client, &base, "   ").await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("body");
    assert!(body["error"].as_str().expect("error").contains("url"));
}

#[tokio::test]
async fn test_submit_repository_defaults_branch() {
    let base = serve().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/v1/resources/repository", base))
        .json(&json!({
            "name": "Engine",
            "language": "rust",
            "clone_url": "https://github.com/example/engine.git",
            "paths": "src",
            "project_id": "proj-1"
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 202);
    let body: Value = response.json().await.expect("body");
    let id = body["resource_id"].as_str().expect("resource_id");

    let resource: Value = client
        .get(format!("{}/api/v1/resources/{}", base, id))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("body");
    assert_eq!(resource["spec"]["type"], "repository");
    assert_eq!(resource["spec"]["branch"], "main");
}

#[tokio::test]
async fn test_update_is_cooldown_gated() {
    let base = serve().await;
    let client = reqwest::Client::new();

    let response = submit_website(&client, &base, "https://docs.example.com").await;
    let body: Value = response.json().await.expect("body");
    let id = body["resource_id"].as_str().expect("resource_id").to_string();

    // Freshly submitted resources are in flight, not eligible to re-queue.
    let update = client
        .put(format!("{}/api/v1/resources/{}", base, id))
        .send()
        .await
        .expect("request");
    assert_eq!(update.status(), 403);
    let body: Value = update.json().await.expect("body");
    assert!(body["retry_after_hours"].is_number());

    let missing = client
        .put(format!("{}/api/v1/resources/{}", base, Uuid::new_v4()))
        .send()
        .await
        .expect("request");
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_delete_then_not_found() {
    let base = serve().await;
    let client = reqwest::Client::new();

    let response = submit_website(&client, &base, "https://docs.example.com").await;
    let body: Value = response.json().await.expect("body");
    let id = body["resource_id"].as_str().expect("resource_id").to_string();

    let delete = client
        .delete(format!("{}/api/v1/resources/{}", base, id))
        .send()
        .await
        .expect("request");
    assert_eq!(delete.status(), 204);

    let get = client
        .get(format!("{}/api/v1/resources/{}", base, id))
        .send()
        .await
        .expect("request");
    assert_eq!(get.status(), 404);

    let again = client
        .delete(format!("{}/api/v1/resources/{}", base, id))
        .send()
        .await
        .expect("request");
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn test_status_endpoint_reports_state_and_chunks() {
    let base = serve().await;
    let client = reqwest::Client::new();

    let response = submit_website(&client, &base, "https://docs.example.com").await;
    let body: Value = response.json().await.expect("body");
    let id = body["resource_id"].as_str().expect("resource_id").to_string();

    let status: Value = client
        .get(format!("{}/api/v1/resources/{}/status", base, id))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("body");
    assert_eq!(status["state"], "pending");
    assert_eq!(status["chunk_count"], 0);
    assert!(status["error"].is_null());
}

#[tokio::test]
async fn test_list_filters_by_project_and_kind() {
    let base = serve().await;
    let client = reqwest::Client::new();

    submit_website(&client, &base, "https://a.example.com").await;
    client
        .post(format!("{}/api/v1/resources/video", base))
        .json(&json!({
            "name": "Talk",
            "url": "https://videos.example.com/v/1",
            "project_id": "proj-1"
        }))
        .send()
        .await
        .expect("request");
    client
        .post(format!("{}/api/v1/resources/webpage", base))
        .json(&json!({
            "name": "Other",
            "url": "https://other.example.com",
            "project_id": "proj-2"
        }))
        .send()
        .await
        .expect("request");

    let proj1: Value = client
        .get(format!("{}/api/v1/resources?project_id=proj-1", base))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("body");
    assert_eq!(proj1["count"], 2);

    let videos: Value = client
        .get(format!(
            "{}/api/v1/resources?project_id=proj-1&kind=video",
            base
        ))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("body");
    assert_eq!(videos["count"], 1);
    assert_eq!(videos["data"][0]["kind"], "video");
}

#[tokio::test]
async fn test_health_endpoint() {
    let base = serve().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("body");
    assert_eq!(body["status"], "healthy");
}
