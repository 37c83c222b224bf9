//! # cairn-api
//!
//! HTTP surface for the Cairn synchronization engine:
//!
//! - **Submission**: one endpoint per resource kind, returning 202 with
//!   the deterministic resource id (409 when already registered)
//! - **Lifecycle**: update (cooldown-gated), delete (full cascade),
//!   status and listing endpoints
//! - **System**: health check
//!
//! The router is assembled here so integration tests can serve the real
//! route set against an in-memory engine; the binary adds tracing,
//! request-id, and CORS layers on top.

pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

pub use error::ApiError;
pub use state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::system::health_check))
        // Submission, one route per resource kind
        .route(
            "/api/v1/resources/website",
            post(handlers::resources::submit_website),
        )
        .route(
            "/api/v1/resources/webpage",
            post(handlers::resources::submit_webpage),
        )
        .route(
            "/api/v1/resources/video",
            post(handlers::resources::submit_video),
        )
        .route(
            "/api/v1/resources/repository",
            post(handlers::resources::submit_repository),
        )
        // Lifecycle and reads
        .route("/api/v1/resources", get(handlers::resources::list_resources))
        .route(
            "/api/v1/resources/:id",
            get(handlers::resources::get_resource)
                .put(handlers::resources::update_resource)
                .delete(handlers::resources::delete_resource),
        )
        .route(
            "/api/v1/resources/:id/status",
            get(handlers::resources::get_resource_status),
        )
        .with_state(state)
}
