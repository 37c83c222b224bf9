//! Resource submission, update, deletion, and read endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use cairn_core::{Resource, ResourceKind, UpdateOutcome};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// SUBMISSION
// =============================================================================

/// Body for website, webpage, and video submissions.
#[derive(Debug, Deserialize)]
pub struct SubmitSourceBody {
    pub name: String,
    pub url: String,
    pub project_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRepositoryBody {
    pub name: String,
    pub language: String,
    pub clone_url: String,
    pub paths: String,
    /// Defaults to "main" when omitted
    #[serde(default)]
    pub branch: Option<String>,
    pub project_id: String,
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}

/// 202 with the new id, or 409 when the identical resource exists.
fn accepted_or_conflict(submitted: Option<Uuid>) -> Result<Response, ApiError> {
    match submitted {
        Some(id) => Ok((
            StatusCode::ACCEPTED,
            Json(serde_json::json!({
                "resource_id": id,
                "status": "pending",
            })),
        )
            .into_response()),
        None => Err(ApiError::Conflict(
            "Resource with identical parameters is already registered".to_string(),
        )),
    }
}

pub async fn submit_website(
    State(state): State<AppState>,
    Json(body): Json<SubmitSourceBody>,
) -> Result<Response, ApiError> {
    require("name", &body.name)?;
    require("url", &body.url)?;

    let submitted = state
        .service
        .submit_website(&body.name, &body.url, &body.project_id)
        .await?;
    accepted_or_conflict(submitted)
}

pub async fn submit_webpage(
    State(state): State<AppState>,
    Json(body): Json<SubmitSourceBody>,
) -> Result<Response, ApiError> {
    require("name", &body.name)?;
    require("url", &body.url)?;

    let submitted = state
        .service
        .submit_webpage(&body.name, &body.url, &body.project_id)
        .await?;
    accepted_or_conflict(submitted)
}

pub async fn submit_video(
    State(state): State<AppState>,
    Json(body): Json<SubmitSourceBody>,
) -> Result<Response, ApiError> {
    require("name", &body.name)?;
    require("url", &body.url)?;

    let submitted = state
        .service
        .submit_video(&body.name, &body.url, &body.project_id)
        .await?;
    accepted_or_conflict(submitted)
}

pub async fn submit_repository(
    State(state): State<AppState>,
    Json(body): Json<SubmitRepositoryBody>,
) -> Result<Response, ApiError> {
    require("name", &body.name)?;
    require("clone_url", &body.clone_url)?;

    let submitted = state
        .service
        .submit_repository(
            &body.name,
            &body.language,
            &body.clone_url,
            &body.paths,
            body.branch.as_deref(),
            &body.project_id,
        )
        .await?;
    accepted_or_conflict(submitted)
}

// =============================================================================
// UPDATE / DELETE
// =============================================================================

pub async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    match state.service.submit_update(id).await? {
        UpdateOutcome::Accepted => Ok(Json(serde_json::json!({
            "resource_id": id,
            "status": "pending",
        }))
        .into_response()),
        UpdateOutcome::Rejected { since } => {
            let retry_at = since + state.service.update_cooldown();
            let remaining_minutes = (retry_at - Utc::now()).num_minutes().max(0);
            // Round up so clients never retry inside the window.
            let retry_after_hours = (remaining_minutes + 59) / 60;

            Ok((
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({
                    "error": "Resource was synchronized recently",
                    "last_updated_at": since,
                    "retry_after_hours": retry_after_hours,
                })),
            )
                .into_response())
        }
        UpdateOutcome::NotFound => Err(ApiError::NotFound(format!("Resource {} not found", id))),
    }
}

pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// READ SIDE
// =============================================================================

pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let resource = state
        .service
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Resource {} not found", id)))?;
    Ok(Json(resource))
}

pub async fn get_resource_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let resource = state
        .service
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Resource {} not found", id)))?;
    let chunk_count = state.service.chunk_count(id).await?;

    Ok(Json(serde_json::json!({
        "resource_id": resource.id,
        "state": resource.state,
        "error": resource.error,
        "chunk_count": chunk_count,
        "last_updated_at": resource.last_updated_at,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ListResourcesQuery {
    pub project_id: Option<String>,
    pub kind: Option<ResourceKind>,
}

pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ListResourcesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut resources: Vec<Resource> = match &query.project_id {
        Some(project_id) => state.service.list_by_project(project_id).await?,
        None => match query.kind {
            Some(kind) => state.service.list_by_kind(kind).await?,
            None => state.service.list_all().await?,
        },
    };

    // Project filter already applied; kind narrows within it.
    if query.project_id.is_some() {
        if let Some(kind) = query.kind {
            resources.retain(|r| r.kind == kind);
        }
    }

    let count = resources.len();
    Ok(Json(serde_json::json!({
        "data": resources,
        "count": count,
    })))
}
