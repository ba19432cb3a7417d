//! Generation API routes.
//!
//! Exposes the run registry and archive producer over HTTP.
//!
//! ## Routes
//!
//! - `POST /generate/{nc}` - Schedule a generation run
//! - `POST /generate/{nc}/{run_id}/augment` - Schedule augmentation sub-runs
//! - `GET  /generate/{nc}/{run_id}/status` - Derived run status
//! - `GET  /generate/{nc}/{run_id}/{sub_run}/download` - Download ZIP archive
//! - `GET  /generate/available` - Full registry dump

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::context::RequestContext;
use crate::error::{ApiError, ApiErrorBody};
use crate::server::AppState;

/// Response after scheduling a run or an augmentation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduleResponse {
    /// Nominal composition.
    pub composition: String,
    /// Run identifier assigned to (or addressed by) this request.
    pub run_id: String,
    /// Always `"SCHEDULED"` on success.
    pub status: String,
}

/// Derived status response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// `"RUNNING"` or `"DONE"` for the initial run.
    pub run_status: String,
    /// `"RUNNING"` or `"DONE"` for augmentation sub-runs, once scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_runs_status: Option<String>,
}

const SCHEDULED: &str = "SCHEDULED";

/// Creates generation routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate/available", get(available))
        .route("/generate/:nc", post(schedule))
        .route("/generate/:nc/:run_id/augment", post(augment))
        .route("/generate/:nc/:run_id/status", get(status))
        .route("/generate/:nc/:run_id/:sub_run/download", get(download))
}

/// Schedule a generation run for a composition.
///
/// POST /v1/generate/{nc}
#[utoipa::path(
    post,
    path = "/v1/generate/{nc}",
    tag = "generate",
    params(
        ("nc" = String, Path, description = "Nominal composition")
    ),
    responses(
        (status = 200, description = "Run scheduled", body = ScheduleResponse),
        (status = 404, description = "Composition or run data not found", body = ApiErrorBody),
        (status = 500, description = "Internal error", body = ApiErrorBody),
    )
)]
pub(crate) async fn schedule(
    ctx: RequestContext,
    State(state): State<Arc<AppState>>,
    Path(nc): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(composition = %nc, request_id = %ctx.request_id, "Scheduling run");

    let record = state
        .registry
        .schedule(&nc)
        .map_err(|e| ApiError::from(e).with_request_id(ctx.request_id.clone()))?;

    Ok(Json(ScheduleResponse {
        composition: record.composition,
        run_id: record.run_id,
        status: SCHEDULED.to_string(),
    }))
}

/// Schedule augmentation sub-runs for an existing run.
///
/// POST /v1/generate/{nc}/{run_id}/augment
#[utoipa::path(
    post,
    path = "/v1/generate/{nc}/{run_id}/augment",
    tag = "generate",
    params(
        ("nc" = String, Path, description = "Nominal composition"),
        ("run_id" = String, Path, description = "Run identifier"),
    ),
    responses(
        (status = 200, description = "Augmentation scheduled", body = ScheduleResponse),
        (status = 404, description = "Run not registered or sub-run data absent", body = ApiErrorBody),
        (status = 500, description = "Internal error", body = ApiErrorBody),
    )
)]
pub(crate) async fn augment(
    ctx: RequestContext,
    State(state): State<Arc<AppState>>,
    Path((nc, run_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        composition = %nc,
        run_id = %run_id,
        request_id = %ctx.request_id,
        "Scheduling augmentation"
    );

    let record = state
        .registry
        .augment(&nc, &run_id)
        .map_err(|e| ApiError::from(e).with_request_id(ctx.request_id.clone()))?;

    Ok(Json(ScheduleResponse {
        composition: record.composition,
        run_id: record.run_id,
        status: SCHEDULED.to_string(),
    }))
}

/// Derived status of a run.
///
/// GET /v1/generate/{nc}/{run_id}/status
#[utoipa::path(
    get,
    path = "/v1/generate/{nc}/{run_id}/status",
    tag = "generate",
    params(
        ("nc" = String, Path, description = "Nominal composition"),
        ("run_id" = String, Path, description = "Run identifier"),
    ),
    responses(
        (status = 200, description = "Derived status", body = StatusResponse),
        (status = 404, description = "Run not registered", body = ApiErrorBody),
    )
)]
pub(crate) async fn status(
    ctx: RequestContext,
    State(state): State<Arc<AppState>>,
    Path((nc, run_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!(
        composition = %nc,
        run_id = %run_id,
        request_id = %ctx.request_id,
        "Deriving status"
    );

    let report = state
        .registry
        .status(&nc, &run_id)
        .map_err(|e| ApiError::from(e).with_request_id(ctx.request_id.clone()))?;

    Ok(Json(StatusResponse {
        run_status: report.run_status.to_string(),
        sub_runs_status: report.sub_runs_status.map(|s| s.to_string()),
    }))
}

/// Produce and stream a per-sub-run ZIP archive.
///
/// GET /v1/generate/{nc}/{run_id}/{sub_run}/download
#[utoipa::path(
    get,
    path = "/v1/generate/{nc}/{run_id}/{sub_run}/download",
    tag = "generate",
    params(
        ("nc" = String, Path, description = "Nominal composition"),
        ("run_id" = String, Path, description = "Run identifier"),
        ("sub_run" = String, Path, description = "Sub-run identifier"),
    ),
    responses(
        (status = 200, description = "ZIP archive", content_type = "application/zip"),
        (status = 404, description = "Sub-run not registered or data absent", body = ApiErrorBody),
        (status = 500, description = "Internal error", body = ApiErrorBody),
    )
)]
pub(crate) async fn download(
    ctx: RequestContext,
    State(state): State<Arc<AppState>>,
    Path((nc, run_id, sub_run)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        composition = %nc,
        run_id = %run_id,
        sub_run = %sub_run,
        request_id = %ctx.request_id,
        "Producing archive for download"
    );

    if !state.registry.is_available(&nc, &run_id, &sub_run) {
        return Err(ApiError::not_found(format!(
            "sub-run {sub_run} of run {run_id} is not registered for composition {nc}"
        ))
        .with_request_id(ctx.request_id));
    }

    let archive_path = state
        .producer
        .produce(&nc, &run_id, &sub_run)
        .map_err(|e| ApiError::from(e).with_request_id(ctx.request_id.clone()))?;

    let bytes = tokio::fs::read(&archive_path).await.map_err(|e| {
        ApiError::internal(format!("read archive {}: {e}", archive_path.display()))
            .with_request_id(ctx.request_id.clone())
    })?;

    let filename = archive_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("archive.zip")
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}

/// Full registry dump, unpaginated.
///
/// GET /v1/generate/available
#[utoipa::path(
    get,
    path = "/v1/generate/available",
    tag = "generate",
    responses(
        (status = 200, description = "Mapping of composition to scheduled runs", body = Object),
    )
)]
pub(crate) async fn available(
    ctx: RequestContext,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!(request_id = %ctx.request_id, "Listing registry");
    Ok(Json(state.registry.list_all()))
}
