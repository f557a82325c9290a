use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use vidfetch_core::AppError;

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub job: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressResponse {
    /// One of "starting", "downloading", "completed", "failed".
    pub status: String,
    /// Percentage in the 0-100 range.
    pub progress: f64,
}

#[utoipa::path(
    get,
    path = "/api/youtube/progress",
    tag = "youtube",
    params(
        ("job" = String, Query, description = "Job token supplied with the download request")
    ),
    responses(
        (status = 200, description = "Current progress for the job", body = ProgressResponse),
        (status = 404, description = "Unknown job token", body = ErrorResponse),
        (status = 422, description = "Missing or malformed job token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query), fields(job = ?query.job, operation = "download_progress"))]
pub async fn download_progress(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ProgressResponse>, HttpAppError> {
    let job = query.job.as_deref().unwrap_or_default();
    if job.is_empty() {
        return Err(AppError::Validation("The job query parameter is required.".to_string()).into());
    }

    let job_id = Uuid::parse_str(job).map_err(|_| {
        AppError::Validation("The job query parameter must be a valid UUID.".to_string())
    })?;

    let progress = state
        .progress
        .get(job_id)
        .await
        .ok_or_else(|| AppError::NotFound("Unknown download job.".to_string()))?;

    Ok(Json(ProgressResponse {
        status: progress.status.to_string(),
        progress: progress.progress,
    }))
}
