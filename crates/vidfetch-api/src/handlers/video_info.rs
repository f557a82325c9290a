use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;
use vidfetch_core::models::VideoMetadata;
use vidfetch_core::AppError;
use vidfetch_processing::{fetch_metadata, FetchError};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VideoInfoRequest {
    #[validate(url(message = "The url must be a valid URL."))]
    pub url: String,
}

#[utoipa::path(
    post,
    path = "/api/youtube/info",
    tag = "youtube",
    request_body = VideoInfoRequest,
    responses(
        (status = 200, description = "Video metadata with available formats", body = VideoMetadata),
        (status = 400, description = "The fetcher could not retrieve the video", body = ErrorResponse),
        (status = 422, description = "Missing or malformed URL", body = ErrorResponse),
        (status = 500, description = "Fetcher output could not be parsed", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(url = %request.url, operation = "video_info")
)]
pub async fn video_info(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<VideoInfoRequest>,
) -> Result<Json<VideoMetadata>, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let metadata = fetch_metadata(&state.tools, &request.url)
        .await
        .map_err(metadata_error)?;

    Ok(Json(metadata))
}

/// Map orchestrator failures to the info operation's client-facing errors.
fn metadata_error(err: FetchError) -> AppError {
    match err {
        FetchError::ToolFailed { stderr, .. } => AppError::ToolFailed {
            message: "Failed to fetch video information. Please check the URL.".to_string(),
            stderr,
        },
        FetchError::ParseFailed(_) => {
            AppError::ParseFailed("Failed to parse video information.".to_string())
        }
        FetchError::Timeout { seconds, .. } => AppError::Timeout { seconds },
        other => {
            let message = other.to_string();
            AppError::InternalWithSource {
                message,
                source: anyhow::Error::new(other),
            }
        }
    }
}
