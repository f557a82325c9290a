use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::Stream;
use serde::Deserialize;
use tempfile::TempPath;
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use vidfetch_core::AppError;
use vidfetch_processing::{download_video, DownloadOptions, FetchError};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VideoDownloadRequest {
    #[validate(url(message = "The url must be a valid URL."))]
    pub url: String,
    /// Fetcher-issued rendition id; free-form, forwarded as a format expression.
    pub format_id: Option<String>,
    /// Accepted for client convenience, not used for format selection.
    pub resolution: Option<String>,
    /// Client-generated token for polling `/api/youtube/progress`.
    pub job_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/youtube/download",
    tag = "youtube",
    request_body = VideoDownloadRequest,
    responses(
        (status = 200, description = "Rendered MP4 file", content_type = "video/mp4"),
        (status = 400, description = "The fetcher could not download the video", body = ErrorResponse),
        (status = 422, description = "Missing or malformed URL", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(
        url = %request.url,
        format_id = ?request.format_id,
        resolution = ?request.resolution,
        job_id = ?request.job_id,
        operation = "video_download"
    )
)]
pub async fn video_download(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<VideoDownloadRequest>,
) -> Result<Response, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let job = match request.job_id {
        Some(job_id) => Some(state.progress.start(job_id).await),
        None => None,
    };

    let options = DownloadOptions {
        url: request.url.clone(),
        format_id: request.format_id.clone(),
    };

    let downloaded = download_video(
        &state.tools,
        &options,
        state.config.download_timeout_secs,
        &state.config.download_tmp_dir,
        job,
    )
    .await
    .map_err(download_error)?;

    let file = tokio::fs::File::open(&downloaded.path)
        .await
        .map_err(AppError::from)?;

    let body = Body::from_stream(TempFileStream {
        inner: ReaderStream::new(file),
        _cleanup: downloaded.path,
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, downloaded.size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", downloaded.filename),
        )
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build download response: {}", e)))?;

    Ok(response)
}

/// Map orchestrator failures to the download operation's client-facing errors.
fn download_error(err: FetchError) -> HttpAppError {
    let app = match err {
        FetchError::ToolFailed { stderr, .. } => AppError::ToolFailed {
            message: "Failed to download video.".to_string(),
            stderr,
        },
        FetchError::Timeout { seconds, .. } => AppError::Timeout { seconds },
        FetchError::ParseFailed(msg) => AppError::ParseFailed(msg),
        other => {
            let message = other.to_string();
            AppError::InternalWithSource {
                message,
                source: anyhow::Error::new(other),
            }
        }
    };
    HttpAppError(app)
}

/// File stream that deletes the temp file once the response body is dropped,
/// whether it was fully sent, failed, or the client disconnected.
struct TempFileStream {
    inner: ReaderStream<tokio::fs::File>,
    _cleanup: TempPath,
}

impl Stream for TempFileStream {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}
