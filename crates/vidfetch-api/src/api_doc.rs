//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use vidfetch_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vidfetch API",
        version = "0.1.0",
        description = "Video download service: inspect available formats for a video URL and download a rendered MP4. Wraps yt-dlp for fetching and ffmpeg for audio/video merging."
    ),
    paths(
        handlers::video_info::video_info,
        handlers::video_download::video_download,
        handlers::progress::download_progress,
        handlers::health::health,
    ),
    components(schemas(
        models::VideoMetadata,
        models::VideoFormatOption,
        handlers::video_info::VideoInfoRequest,
        handlers::video_download::VideoDownloadRequest,
        handlers::progress::ProgressResponse,
        handlers::health::HealthResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "youtube", description = "Video metadata and download endpoints"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
