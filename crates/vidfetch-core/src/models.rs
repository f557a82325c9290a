//! Wire models for the video metadata API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One downloadable rendition of a video.
///
/// `resolution` is the dedup/sort key: the formats list of a [`VideoMetadata`]
/// never contains two entries with the same label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VideoFormatOption {
    /// Opaque identifier issued by the fetcher for this rendition.
    pub format_id: String,
    /// Vertical-pixel-count label, e.g. "720p".
    pub resolution: String,
    /// Container extension, defaulting to "mp4" when the fetcher omits it.
    pub ext: String,
    /// Exact, approximate, or bitrate-estimated size in bytes; null when unknown.
    pub filesize: Option<u64>,
    pub fps: Option<f64>,
}

/// Metadata for a single video, returned by `POST /api/youtube/info`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoMetadata {
    pub title: String,
    pub thumbnail: Option<String>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    pub uploader: String,
    /// Unique by resolution label, sorted descending by that label.
    pub formats: Vec<VideoFormatOption>,
}
