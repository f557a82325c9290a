//! Metadata fetch: dump a single video's metadata as JSON and derive the
//! deduplicated, descending-sorted list of resolution options.

use std::collections::HashSet;

use serde::Deserialize;
use vidfetch_core::models::{VideoFormatOption, VideoMetadata};

use crate::command::YtDlpCommand;
use crate::error::FetchError;
use crate::tools::{Tool, ToolPaths};

/// Partial schema of the yt-dlp metadata dump. Every field is optional:
/// missing fields become null, never a parse error.
#[derive(Debug, Deserialize)]
struct RawVideoInfo {
    title: Option<String>,
    thumbnail: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    height: Option<u32>,
    vcodec: Option<String>,
    ext: Option<String>,
    // yt-dlp occasionally emits these as floats
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
    /// Total bitrate in kbit/s.
    tbr: Option<f64>,
    fps: Option<f64>,
}

/// Fetch and derive metadata for a single video.
pub async fn fetch_metadata(tools: &ToolPaths, url: &str) -> Result<VideoMetadata, FetchError> {
    let command = YtDlpCommand::new(tools.ytdlp())
        .flag("--dump-json")
        .flag("--no-playlist")
        .url(url);

    tracing::info!(
        url = %url,
        tool = %tools.ytdlp().display(),
        "Fetching video metadata"
    );

    let output = command
        .build()
        .output()
        .await
        .map_err(|source| FetchError::Launch {
            tool: Tool::YtDlp,
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        tracing::error!(
            url = %url,
            exit_code = output.status.code().unwrap_or(-1),
            stderr = %stderr,
            "Metadata fetch failed"
        );
        return Err(FetchError::ToolFailed {
            tool: Tool::YtDlp,
            code: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    let metadata = parse_metadata_json(&output.stdout)?;

    tracing::info!(
        url = %url,
        title = %metadata.title,
        formats_count = metadata.formats.len(),
        "Fetched video metadata"
    );

    Ok(metadata)
}

/// Parse a metadata dump. An empty object counts as a parse failure, matching
/// the tool's behavior of emitting `{}` for some unrecoverable extractions.
pub fn parse_metadata_json(bytes: &[u8]) -> Result<VideoMetadata, FetchError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| FetchError::ParseFailed(e.to_string()))?;

    let non_empty_object = value.as_object().is_some_and(|o| !o.is_empty());
    if !non_empty_object {
        return Err(FetchError::ParseFailed(
            "metadata dump was empty".to_string(),
        ));
    }

    let raw: RawVideoInfo =
        serde_json::from_value(value).map_err(|e| FetchError::ParseFailed(e.to_string()))?;

    Ok(build_metadata(raw))
}

fn build_metadata(raw: RawVideoInfo) -> VideoMetadata {
    let duration = raw.duration;
    let mut seen_resolutions = HashSet::new();
    let mut formats = Vec::new();

    for format in &raw.formats {
        // Video-bearing streams only: a height plus a real video codec.
        let (Some(format_id), Some(height)) = (&format.format_id, format.height) else {
            continue;
        };
        match format.vcodec.as_deref() {
            Some(vcodec) if vcodec != "none" => {}
            _ => continue,
        }

        let resolution = format!("{}p", height);
        // First occurrence wins under the source list's order.
        if !seen_resolutions.insert(resolution.clone()) {
            continue;
        }

        let filesize = format
            .filesize
            .or(format.filesize_approx)
            .map(|size| size.round() as u64)
            .or_else(|| estimate_filesize(format.tbr, duration));

        formats.push(VideoFormatOption {
            format_id: format_id.clone(),
            resolution,
            ext: format.ext.clone().unwrap_or_else(|| "mp4".to_string()),
            filesize,
            fps: format.fps,
        });
    }

    // Descending sort on the label *string*. Practical labels like "1080p" vs
    // "720p" happen to order correctly; this is not a general numeric sort.
    formats.sort_by(|a, b| b.resolution.cmp(&a.resolution));

    VideoMetadata {
        title: raw.title.unwrap_or_else(|| "Unknown".to_string()),
        thumbnail: raw.thumbnail,
        duration,
        uploader: raw.uploader.unwrap_or_else(|| "Unknown".to_string()),
        formats,
    }
}

/// Estimate a byte size from a kbit/s bitrate and a duration in seconds.
fn estimate_filesize(tbr: Option<f64>, duration: Option<f64>) -> Option<u64> {
    match (tbr, duration) {
        (Some(tbr), Some(duration)) => Some((tbr * 1000.0 / 8.0 * duration).round() as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_video_dump() {
        let json = br#"{
            "title": "Test",
            "duration": 125,
            "uploader": "U",
            "formats": [
                {"format_id": "18", "height": 360, "vcodec": "h264", "ext": "mp4", "filesize": 1000000},
                {"format_id": "22", "height": 720, "vcodec": "h264", "ext": "mp4", "filesize": 5000000}
            ]
        }"#;

        let metadata = parse_metadata_json(json).expect("parse");
        assert_eq!(metadata.title, "Test");
        assert_eq!(metadata.duration, Some(125.0));
        assert_eq!(metadata.uploader, "U");

        let resolutions: Vec<&str> = metadata
            .formats
            .iter()
            .map(|f| f.resolution.as_str())
            .collect();
        assert_eq!(resolutions, vec!["720p", "360p"]);
        assert_eq!(metadata.formats[0].format_id, "22");
        assert_eq!(metadata.formats[0].filesize, Some(5_000_000));
    }

    #[test]
    fn rejects_empty_object_dump() {
        assert!(matches!(
            parse_metadata_json(b"{}"),
            Err(FetchError::ParseFailed(_))
        ));
        assert!(matches!(
            parse_metadata_json(b"null"),
            Err(FetchError::ParseFailed(_))
        ));
        assert!(matches!(
            parse_metadata_json(b"not json"),
            Err(FetchError::ParseFailed(_))
        ));
    }

    #[test]
    fn filters_audio_only_and_heightless_formats() {
        let json = br#"{
            "title": "T",
            "formats": [
                {"format_id": "140", "vcodec": "none", "height": 0, "ext": "m4a"},
                {"format_id": "139", "acodec": "mp4a", "ext": "m4a"},
                {"format_id": "22", "height": 720, "vcodec": "h264"}
            ]
        }"#;

        let metadata = parse_metadata_json(json).expect("parse");
        assert_eq!(metadata.formats.len(), 1);
        assert_eq!(metadata.formats[0].format_id, "22");
        // Extension defaults to mp4 when the dump omits it.
        assert_eq!(metadata.formats[0].ext, "mp4");
    }

    #[test]
    fn dedup_keeps_first_occurrence_per_resolution() {
        let json = br#"{
            "title": "T",
            "formats": [
                {"format_id": "a", "height": 720, "vcodec": "vp9", "ext": "webm"},
                {"format_id": "b", "height": 720, "vcodec": "h264", "ext": "mp4"},
                {"format_id": "c", "height": 360, "vcodec": "h264", "ext": "mp4"}
            ]
        }"#;

        let metadata = parse_metadata_json(json).expect("parse");
        assert_eq!(metadata.formats.len(), 2);
        assert_eq!(metadata.formats[0].format_id, "a");
        assert_eq!(metadata.formats[0].ext, "webm");
    }

    #[test]
    fn estimates_filesize_from_bitrate_and_duration() {
        let json = br#"{
            "title": "T",
            "duration": 125,
            "formats": [
                {"format_id": "22", "height": 720, "vcodec": "h264", "tbr": 2500.0}
            ]
        }"#;

        let metadata = parse_metadata_json(json).expect("parse");
        // 2500 kbit/s * 1000 / 8 * 125 s
        assert_eq!(metadata.formats[0].filesize, Some(39_062_500));
    }

    #[test]
    fn exact_size_beats_approx_beats_estimate() {
        let json = br#"{
            "title": "T",
            "duration": 100,
            "formats": [
                {"format_id": "1", "height": 1080, "vcodec": "h264", "filesize": 10, "filesize_approx": 20, "tbr": 1.0},
                {"format_id": "2", "height": 720, "vcodec": "h264", "filesize_approx": 20, "tbr": 1.0},
                {"format_id": "3", "height": 480, "vcodec": "h264"}
            ]
        }"#;

        let metadata = parse_metadata_json(json).expect("parse");
        assert_eq!(metadata.formats[0].filesize, Some(10));
        assert_eq!(metadata.formats[1].filesize, Some(20));
        assert_eq!(metadata.formats[2].filesize, None);
    }

    #[test]
    fn defaults_title_and_uploader_to_unknown() {
        let metadata = parse_metadata_json(br#"{"duration": 1}"#).expect("parse");
        assert_eq!(metadata.title, "Unknown");
        assert_eq!(metadata.uploader, "Unknown");
        assert!(metadata.thumbnail.is_none());
        assert!(metadata.formats.is_empty());
    }

    #[test]
    fn resolution_sort_is_lexicographic_not_numeric() {
        // "144p" > "1080p" in string order; the label sort is intentionally
        // not numeric, so a 144p rendition outranks a 1080p one here.
        let json = br#"{
            "title": "T",
            "formats": [
                {"format_id": "hi", "height": 1080, "vcodec": "h264"},
                {"format_id": "lo", "height": 144, "vcodec": "h264"}
            ]
        }"#;

        let metadata = parse_metadata_json(json).expect("parse");
        let resolutions: Vec<&str> = metadata
            .formats
            .iter()
            .map(|f| f.resolution.as_str())
            .collect();
        assert_eq!(resolutions, vec!["144p", "1080p"]);
    }

    #[test]
    fn skips_formats_without_format_id() {
        let json = br#"{
            "title": "T",
            "formats": [
                {"height": 720, "vcodec": "h264"},
                {"format_id": "22", "height": 480, "vcodec": "h264"}
            ]
        }"#;

        let metadata = parse_metadata_json(json).expect("parse");
        assert_eq!(metadata.formats.len(), 1);
        assert_eq!(metadata.formats[0].resolution, "480p");
    }
}
