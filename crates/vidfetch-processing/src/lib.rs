//! Vidfetch Processing Library
//!
//! This crate implements the download orchestrator: locating the external
//! yt-dlp and ffmpeg binaries, invoking them, parsing their output, and
//! tracking per-job download progress.

pub mod command;
pub mod download;
pub mod error;
pub mod metadata;
pub mod progress;
pub mod tools;

// Re-export commonly used types
pub use command::YtDlpCommand;
pub use download::{download_video, sanitize_title, DownloadOptions, DownloadedFile};
pub use error::FetchError;
pub use metadata::{fetch_metadata, parse_metadata_json};
pub use progress::{parse_progress_line, JobHandle, JobProgress, JobStatus, ProgressRegistry};
pub use tools::{locate, Tool, ToolPaths};
