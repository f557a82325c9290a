//! Executable locator for the external media tools.
//!
//! Resolution order: env-provided override (when it exists on disk), then a
//! fixed list of well-known install locations, then the bare command name so
//! the process launcher's PATH search gets the last word. The locator never
//! fails; a missing binary only surfaces when the subprocess fails to spawn.

use std::fmt;
use std::path::{Path, PathBuf};

/// Logical identifier for an external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// yt-dlp: retrieves media streams and metadata from a source URL.
    YtDlp,
    /// ffmpeg: merges separate audio and video streams into one container.
    Ffmpeg,
}

impl Tool {
    /// Bare command name, used as the final PATH fallback.
    pub fn command_name(&self) -> &'static str {
        match self {
            Tool::YtDlp => "yt-dlp",
            Tool::Ffmpeg => "ffmpeg",
        }
    }

    /// Well-known install locations, checked in order.
    fn candidate_paths(&self) -> Vec<PathBuf> {
        match self {
            Tool::YtDlp => {
                let mut candidates = vec![
                    PathBuf::from("/usr/local/bin/yt-dlp"),
                    PathBuf::from("/usr/bin/yt-dlp"),
                    PathBuf::from("/opt/homebrew/bin/yt-dlp"),
                ];
                if let Some(home) = std::env::var_os("HOME") {
                    candidates.push(Path::new(&home).join(".local/bin/yt-dlp"));
                }
                candidates
            }
            Tool::Ffmpeg => vec![
                PathBuf::from("/usr/bin/ffmpeg"),
                PathBuf::from("/opt/homebrew/bin/ffmpeg"),
                PathBuf::from("/usr/local/bin/ffmpeg"),
            ],
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_name())
    }
}

/// Resolve the path to use for `tool`, preferring `override_path` when it
/// points at an existing file.
pub fn locate(tool: Tool, override_path: Option<&Path>) -> PathBuf {
    locate_from(override_path, &tool.candidate_paths(), tool.command_name())
}

fn locate_from(override_path: Option<&Path>, candidates: &[PathBuf], fallback: &str) -> PathBuf {
    if let Some(path) = override_path {
        if path.exists() {
            return path.to_path_buf();
        }
    }

    for candidate in candidates {
        if candidate.exists() {
            return candidate.clone();
        }
    }

    PathBuf::from(fallback)
}

/// Resolved locations of both external tools, computed once at startup and
/// shared through application state.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    ytdlp: PathBuf,
    ffmpeg: PathBuf,
}

impl ToolPaths {
    pub fn resolve(ytdlp_override: Option<&str>, ffmpeg_override: Option<&str>) -> Self {
        Self {
            ytdlp: locate(Tool::YtDlp, ytdlp_override.map(Path::new)),
            ffmpeg: locate(Tool::Ffmpeg, ffmpeg_override.map(Path::new)),
        }
    }

    pub fn ytdlp(&self) -> &Path {
        &self.ytdlp
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_prefers_existing_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        let binary = dir.path().join("yt-dlp");
        std::fs::write(&binary, b"#!/bin/sh\n").expect("write stub");

        let resolved = locate_from(Some(&binary), &[], "yt-dlp");
        assert_eq!(resolved, binary);
    }

    #[test]
    fn locate_ignores_nonexistent_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope/yt-dlp");
        let candidate = dir.path().join("candidate");
        std::fs::write(&candidate, b"#!/bin/sh\n").expect("write stub");

        let resolved = locate_from(Some(&missing), std::slice::from_ref(&candidate), "yt-dlp");
        assert_eq!(resolved, candidate);
    }

    #[test]
    fn locate_returns_first_existing_candidate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing");
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        std::fs::write(&first, b"").expect("write");
        std::fs::write(&second, b"").expect("write");

        let resolved = locate_from(None, &[missing, first.clone(), second], "yt-dlp");
        assert_eq!(resolved, first);
    }

    #[test]
    fn locate_falls_back_to_bare_command_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing");

        let resolved = locate_from(Some(&missing), &[dir.path().join("also-missing")], "ffmpeg");
        assert_eq!(resolved, PathBuf::from("ffmpeg"));
    }
}
