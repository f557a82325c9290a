//! Media fetch & package: download a chosen stream combination into a unique
//! temp file, merging audio/video into a single mp4 via ffmpeg, and derive a
//! client-facing filename from the video title.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tempfile::TempPath;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use uuid::Uuid;

use crate::command::YtDlpCommand;
use crate::error::FetchError;
use crate::progress::{parse_progress_line, JobHandle, PROGRESS_TEMPLATE};
use crate::tools::{Tool, ToolPaths};

/// Format expression used when the client did not pick a specific rendition.
const DEFAULT_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio/best";

const FALLBACK_FILENAME: &str = "video.mp4";

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub url: String,
    pub format_id: Option<String>,
}

/// A completed download. The temp file is deleted when `path` is dropped.
#[derive(Debug)]
pub struct DownloadedFile {
    pub path: TempPath,
    pub size: u64,
    /// Sanitized attachment filename, always ending in `.mp4`.
    pub filename: String,
}

/// Download the requested video into a unique temp file.
///
/// Progress updates are published through `job` when the caller supplied a
/// job token. The subprocess is bounded by `timeout_secs` of wall-clock time;
/// on timeout or failure any partially written file is removed.
pub async fn download_video(
    tools: &ToolPaths,
    options: &DownloadOptions,
    timeout_secs: u64,
    temp_dir: &Path,
    job: Option<JobHandle>,
) -> Result<DownloadedFile, FetchError> {
    let output_path = temp_dir.join(format!("vidfetch_{}.mp4", Uuid::new_v4()));
    let format_expr = format_expression(options.format_id.as_deref());

    let command = YtDlpCommand::new(tools.ytdlp())
        .option("--ffmpeg-location", tools.ffmpeg())
        .flag("--no-playlist")
        .flag("--no-warnings")
        .option("-f", &format_expr)
        .option("--merge-output-format", "mp4")
        .flag("--newline")
        .option("--progress-template", PROGRESS_TEMPLATE)
        .option("-o", &output_path)
        .url(&options.url);

    tracing::info!(
        url = %options.url,
        format = %format_expr,
        temp_file = %output_path.display(),
        command = %command.to_log_string(),
        "Starting video download to temp file"
    );

    let started = Instant::now();

    let mut child = command
        .build()
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| FetchError::Launch {
            tool: Tool::YtDlp,
            source,
        })?;

    let stdout = child.stdout.take();
    let progress_job = job.clone();
    let progress_task = tokio::spawn(async move {
        let Some(stdout) = stdout else { return };
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(percent) = parse_progress_line(&line) {
                if let Some(handle) = &progress_job {
                    handle.downloading(percent).await;
                }
            }
        }
    });

    let stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_string(&mut buf).await;
        }
        buf
    });

    let status = match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await
    {
        Ok(Ok(status)) => status,
        Ok(Err(source)) => {
            fail_job(&job).await;
            remove_partial_file(&output_path).await;
            return Err(FetchError::Io(source));
        }
        Err(_) => {
            let _ = child.kill().await;
            progress_task.abort();
            fail_job(&job).await;
            remove_partial_file(&output_path).await;
            tracing::error!(
                url = %options.url,
                timeout_secs = timeout_secs,
                "Video download timed out"
            );
            return Err(FetchError::Timeout {
                tool: Tool::YtDlp,
                seconds: timeout_secs,
            });
        }
    };

    let _ = progress_task.await;
    let stderr_output = stderr_task.await.unwrap_or_default();

    if !status.success() {
        fail_job(&job).await;
        remove_partial_file(&output_path).await;
        tracing::error!(
            url = %options.url,
            exit_code = status.code().unwrap_or(-1),
            stderr = %stderr_output,
            "Video download failed"
        );
        return Err(FetchError::ToolFailed {
            tool: Tool::YtDlp,
            code: status.code().unwrap_or(-1),
            stderr: stderr_output,
        });
    }

    let size = tokio::fs::metadata(&output_path)
        .await
        .map(|m| m.len())
        .unwrap_or(0);
    let elapsed = started.elapsed();
    let size_mb = size as f64 / 1024.0 / 1024.0;

    tracing::info!(
        url = %options.url,
        duration_secs = elapsed.as_secs_f64(),
        size_mb = size_mb,
        temp_file = %output_path.display(),
        "Video download completed successfully"
    );

    if let Some(handle) = &job {
        handle.completed().await;
    }

    let filename = match fetch_title(tools, &options.url).await {
        Some(title) => sanitize_title(&title),
        None => FALLBACK_FILENAME.to_string(),
    };

    Ok(DownloadedFile {
        path: TempPath::from_path(output_path),
        size,
        filename,
    })
}

/// `<id>+bestaudio/best` for an explicit rendition, else best mp4 video plus
/// m4a audio with progressively broader fallbacks.
fn format_expression(format_id: Option<&str>) -> String {
    match format_id {
        Some(id) => format!("{}+bestaudio/best", id),
        None => DEFAULT_FORMAT.to_string(),
    }
}

/// Ask the fetcher for the display title only. Best-effort: any failure falls
/// back to the generic filename.
async fn fetch_title(tools: &ToolPaths, url: &str) -> Option<String> {
    let output = YtDlpCommand::new(tools.ytdlp())
        .flag("--get-title")
        .flag("--no-playlist")
        .url(url)
        .build()
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        tracing::warn!(url = %url, "Title lookup failed, using fallback filename");
        return None;
    }

    let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Map every character outside `[A-Za-z0-9_- ]` to `_` and append `.mp4`.
pub fn sanitize_title(title: &str) -> String {
    let mut name: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    name.push_str(".mp4");
    name
}

async fn fail_job(job: &Option<JobHandle>) {
    if let Some(handle) = job {
        handle.failed().await;
    }
}

async fn remove_partial_file(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                temp_file = %path.display(),
                error = %e,
                "Failed to remove partial download"
            );
        }
    }
}
