//! Per-job download progress.
//!
//! Download requests may carry a client-generated job token; the download
//! publishes progress under that token as it parses yt-dlp's progress lines,
//! and the progress endpoint reads it back. Finished entries are evicted by a
//! periodic cleanup task so the registry does not grow without bound.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Progress template passed to yt-dlp; expands to lines parsed by
/// [`parse_progress_line`].
pub const PROGRESS_TEMPLATE: &str = "download:vidfetch:%(progress._percent_str)s";

const PROGRESS_LINE_PREFIX: &str = "vidfetch:";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Starting,
    Downloading,
    Completed,
    Failed,
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Starting => write!(f, "starting"),
            JobStatus::Downloading => write!(f, "downloading"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl JobStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct JobProgress {
    pub status: JobStatus,
    /// Percentage in the 0-100 range.
    pub progress: f64,
    finished_at: Option<Instant>,
}

/// Shared registry of in-flight and recently finished download jobs.
#[derive(Clone, Default)]
pub struct ProgressRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, JobProgress>>>,
}

impl ProgressRegistry {
    /// Register a job as starting and return a handle for publishing updates.
    /// Re-registering an existing token resets it to a fresh start.
    pub async fn start(&self, job_id: Uuid) -> JobHandle {
        self.jobs.write().await.insert(
            job_id,
            JobProgress {
                status: JobStatus::Starting,
                progress: 0.0,
                finished_at: None,
            },
        );
        JobHandle {
            registry: self.clone(),
            job_id,
        }
    }

    pub async fn get(&self, job_id: Uuid) -> Option<JobProgress> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    async fn update(&self, job_id: Uuid, status: JobStatus, progress: f64) {
        let finished_at = status.is_terminal().then(Instant::now);
        self.jobs.write().await.insert(
            job_id,
            JobProgress {
                status,
                progress,
                finished_at,
            },
        );
    }

    /// Drop terminal entries older than `retention`.
    pub async fn evict_finished(&self, retention: Duration) {
        self.jobs.write().await.retain(|_, job| {
            job.finished_at
                .map_or(true, |finished| finished.elapsed() < retention)
        });
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}

/// Handle for publishing progress updates for a single job.
#[derive(Clone)]
pub struct JobHandle {
    registry: ProgressRegistry,
    job_id: Uuid,
}

impl JobHandle {
    pub async fn downloading(&self, percent: f64) {
        self.registry
            .update(self.job_id, JobStatus::Downloading, percent.clamp(0.0, 100.0))
            .await;
    }

    pub async fn completed(&self) {
        self.registry
            .update(self.job_id, JobStatus::Completed, 100.0)
            .await;
    }

    pub async fn failed(&self) {
        self.registry.update(self.job_id, JobStatus::Failed, 0.0).await;
    }
}

/// Parse one stdout line produced by [`PROGRESS_TEMPLATE`], e.g.
/// `vidfetch:  42.3%`, into a 0-100 percentage.
pub fn parse_progress_line(line: &str) -> Option<f64> {
    let rest = line.trim().strip_prefix(PROGRESS_LINE_PREFIX)?;
    let percent = rest.trim().strip_suffix('%')?;
    let value = percent.trim().parse::<f64>().ok()?;
    Some(value.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_template_output_lines() {
        assert_eq!(parse_progress_line("vidfetch:  42.3%"), Some(42.3));
        assert_eq!(parse_progress_line("vidfetch:100.0%"), Some(100.0));
        assert_eq!(parse_progress_line("  vidfetch: 0.0%  "), Some(0.0));
    }

    #[test]
    fn rejects_unrelated_lines() {
        assert_eq!(parse_progress_line("[download] Destination: /tmp/x"), None);
        assert_eq!(parse_progress_line("vidfetch: N/A%"), None);
        assert_eq!(parse_progress_line("vidfetch: 42.3"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[test]
    fn clamps_out_of_range_percentages() {
        assert_eq!(parse_progress_line("vidfetch: 120.0%"), Some(100.0));
        assert_eq!(parse_progress_line("vidfetch: -5.0%"), Some(0.0));
    }

    #[tokio::test]
    async fn registry_tracks_job_lifecycle() {
        let registry = ProgressRegistry::default();
        let job_id = Uuid::new_v4();

        assert!(registry.get(job_id).await.is_none());

        let handle = registry.start(job_id).await;
        let progress = registry.get(job_id).await.expect("job registered");
        assert_eq!(progress.status, JobStatus::Starting);
        assert_eq!(progress.progress, 0.0);

        handle.downloading(55.5).await;
        let progress = registry.get(job_id).await.expect("job updated");
        assert_eq!(progress.status, JobStatus::Downloading);
        assert_eq!(progress.progress, 55.5);

        handle.completed().await;
        let progress = registry.get(job_id).await.expect("job finished");
        assert_eq!(progress.status, JobStatus::Completed);
        assert_eq!(progress.progress, 100.0);
    }

    #[tokio::test]
    async fn eviction_drops_only_old_terminal_jobs() {
        let registry = ProgressRegistry::default();

        let running = Uuid::new_v4();
        registry.start(running).await;

        let finished = Uuid::new_v4();
        let handle = registry.start(finished).await;
        handle.failed().await;

        registry.evict_finished(Duration::from_secs(3600)).await;
        assert_eq!(registry.len().await, 2);

        registry.evict_finished(Duration::ZERO).await;
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(running).await.is_some());
        assert!(registry.get(finished).await.is_none());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Downloading).expect("serialize"),
            "\"downloading\""
        );
        assert_eq!(JobStatus::Completed.to_string(), "completed");
    }
}
