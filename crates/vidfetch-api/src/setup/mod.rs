//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod routes;
pub mod server;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use vidfetch_core::Config;
use vidfetch_processing::{ProgressRegistry, ToolPaths};

const PROGRESS_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Initialize telemetry first so validation warnings are visible
    crate::telemetry::init_telemetry();

    // Validate configuration - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    tracing::info!("Configuration loaded and validated successfully");

    // Resolve external tools once; absence only surfaces at spawn time
    let tools = ToolPaths::resolve(config.ytdlp_path.as_deref(), config.ffmpeg_path.as_deref());
    tracing::info!(
        ytdlp_path = %tools.ytdlp().display(),
        ffmpeg_path = %tools.ffmpeg().display(),
        "Resolved external tool paths"
    );

    let progress = ProgressRegistry::default();
    spawn_progress_cleanup(
        progress.clone(),
        Duration::from_secs(config.progress_retention_secs),
    );

    let state = Arc::new(AppState {
        tools,
        progress,
        config,
    });

    // Setup routes
    let router = routes::setup_routes(&state.config, state.clone())?;

    Ok((state, router))
}

/// Start the periodic eviction of finished progress entries to prevent the
/// registry from growing without bound.
fn spawn_progress_cleanup(registry: ProgressRegistry, retention: Duration) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(PROGRESS_CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            registry.evict_finished(retention).await;
        }
    });

    tracing::info!(
        retention_secs = retention.as_secs(),
        cleanup_interval_secs = PROGRESS_CLEANUP_INTERVAL_SECS,
        "Progress registry cleanup task started"
    );
}
