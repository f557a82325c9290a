//! Startup configuration validation.

use anyhow::Result;
use std::path::Path;
use vidfetch_core::Config;

/// Validate the configuration before any state is built.
///
/// Nonexistent tool overrides are only warnings: the locator falls through to
/// its candidate list, and absence surfaces when the subprocess is launched.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.download_timeout_secs == 0 {
        anyhow::bail!("DOWNLOAD_TIMEOUT_SECS must be greater than zero");
    }

    if config.progress_retention_secs == 0 {
        anyhow::bail!("PROGRESS_RETENTION_SECS must be greater than zero");
    }

    if !config.download_tmp_dir.is_dir() {
        anyhow::bail!(
            "DOWNLOAD_TMP_DIR is not an existing directory: {}",
            config.download_tmp_dir.display()
        );
    }

    for (name, value) in [
        ("YT_DLP_PATH", &config.ytdlp_path),
        ("FFMPEG_PATH", &config.ffmpeg_path),
    ] {
        if let Some(path) = value {
            if !Path::new(path).exists() {
                tracing::warn!(
                    env_var = name,
                    path = %path,
                    "Tool override does not exist; falling back to well-known locations"
                );
            }
        }
    }

    Ok(())
}
