//! Configuration module
//!
//! Env-based configuration for the API server and the download orchestrator,
//! including external tool overrides and subprocess timeouts.

use std::env;
use std::path::PathBuf;

// Common constants
const DOWNLOAD_TIMEOUT_SECS: u64 = 600;
const PROGRESS_RETENTION_SECS: u64 = 600;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    /// Override path for the yt-dlp binary; validated by existence before use.
    pub ytdlp_path: Option<String>,
    /// Override path for the ffmpeg binary; validated by existence before use.
    pub ffmpeg_path: Option<String>,
    /// Hard wall-clock limit for a single download subprocess.
    pub download_timeout_secs: u64,
    /// How long finished progress entries are kept before eviction.
    pub progress_retention_secs: u64,
    /// Directory where download temp files are written.
    pub download_tmp_dir: PathBuf,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        Ok(Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            ytdlp_path: env::var("YT_DLP_PATH").ok(),
            ffmpeg_path: env::var("FFMPEG_PATH").ok(),
            download_timeout_secs: env::var("DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| DOWNLOAD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DOWNLOAD_TIMEOUT_SECS),
            progress_retention_secs: env::var("PROGRESS_RETENTION_SECS")
                .unwrap_or_else(|_| PROGRESS_RETENTION_SECS.to_string())
                .parse()
                .unwrap_or(PROGRESS_RETENTION_SECS),
            download_tmp_dir: env::var("DOWNLOAD_TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
        })
    }
}
