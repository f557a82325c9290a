//! Test helpers: build AppState and router against stub tool binaries.
//!
//! Run from workspace root: `cargo test -p vidfetch-api --test youtube_api_test`.
//! The stubs stand in for yt-dlp/ffmpeg: they emit a canned metadata dump,
//! echo a title, or write a fixed payload to the `-o` path, and simulate
//! failures/timeouts based on markers in the request URL.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use tempfile::TempDir;
use vidfetch_api::setup::routes::setup_routes;
use vidfetch_api::state::AppState;
use vidfetch_core::Config;
use vidfetch_processing::{ProgressRegistry, ToolPaths};

/// Payload the stub fetcher writes for successful downloads.
pub const STUB_PAYLOAD: &[u8] = b"FAKE-MP4-PAYLOAD";

/// Title the stub fetcher reports; sanitizes to "My Video_ Part _1_.mp4".
pub const STUB_TITLE_FILENAME: &str = "My Video_ Part _1_.mp4";

const YTDLP_STUB: &str = r#"#!/bin/sh
# Stub fetcher for integration tests.
prev=""
out=""
dump=0
title=0
last=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then out="$a"; fi
  if [ "$a" = "--dump-json" ]; then dump=1; fi
  if [ "$a" = "--get-title" ]; then title=1; fi
  prev="$a"
  last="$a"
done
case "$last" in
  *fail*) echo "ERROR: simulated failure" >&2; exit 1 ;;
  *slow*) sleep 5 ;;
esac
if [ "$dump" = 1 ]; then
  cat <<'JSON'
{"title":"Test","duration":125,"uploader":"U","formats":[{"format_id":"18","height":360,"vcodec":"h264","ext":"mp4","filesize":1000000},{"format_id":"22","height":720,"vcodec":"h264","ext":"mp4","filesize":5000000}]}
JSON
  exit 0
fi
if [ "$title" = 1 ]; then
  echo "My Video: Part #1?"
  exit 0
fi
echo "vidfetch:  50.0%"
printf 'FAKE-MP4-PAYLOAD' > "$out"
"#;

const FFMPEG_STUB: &str = "#!/bin/sh\nexit 0\n";

/// Test application: server plus the owned temp directories.
pub struct TestApp {
    pub server: TestServer,
    pub download_dir: TempDir,
    _tool_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Wait for the download temp directory to drain, bounded at ~2s.
    pub async fn wait_for_empty_download_dir(&self) -> bool {
        for _ in 0..100 {
            if self.download_dir_entries() == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    pub fn download_dir_entries(&self) -> usize {
        std::fs::read_dir(self.download_dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with_timeout(600)
}

pub fn setup_test_app_with_timeout(download_timeout_secs: u64) -> TestApp {
    let tool_dir = tempfile::tempdir().expect("create tool dir");
    let ytdlp = write_stub(tool_dir.path(), "yt-dlp", YTDLP_STUB);
    let ffmpeg = write_stub(tool_dir.path(), "ffmpeg", FFMPEG_STUB);

    let download_dir = tempfile::tempdir().expect("create download dir");

    let config = Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        ytdlp_path: Some(ytdlp.display().to_string()),
        ffmpeg_path: Some(ffmpeg.display().to_string()),
        download_timeout_secs,
        progress_retention_secs: 600,
        download_tmp_dir: download_dir.path().to_path_buf(),
    };

    let tools = ToolPaths::resolve(config.ytdlp_path.as_deref(), config.ffmpeg_path.as_deref());
    let state = Arc::new(AppState {
        tools,
        progress: ProgressRegistry::default(),
        config,
    });

    let router = setup_routes(&state.config, state.clone()).expect("setup routes");
    let server = TestServer::new(router).expect("start test server");

    TestApp {
        server,
        download_dir,
        _tool_dir: tool_dir,
    }
}

fn write_stub(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write stub");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("make stub executable");
    }
    path
}
