//! Application state.
//!
//! AppState carries the resolved tool paths and the shared progress registry;
//! sub-states can be extracted via Axum's `FromRef` so handlers take only
//! what they need.

use vidfetch_core::Config;
use vidfetch_processing::{ProgressRegistry, ToolPaths};

/// Main application state: configuration, resolved tools, progress registry.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tools: ToolPaths,
    pub progress: ProgressRegistry,
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
