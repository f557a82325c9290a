//! Fetch orchestration errors.
//!
//! `FetchError` covers everything that can go wrong between building a tool
//! invocation and handing parsed output back to a handler. The API crate maps
//! these to `AppError` with operation-specific client messages.

use crate::tools::Tool;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: Tool,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with code {code}: {stderr}")]
    ToolFailed {
        tool: Tool,
        code: i32,
        stderr: String,
    },

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: Tool, seconds: u64 },

    #[error("failed to parse tool output: {0}")]
    ParseFailed(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
