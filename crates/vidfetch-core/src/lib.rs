//! Vidfetch Core Library
//!
//! This crate provides the shared domain models, error types, and configuration
//! used by the download orchestrator and the HTTP API.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
