//! Error types for the CLI surface.
//!
//! The build pipeline's own taxonomy lives in [`crate::builder::error`];
//! this module wraps it together with argument and IO failures for the
//! binary entry point.

use thiserror::Error;

/// Result type alias for top-level operations
pub type Result<T> = std::result::Result<T, BuilderError>;

/// Main error type for the binary entry point
#[derive(Error, Debug)]
pub enum BuilderError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Build pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::builder::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}
