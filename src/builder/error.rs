//! Error taxonomy for the build pipeline.
//!
//! Every stage failure maps to exactly one variant; the job runner turns
//! whichever one surfaces into a single terminal `error` progress event.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the build pipeline stages.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed build request, reported before any workspace exists
    #[error("invalid package identifier: {0}")]
    Validation(String),

    /// Workspace copy or layout failure
    #[error("workspace error: {0}")]
    Workspace(String),

    /// Icon decoding or resizing failure
    #[error("icon processing failed: {0}")]
    Asset(String),

    /// Signing identity generation or import failure
    #[error("signing credential error: {0}")]
    Credential(String),

    /// A transformation rule's precondition was violated unrecoverably
    #[error("composition failed: {0}")]
    Composition(String),

    /// Compiler returned a non-zero exit code
    #[error("build failed: {0}")]
    Build(String),

    /// Compiler reported success but the artifact is not where it should be
    #[error("artifact not found at {}; the build may have failed silently", path.display())]
    ArtifactMissing {
        /// Expected artifact location inside the workspace
        path: PathBuf,
    },

    /// Download bundle assembly failure
    #[error("packaging failed: {0}")]
    Packaging(String),

    /// IO errors from any stage
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
