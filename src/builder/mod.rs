//! The build pipeline: workspace, credentials, composition, compile, bundle.
//!
//! One job runs the stages in a fixed order and reports through a
//! [`ProgressSink`]. Stages are leaves-first: the workspace manager knows
//! nothing about signing, the composition engine nothing about Gradle.

pub mod compose;
pub mod config;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod icons;
pub mod job;
pub mod package;
pub mod progress;
pub mod request;
pub mod workspace;

// Re-export the types a front end needs to drive a job
pub use config::BuilderConfig;
pub use credentials::{Fingerprints, SigningIdentity};
pub use error::{Error, Result};
pub use job::JobContext;
pub use progress::{ProgressEvent, ProgressSink};
pub use request::{ArtifactKind, BuildRequest, KeystoreSource, Orientation, PushConfig};
