//! Web-to-APK build pipeline library.
//!
//! This library turns a generic "web page in a WebView shell" Android
//! template into a customized, signed, compiled application package:
//! - isolated per-job workspaces copied from the template tree
//! - signing identity generation or import, plus fingerprint extraction
//! - ordered, toggle-driven text transformations across the template
//! - Gradle invocation with a coarse progress-event stream
//! - final download bundle (artifact + keystore + generated documents)
//!
//! It can be used both as a CLI tool and as a library dependency behind
//! an HTTP front end.

pub mod builder;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{BuilderError, CliError, Result};
