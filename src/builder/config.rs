//! Per-process builder configuration.
//!
//! The template root, output directory and bundled tools directory are
//! ordinary configuration passed explicitly into every job, never ambient
//! globals.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directories and limits shared by all jobs in this process.
///
/// The template tree is read-only from the pipeline's point of view: jobs
/// always copy it before touching anything.
#[derive(Clone, Debug)]
pub struct BuilderConfig {
    /// Root of the pristine application template tree.
    pub template_dir: PathBuf,

    /// Directory receiving per-job workspaces and finished bundles.
    pub output_dir: PathBuf,

    /// Optional bundled toolchain directory (`jdk/`, `android-sdk/`).
    ///
    /// When absent, keytool and the SDK are resolved from the ambient
    /// environment.
    pub tools_dir: Option<PathBuf>,

    /// Optional hard limit on the compiler invocation.
    ///
    /// The upstream design runs unbounded; a limit here is a hardening
    /// deviation. When it fires the subprocess is killed and the job fails.
    pub build_timeout: Option<Duration>,
}

impl BuilderConfig {
    /// Creates a configuration with no bundled tools and no build timeout.
    pub fn new<T: AsRef<Path>, O: AsRef<Path>>(template_dir: T, output_dir: O) -> Self {
        Self {
            template_dir: template_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            tools_dir: None,
            build_timeout: None,
        }
    }

    /// Sets the bundled toolchain directory.
    pub fn tools_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.tools_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets a hard limit on the compiler invocation.
    pub fn build_timeout(mut self, limit: Duration) -> Self {
        self.build_timeout = Some(limit);
        self
    }
}
