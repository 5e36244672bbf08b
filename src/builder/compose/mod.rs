//! Feature Composition Engine.
//!
//! A pipeline of text-level transformation rules, each addressing one
//! target file and applying exactly once, executed in a fixed order so
//! later rules can assume earlier ones' effects:
//!
//! 1. resource regeneration (whole-file, conflict-free)
//! 2. build-script parameterization and signing configuration
//! 3. toggle-driven feature injection/removal
//! 4. manifest identifier and deep-link host substitution
//! 5. package-tree relocation (last: rules 2–3 address original paths)
//!
//! Rules fail soft where their target text is absent, so running the whole
//! engine twice over the same workspace converges byte-for-byte.

pub mod edit;
mod features;
mod gradle;
mod manifest;
mod relocate;
mod resources;

use std::path::Path;

use super::credentials::SigningIdentity;
use super::error::Result;
use super::request::BuildRequest;

pub use manifest::deep_link_host;

/// Placeholder identifier baked into every template file.
pub const PLACEHOLDER_ID: &str = "com.webapk.app";

/// Placeholder package directory, relative to the workspace root.
pub const PLACEHOLDER_SRC_DIR: &str = "app/src/main/java/com/webapk/app";

/// Runs every rule against the workspace in the fixed order.
pub fn apply_all(
    workspace_root: &Path,
    request: &BuildRequest,
    identity: &SigningIdentity,
    link_host: &str,
) -> Result<()> {
    resources::apply(workspace_root, request)?;
    gradle::apply(workspace_root, request, identity)?;
    features::apply_push(workspace_root, request.push.as_ref())?;
    features::apply_login(workspace_root, request.login_client_id.as_deref())?;
    features::apply_fullscreen(workspace_root, request.fullscreen)?;
    manifest::apply(workspace_root, request, link_host)?;
    relocate::apply(workspace_root, &request.package_id)?;
    Ok(())
}
