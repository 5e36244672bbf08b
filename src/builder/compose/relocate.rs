//! Source-tree relocation to the real package path.
//!
//! Runs last: earlier rules edit sources by their original paths. Every
//! file under the placeholder package directory is rewritten with the real
//! identifier and moved to the path it implies; the now-empty placeholder
//! tree is then deleted.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use super::super::error::{Error, Result};
use super::{PLACEHOLDER_ID, PLACEHOLDER_SRC_DIR};
use super::edit::replace_all;

/// Root of the placeholder tree to delete once files have moved.
const PLACEHOLDER_TREE: &str = "app/src/main/java/com/webapk";

/// Moves the placeholder package tree to the real package path.
pub fn apply(workspace_root: &Path, package_id: &str) -> Result<()> {
    let old_dir = workspace_root.join(PLACEHOLDER_SRC_DIR);
    if !old_dir.is_dir() {
        // Already relocated, or the template carries no sources
        return Ok(());
    }
    if package_id == PLACEHOLDER_ID {
        return Ok(());
    }

    let new_dir = workspace_root
        .join("app/src/main/java")
        .join(package_id.replace('.', "/"));
    fs::create_dir_all(&new_dir)?;

    for entry in WalkDir::new(&old_dir) {
        let entry = entry.map_err(|e| Error::Composition(format!("relocation walk: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(&old_dir)
            .map_err(|e| Error::Composition(format!("relocation path: {e}")))?;
        let target = new_dir.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        match fs::read_to_string(entry.path()) {
            Ok(content) => {
                fs::write(&target, replace_all(&content, PLACEHOLDER_ID, package_id))?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                // Non-text resource: carried over untouched
                fs::copy(entry.path(), &target)?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    fs::remove_dir_all(workspace_root.join(PLACEHOLDER_TREE))?;
    Ok(())
}
