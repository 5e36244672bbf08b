//! Isolated per-job workspace lifecycle.
//!
//! Each job gets a full copy of the template tree under a directory named
//! by a fresh random token. The name is chosen before any writes begin, so
//! no other job can observe a partially-copied workspace.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;
use walkdir::WalkDir;

use super::error::{Error, Result};

/// One job's disposable copy of the template tree.
#[derive(Debug)]
pub struct Workspace {
    /// 8-character random job token, also used in the bundle filename
    pub token: String,
    /// Workspace root (`{output_dir}/build_{token}`)
    pub root: PathBuf,
}

/// Draws a fresh 8-character job token.
pub fn new_token() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Copies the template tree into a freshly named workspace.
///
/// # Errors
///
/// [`Error::Workspace`] if the destination already exists (never silently
/// reused) or the copy is interrupted.
pub fn create(template_dir: &Path, output_dir: &Path) -> Result<Workspace> {
    if !template_dir.is_dir() {
        return Err(Error::Workspace(format!(
            "template directory not found: {}",
            template_dir.display()
        )));
    }

    let token = new_token();
    let root = output_dir.join(format!("build_{token}"));
    if root.exists() {
        return Err(Error::Workspace(format!(
            "workspace already exists: {}",
            root.display()
        )));
    }

    copy_tree(template_dir, &root).map_err(|e| {
        // Leave no partial copy behind for a later job to trip over.
        if let Err(cleanup) = fs::remove_dir_all(&root) {
            log::warn!(
                "failed to remove partial workspace {}: {cleanup}",
                root.display()
            );
        }
        Error::Workspace(format!("template copy failed: {e}"))
    })?;

    log::info!("workspace {} created at {}", token, root.display());
    Ok(Workspace { token, root })
}

/// Removes the workspace tree, best-effort.
///
/// Failures are logged and swallowed so a pipeline failure is never masked
/// by a cleanup failure.
pub fn destroy(workspace: &Workspace) {
    match fs::remove_dir_all(&workspace.root) {
        Ok(()) => log::info!("workspace {} removed", workspace.token),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!(
            "failed to remove workspace {}: {e}",
            workspace.root.display()
        ),
    }
}

fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(std::io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(std::io::Error::other)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            // fs::copy carries permission bits, which keeps gradlew runnable
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_eight_lowercase_hex_chars() {
        let token = new_token();
        assert_eq!(token.len(), 8);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, new_token());
    }

    #[test]
    fn create_copies_tree_and_destroy_removes_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let template = dir.path().join("template");
        fs::create_dir_all(template.join("app/src")).expect("mkdir");
        fs::write(template.join("app/src/Main.kt"), "package x\n").expect("write");
        fs::write(template.join("build.gradle"), "// root\n").expect("write");

        let workspace = create(&template, dir.path()).expect("create");
        assert!(workspace.root.join("app/src/Main.kt").is_file());
        assert!(workspace.root.join("build.gradle").is_file());

        destroy(&workspace);
        assert!(!workspace.root.exists());
        // Second destroy is a silent no-op
        destroy(&workspace);
    }

    #[test]
    fn create_rejects_missing_template() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        assert!(matches!(
            create(&missing, dir.path()),
            Err(Error::Workspace(_))
        ));
    }
}
