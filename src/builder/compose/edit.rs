//! Fail-soft text-edit primitives for the composition rules.
//!
//! Every primitive is a no-op when its target text is absent, so a rule
//! applied to an already-transformed workspace converges instead of
//! duplicating content. Insertions take an explicit guard string for the
//! same reason: if the guard is already present the insertion is skipped.

use std::fs;
use std::path::Path;

use super::super::error::Result;

/// Replaces the first occurrence of `needle`, no-op when absent.
pub fn replace_once(content: &str, needle: &str, replacement: &str) -> String {
    content.replacen(needle, replacement, 1)
}

/// Replaces every occurrence of `needle`, no-op when absent.
pub fn replace_all(content: &str, needle: &str, replacement: &str) -> String {
    content.replace(needle, replacement)
}

/// Inserts `block` immediately before the first `anchor`, skipped when
/// `guard` is already present in the content.
pub fn insert_before(content: &str, anchor: &str, block: &str, guard: &str) -> String {
    if content.contains(guard) {
        return content.to_string();
    }
    content.replacen(anchor, &format!("{block}{anchor}"), 1)
}

/// Inserts `block` immediately after the first `anchor`, skipped when
/// `guard` is already present in the content.
pub fn insert_after(content: &str, anchor: &str, block: &str, guard: &str) -> String {
    if content.contains(guard) {
        return content.to_string();
    }
    content.replacen(anchor, &format!("{anchor}{block}"), 1)
}

/// Removes the first occurrence of `block`, no-op when absent.
pub fn remove_block(content: &str, block: &str) -> String {
    content.replacen(block, "", 1)
}

/// Removes a delimited region: from the line containing `marker` through
/// the next line exactly equal to `terminator` (a closing brace at a fixed
/// indentation). No-op when the marker is absent, and equally when the
/// terminator never follows it: an unterminated region means the file has
/// drifted from the expected shape, and truncating it would do far more
/// damage than leaving it alone.
pub fn remove_region(content: &str, marker: &str, terminator: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let Some(start) = lines.iter().position(|line| line.contains(marker)) else {
        return content.to_string();
    };
    let Some(end) = lines[start..]
        .iter()
        .position(|line| *line == terminator)
        .map(|offset| start + offset)
    else {
        log::warn!("no {terminator:?} line after {marker:?}, leaving region in place");
        return content.to_string();
    };

    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
    kept.extend(&lines[..start]);
    kept.extend(&lines[end + 1..]);

    let mut out = kept.join("\n");
    if content.ends_with('\n') && !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Applies an edit function to a file in place.
///
/// A missing file is treated like missing target text (fail-soft no-op);
/// the file is only rewritten when the content actually changed.
pub fn rewrite_file<F>(path: &Path, edit: F) -> Result<()>
where
    F: FnOnce(&str) -> String,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("skipping edit, {} does not exist", path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let edited = edit(&content);
    if edited != content {
        fs::write(path, edited)?;
    }
    Ok(())
}
