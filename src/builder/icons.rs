//! Launcher icon rendering for the fixed density buckets.

use std::path::Path;

use image::imageops::FilterType;

use super::error::{Error, Result};

/// Density bucket directory names and their square icon sizes.
pub const ICON_BUCKETS: [(&str, u32); 5] = [
    ("mipmap-mdpi", 48),
    ("mipmap-hdpi", 72),
    ("mipmap-xhdpi", 96),
    ("mipmap-xxhdpi", 144),
    ("mipmap-xxxhdpi", 192),
];

/// Renders `ic_launcher.png` and `ic_launcher_round.png` for every bucket.
///
/// The source image is decoded from bytes, converted to RGBA and
/// Lanczos3-resized per bucket. The round variant is a duplicate of the
/// square one; templates mask it at display time.
///
/// # Errors
///
/// [`Error::Asset`] carrying the decoder's or encoder's reason.
pub fn render_launcher_icons(icon_bytes: &[u8], workspace_root: &Path) -> Result<()> {
    let decoded = image::load_from_memory(icon_bytes)
        .map_err(|e| Error::Asset(format!("could not decode icon: {e}")))?;
    let rgba = decoded.to_rgba8();

    for (bucket, size) in ICON_BUCKETS {
        let dir = workspace_root.join("app/src/main/res").join(bucket);
        std::fs::create_dir_all(&dir)?;

        let resized = image::imageops::resize(&rgba, size, size, FilterType::Lanczos3);
        resized
            .save(dir.join("ic_launcher.png"))
            .map_err(|e| Error::Asset(format!("could not write {bucket} icon: {e}")))?;
        resized
            .save(dir.join("ic_launcher_round.png"))
            .map_err(|e| Error::Asset(format!("could not write {bucket} round icon: {e}")))?;
    }
    Ok(())
}
