//! Filesystem helpers shared by the store and the exporters.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::constants::IMAGE_EXTENSIONS;

/// Write `contents` to `path` by way of a sibling temp file.
///
/// The target is only replaced once the temp file is fully written, so an
/// interrupted write leaves the previous file intact.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, contents)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

/// Whether the path has one of the supported image extensions.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// List the images directly inside `dir`, sorted by path.
pub fn scan_images(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_file(path))
        .collect();
    images.sort();
    Ok(images)
}
