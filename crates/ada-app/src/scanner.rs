//! Locating and decoding input images

use ada_types::{Error, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// True when the extension (case-insensitive) is one we can decode
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Check that `path` is an existing file with a supported extension.
///
/// The contents are not decoded here; see [`load_rgb_image`].
pub fn validate_image(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|_| Error::FileNotFound(path.display().to_string()))?;

    if !metadata.is_file() {
        return Err(Error::InvalidImageFormat(format!("{} is not a file", path.display())));
    }
    if !is_supported_image(path) {
        return Err(Error::InvalidImageFormat(format!(
            "Unsupported image format: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Validate and decode an image as 8-bit RGB
pub fn load_rgb_image(path: &Path) -> Result<RgbImage> {
    validate_image(path)?;
    Ok(image::open(path)?.to_rgb8())
}

/// Every supported image under `dir`, recursively.
///
/// Ordered by path relative to `dir`, so two `photo.jpg` files in
/// different subfolders keep a stable order.
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    match std::fs::metadata(dir) {
        Err(_) => return Err(Error::FileNotFound(dir.display().to_string())),
        Ok(m) if !m.is_dir() => {
            return Err(Error::InvalidImageFormat(format!("{} is not a directory", dir.display())))
        }
        Ok(_) => {}
    }

    let mut found: Vec<(PathBuf, PathBuf)> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(is_image_entry)
        .map(|entry| {
            let path = entry.into_path();
            let relative = path.strip_prefix(dir).map(Path::to_path_buf).unwrap_or_else(|_| path.clone());
            (relative, path)
        })
        .collect();

    found.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

fn is_image_entry(entry: &DirEntry) -> bool {
    entry.file_type().is_file() && is_supported_image(entry.path())
}
