//! Listing of candidate source images in a samples directory.

use std::path::{Path, PathBuf};

use crate::error::{Result, SplitError};

/// Extensions accepted as source images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png", "jpeg", "bmp", "gif"];

/// Whether `path` has one of [`IMAGE_EXTENSIONS`].
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Image files directly inside `dir`, sorted by file name.
///
/// # Errors
///
/// [`SplitError::MissingInput`] when `dir` does not exist or holds no image
/// files.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SplitError::MissingInput(format!(
            "samples directory {} does not exist",
            dir.display()
        )));
    }

    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if images.is_empty() {
        return Err(SplitError::MissingInput(format!(
            "no image files in {}",
            dir.display()
        )));
    }
    tracing::debug!(dir = %dir.display(), count = images.len(), "listed sample images");
    Ok(images)
}

/// Numbered menu lines, `1. name`, for the operator.
pub fn menu_lines(images: &[PathBuf]) -> Vec<String> {
    images
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            format!("{}. {name}", i + 1)
        })
        .collect()
}
