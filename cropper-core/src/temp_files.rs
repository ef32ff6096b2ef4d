//! Temporary file helpers.
//!
//! Temporary outputs are created with the tempfile crate so they are removed
//! on drop if a crop fails part way.

use crate::error::CoreResult;
use std::path::Path;
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

/// Creates a temporary file with prefix and extension. Auto-deleted when dropped.
pub fn create_temp_file(dir: &Path, prefix: &str, extension: &str) -> CoreResult<NamedTempFile> {
    std::fs::create_dir_all(dir)?;
    let prefix = format!("{prefix}_");
    let suffix = if extension.is_empty() {
        String::new()
    } else {
        format!(".{extension}")
    };
    Ok(TempFileBuilder::new()
        .prefix(&prefix)
        .suffix(&suffix)
        .tempfile_in(dir)?)
}

/// Temporary file next to `path` with the same extension, so a later
/// `persist` over `path` stays on one filesystem.
pub fn create_sibling_temp_file(path: &Path) -> CoreResult<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    create_temp_file(dir, ".cropper", &extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_temp_file_keeps_dir_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("movie.mkv");
        let temp = create_sibling_temp_file(&input).unwrap();

        assert_eq!(temp.path().parent(), Some(dir.path()));
        assert_eq!(temp.path().extension().and_then(|e| e.to_str()), Some("mkv"));

        let temp_path = temp.path().to_path_buf();
        drop(temp);
        assert!(!temp_path.exists());
    }
}
