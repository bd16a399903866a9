//! Filesystem operations
//!
//! Handles the few file and directory operations the build performs on the
//! output directory.

use std::path::Path;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Remove a file if it exists. Returns whether something was removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool, FilesystemError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FilesystemError::RemoveFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        }),
    }
}

/// Move a finished file onto its final path
pub fn rename(from: &Path, to: &Path) -> Result<(), FilesystemError> {
    std::fs::rename(from, to).map_err(|e| FilesystemError::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error: e.to_string(),
    })
}
