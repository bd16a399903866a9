//! Clean logic
//!
//! Removes the output directory and everything built into it.

use std::path::{Path, PathBuf};

use crate::core::manifest::Manifest;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Result of clean operation
#[derive(Debug, Default)]
pub struct CleanResult {
    /// The output directory
    pub output_dir: PathBuf,
    /// Whether it existed and was removed
    pub removed: bool,
}

/// Clean build artifacts from a project
///
/// Removes the manifest's output directory if it exists.
pub fn clean_project(project_root: &Path, manifest: &Manifest) -> Result<CleanResult, FilesystemError> {
    let output_dir = project_root.join(&manifest.build.output_dir);
    let removed = output_dir.exists();
    filesystem::remove_dir_all(&output_dir)?;
    if removed {
        tracing::info!("Removed {}", output_dir.display());
    }
    Ok(CleanResult {
        output_dir,
        removed,
    })
}

/// Check if a project has any build artifacts
pub fn has_build_artifacts(project_root: &Path, manifest: &Manifest) -> bool {
    project_root.join(&manifest.build.output_dir).exists()
}
