//! CLI implementation for `modbuild clean` command

use anyhow::{Context as _, Result};

use crate::cli::commands::Context;
use crate::cli::output::status;
use crate::core::clean::{clean_project, has_build_artifacts};

/// Execute the clean command
pub async fn execute(context: &Context) -> Result<()> {
    let manifest = context.load_manifest()?;

    if !has_build_artifacts(&context.project_root, &manifest) {
        context.output.status(status::SUCCESS, "Nothing to clean");
        return Ok(());
    }

    let result = clean_project(&context.project_root, &manifest)
        .context("Failed to clean build artifacts")?;
    context.output.status(
        status::SUCCESS,
        &format!("Removed {}", result.output_dir.display()),
    );

    Ok(())
}
