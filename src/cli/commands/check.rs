//! Check command implementation
//!
//! Implements `modbuild check` to validate the manifest without building.

use anyhow::{Context as _, Result};

use crate::cli::commands::Context;
use crate::cli::output::status;
use crate::core::check;

/// Execute the check command
pub async fn execute(context: &Context, json: bool) -> Result<()> {
    let manifest = context.load_manifest()?;
    tracing::info!("Checking project: {}", manifest.project.name);

    let result = check::check(&context.project_root, &manifest)?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&result).context("Failed to serialize check result")?;
        println!("{rendered}");
        return Ok(());
    }

    let output = &context.output;
    output.status(status::SUCCESS, "Manifest is valid");
    if result.toolchain_available {
        output.status(
            status::SUCCESS,
            &format!("Compiler '{}' is available", manifest.toolchain.compiler),
        );
    }
    for warning in &result.warnings {
        output.status(status::WARNING, warning);
    }

    if context.output.quiet {
        return Ok(());
    }

    println!("\nBuild order:");
    if result.build_order.is_empty() {
        println!("  (none)");
    }
    for (level, modules) in result.levels.iter().enumerate() {
        println!("  level {level}: {}", modules.join(", "));
    }

    println!("\nModules:");
    for module in &result.modules {
        let state = if module.enabled {
            format!("{} sources", module.sources)
        } else {
            "disabled".to_string()
        };
        if module.depends.is_empty() {
            println!("  • {} ({state})", module.name);
        } else {
            println!(
                "  • {} ({state}) -> {}",
                module.name,
                module.depends.join(", ")
            );
        }
    }

    Ok(())
}
