//! Build command implementation
//!
//! Implements `modbuild build`, `modbuild run` and
//! `modbuild libraries-only`.

use anyhow::Result;

use crate::cli::commands::Context;
use crate::cli::output::status;
use crate::core::orchestrator::{Orchestrator, RunMode, RunReport};

/// Execute a build in `mode`, returning the process exit status
pub async fn execute(context: &Context, mode: RunMode, forwarded: &[String]) -> Result<i32> {
    let manifest = context.load_manifest()?;
    tracing::info!("Building project: {}", manifest.project.name);

    let total = manifest.enabled_modules().count() as u64;
    let mut orchestrator = Orchestrator::new(manifest, &context.project_root)
        .with_progress(context.output.build_bar(total));
    if let Some(jobs) = context.jobs {
        orchestrator = orchestrator.with_jobs(jobs);
    }
    tracing::debug!("{orchestrator:?}");

    let report = orchestrator.run(mode, forwarded).await?;
    if let Some(code) = report.exit_code {
        return Ok(code);
    }

    summarize(context, mode, &report);
    Ok(0)
}

fn summarize(context: &Context, mode: RunMode, report: &RunReport) {
    let output = &context.output;
    for module in &report.skipped {
        output.status(
            status::WARNING,
            &format!("Skipped module '{module}' (no source files)"),
        );
    }

    match (&report.executable, mode) {
        (Some(executable), _) => output.status(
            status::SUCCESS,
            &format!("Build successful: {}", executable.display()),
        ),
        (None, RunMode::LibrariesOnly) => output.status(
            status::SUCCESS,
            &format!("Built {} module libraries", report.built.len()),
        ),
        (None, _) => {}
    }
}
