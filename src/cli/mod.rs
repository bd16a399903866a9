//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;

use crate::config::defaults;
use commands::Commands;
use output::OutputConfig;

/// modbuild - dependency-aware builds for multi-module native projects
///
/// Builds every enabled module into a shared library in dependency order,
/// then links the final executable.
#[derive(Parser, Debug)]
#[command(name = "modbuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Project directory
    #[arg(short = 'C', long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Manifest path (defaults to modbuild.toml in the project directory)
    #[arg(short, long, env = "MODBUILD_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Modules built concurrently per dependency level (0 = one per CPU)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Output settings requested on the command line
    pub fn output(&self) -> OutputConfig {
        OutputConfig::new(self.quiet, self.verbose)
    }

    /// Path of the manifest to load
    pub fn manifest_path(&self) -> PathBuf {
        match &self.manifest {
            Some(path) if path.is_relative() => self.project_dir.join(path),
            Some(path) => path.clone(),
            None => self.project_dir.join(defaults::MANIFEST_FILE),
        }
    }

    /// Directory relative manifest paths are resolved against
    pub fn project_root(&self) -> PathBuf {
        let manifest = self.manifest_path();
        let root = manifest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if root.is_absolute() {
            return root.to_path_buf();
        }
        std::env::current_dir().map_or_else(|_| root.to_path_buf(), |cwd| cwd.join(root))
    }

    /// Execute the CLI command and return the process exit status
    pub async fn run(self) -> Result<i32> {
        let context = commands::Context {
            manifest_path: self.manifest_path(),
            project_root: self.project_root(),
            jobs: self.jobs,
            output: self.output(),
        };
        self.command.run(&context).await
    }
}
