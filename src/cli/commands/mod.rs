//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod check;
pub mod clean;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::cli::output::OutputConfig;
use crate::core::manifest::Manifest;
use crate::core::orchestrator::RunMode;
use crate::error::ModbuildError;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build every module library and link the executable
    #[command(visible_alias = "b")]
    Build,

    /// Build, link and run the executable
    #[command(visible_alias = "r", disable_help_flag = true, disable_version_flag = true)]
    Run {
        /// Arguments passed verbatim to the program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
        args: Vec<String>,
    },

    /// Build the module libraries without linking
    #[command(name = "libraries-only", visible_aliases = ["librariesOnly", "libs", "l"])]
    LibrariesOnly,

    /// Validate the manifest and print the build plan
    Check {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove build artifacts
    Clean,
}

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    /// Manifest to load
    pub manifest_path: PathBuf,
    /// Root that relative manifest paths resolve against
    pub project_root: PathBuf,
    /// Job count override
    pub jobs: Option<usize>,
    /// Output settings
    pub output: OutputConfig,
}

impl Context {
    /// Load and validate the manifest
    pub fn load_manifest(&self) -> Result<Manifest> {
        Ok(Manifest::load(&self.manifest_path).map_err(ModbuildError::from)?)
    }
}

impl Commands {
    /// Run mode for the build commands
    pub fn mode(&self) -> Option<RunMode> {
        match self {
            Self::Build => Some(RunMode::Build),
            Self::Run { .. } => Some(RunMode::BuildAndRun),
            Self::LibrariesOnly => Some(RunMode::LibrariesOnly),
            Self::Check { .. } | Self::Clean => None,
        }
    }

    /// Execute the command and return the process exit status
    pub async fn run(self, context: &Context) -> Result<i32> {
        if let Some(mode) = self.mode() {
            let forwarded = match self {
                Self::Run { args } => args,
                _ => Vec::new(),
            };
            return build::execute(context, mode, &forwarded).await;
        }

        match self {
            Self::Check { json } => check::execute(context, json).await?,
            Self::Clean => clean::execute(context).await?,
            _ => tracing::debug!("Nothing to do"),
        }
        Ok(0)
    }
}
