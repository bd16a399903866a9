//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars,
//! status messages and errors to the user.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::ModbuildError;

/// Output settings derived from the top-level flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Suppress everything except errors
    pub quiet: bool,
    /// Verbosity count (-v info, -vv debug)
    pub verbose: u8,
}

impl OutputConfig {
    /// Create output settings
    pub fn new(quiet: bool, verbose: u8) -> Self {
        Self { quiet, verbose }
    }

    /// Default log level when RUST_LOG is not set
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    /// Install the global tracing subscriber, writing to stderr
    pub fn apply_global(&self) {
        let filter = EnvFilter::builder()
            .with_default_directive(self.log_level().into())
            .from_env_lossy();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Build progress bar, hidden in quiet or verbose mode
    pub fn build_bar(&self, total: u64) -> ProgressBar {
        if self.quiet || self.verbose > 0 {
            ProgressBar::hidden()
        } else {
            create_build_bar(total)
        }
    }

    /// Print a status line unless quiet
    pub fn status(&self, prefix: &str, message: &str) {
        if !self.quiet {
            println!("{prefix} {message}");
        }
    }
}

/// Create a progress bar for module builds
pub fn create_build_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} modules ({msg})")
        .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("█▓▒░"));
    pb.set_style(style);
    pb
}

/// Print an error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Process exit status for an error returned by a command
pub fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|e| e.downcast_ref::<ModbuildError>())
        .map_or(1, ModbuildError::exit_code)
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";
}
