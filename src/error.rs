//! Error types for modbuild
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Manifest configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Manifest file not found
    #[error("Manifest not found at '{path}'")]
    NotFound { path: PathBuf },

    /// Manifest could not be read
    #[error("Failed to read manifest '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Manifest is not valid TOML or does not match the schema
    #[error("Failed to parse manifest '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Environment variable substitution failed
    #[error("Environment substitution failed: {error}")]
    Substitution { error: String },

    /// Module declared more than once
    #[error("Module '{name}' is declared more than once")]
    DuplicateModule { name: String },

    /// Module name cannot be used as a library name
    #[error("Invalid module name '{name}': {reason}")]
    InvalidModuleName { name: String, reason: String },

    /// Dependency is not declared anywhere in the manifest
    #[error("Module '{module}' depends on '{dependency}', which is not declared in the manifest")]
    UnknownDependency { module: String, dependency: String },
}

/// Dependency resolution errors
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Circular dependency detected
    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Dependency is not a node of the graph
    #[error("Missing dependency: '{dependency}' required by '{module}'")]
    MissingDependency { module: String, dependency: String },

    /// Enabled module depends on a disabled one
    #[error("Module '{module}' depends on '{dependency}', which is disabled")]
    DisabledDependency { module: String, dependency: String },
}

/// Build and link errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// A dependency was skipped and left nothing to link against
    #[error(
        "Module '{module}' depends on '{dependency}', which has no source files and produced no artifact"
    )]
    MissingArtifact { module: String, dependency: String },

    /// Toolchain returned non-zero while compiling a module
    #[error("Build failed for module '{module}':\n{output}")]
    BuildFailed { module: String, output: String },

    /// Toolchain returned non-zero while linking the executable
    #[error("Link failed:\n{output}")]
    LinkFailed { output: String },

    /// Toolchain could not be started
    #[error("Failed to run toolchain '{toolchain}': {error}")]
    ToolchainUnavailable { toolchain: String, error: String },

    /// A parallel build task panicked or was cancelled
    #[error("Build task for module '{module}' did not complete: {error}")]
    TaskFailed { module: String, error: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to remove file
    #[error("Failed to remove file '{path}': {error}")]
    RemoveFile { path: PathBuf, error: String },

    /// Failed to move a file into place
    #[error("Failed to move '{from}' to '{to}': {error}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// Top-level modbuild error type
#[derive(Error, Debug)]
pub enum ModbuildError {
    /// Malformed command line
    #[error("Invalid invocation: {message}")]
    Invocation { message: String },

    /// Manifest configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resolver error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Build error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Failed to execute the produced program
    #[error("Failed to execute '{path}': {error}")]
    Execute { path: PathBuf, error: String },
}

impl ModbuildError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Invocation { .. } => 2,
            _ => 1,
        }
    }
}
