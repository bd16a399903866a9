//! Toolchain invocation
//!
//! The compiler is an external collaborator. [`Toolchain`] is the seam
//! between build planning and the process that actually compiles, so the
//! orchestrator can be driven by a recording toolchain in tests.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::BuildError;

/// One compiler/linker call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainInvocation {
    /// Flags placed before the sources (optimization, warnings, includes)
    pub flags: Vec<String>,
    /// Source files, in order
    pub sources: Vec<PathBuf>,
    /// Flags placed after the sources (search paths and libraries)
    pub link_flags: Vec<String>,
    /// Where the artifact is written
    pub output: PathBuf,
}

impl ToolchainInvocation {
    /// Command-line arguments: `<flags> -o <output> <sources> <link flags>`
    pub fn args(&self) -> Vec<String> {
        let mut args = self.flags.clone();
        args.push("-o".to_string());
        args.push(self.output.display().to_string());
        args.extend(self.sources.iter().map(|s| s.display().to_string()));
        args.extend(self.link_flags.iter().cloned());
        args
    }
}

/// Result of a toolchain call that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainOutput {
    /// Whether the toolchain exited with status zero
    pub success: bool,
    /// Combined diagnostic text (stderr then stdout)
    pub diagnostics: String,
}

/// Something that can turn sources into an artifact.
///
/// Implementations block until the artifact is written or the toolchain
/// has failed. They are called from worker threads during parallel
/// builds.
pub trait Toolchain: Send + Sync {
    /// Human-readable name used in errors and logs
    fn name(&self) -> String;

    /// Run one invocation to completion
    fn invoke(&self, invocation: &ToolchainInvocation) -> Result<ToolchainOutput, BuildError>;

    /// Verify the toolchain is usable before the first build step
    fn check(&self) -> Result<(), BuildError> {
        Ok(())
    }
}

/// Compiler driver run as a child process (gcc, clang, cc)
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    /// Compiler binary, a bare name looked up in PATH or a path
    compiler: PathBuf,
}

impl CommandToolchain {
    /// Create a toolchain wrapper around `compiler`
    pub fn new(compiler: impl Into<PathBuf>) -> Self {
        Self {
            compiler: compiler.into(),
        }
    }

    /// Create a wrapper, resolving relative compiler paths against `project_root`.
    ///
    /// Bare names such as `gcc` are left for PATH lookup.
    pub fn for_project(compiler: &str, project_root: &Path) -> Self {
        let path = Path::new(compiler);
        if path.components().count() > 1 && path.is_relative() {
            Self::new(project_root.join(path))
        } else {
            Self::new(path)
        }
    }

    /// Get the path to the compiler binary
    pub fn compiler(&self) -> &Path {
        &self.compiler
    }

    /// Check that the compiler can be found before any build step runs
    pub fn resolve(&self) -> Result<PathBuf, BuildError> {
        which::which(&self.compiler).map_err(|e| BuildError::ToolchainUnavailable {
            toolchain: self.compiler.display().to_string(),
            error: e.to_string(),
        })
    }
}

impl Toolchain for CommandToolchain {
    fn name(&self) -> String {
        self.compiler.display().to_string()
    }

    fn check(&self) -> Result<(), BuildError> {
        let path = self.resolve()?;
        tracing::debug!("Using compiler {}", path.display());
        Ok(())
    }

    fn invoke(&self, invocation: &ToolchainInvocation) -> Result<ToolchainOutput, BuildError> {
        let args = invocation.args();
        tracing::debug!("Running {} {}", self.compiler.display(), args.join(" "));

        let output = Command::new(&self.compiler)
            .args(&args)
            .output()
            .map_err(|e| BuildError::ToolchainUnavailable {
                toolchain: self.name(),
                error: e.to_string(),
            })?;

        let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            if !diagnostics.is_empty() && !diagnostics.ends_with('\n') {
                diagnostics.push('\n');
            }
            diagnostics.push_str(&stdout);
        }
        if !output.status.success() && diagnostics.trim().is_empty() {
            diagnostics = format!("{} exited with {}", self.name(), output.status);
        }

        Ok(ToolchainOutput {
            success: output.status.success(),
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_put_libraries_after_sources() {
        let invocation = ToolchainInvocation {
            flags: vec!["-O3".into(), "-shared".into()],
            sources: vec!["vector/vector.c".into()],
            link_flags: vec!["-Lbuild".into(), "-lalgorithm".into()],
            output: "build/libvector.so".into(),
        };
        assert_eq!(
            invocation.args(),
            vec![
                "-O3",
                "-shared",
                "-o",
                "build/libvector.so",
                "vector/vector.c",
                "-Lbuild",
                "-lalgorithm"
            ]
        );
    }

    #[test]
    fn test_for_project_resolves_relative_paths() {
        let root = Path::new("/project");
        assert_eq!(
            CommandToolchain::for_project("tools/cc.sh", root).compiler(),
            Path::new("/project/tools/cc.sh")
        );
        assert_eq!(
            CommandToolchain::for_project("gcc", root).compiler(),
            Path::new("gcc")
        );
    }

    #[test]
    fn test_missing_compiler_is_reported() {
        let toolchain = CommandToolchain::new("modbuild-no-such-compiler");
        assert!(matches!(
            toolchain.check(),
            Err(BuildError::ToolchainUnavailable { .. })
        ));
        let err = toolchain
            .invoke(&ToolchainInvocation::default())
            .unwrap_err();
        assert!(matches!(err, BuildError::ToolchainUnavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_compiler_output_is_captured() {
        let toolchain = CommandToolchain::new("false");
        let output = toolchain.invoke(&ToolchainInvocation::default()).unwrap();
        assert!(!output.success);
        assert!(!output.diagnostics.is_empty());
    }
}
