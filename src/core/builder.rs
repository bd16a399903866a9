//! Module builds
//!
//! Compiles one module's sources into a shared library, linking it against
//! the artifacts of its already-built dependencies.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::manifest::Manifest;
use crate::core::module::Artifact;
use crate::core::platform::PlatformProfile;
use crate::error::{BuildError, ModbuildError};
use crate::infra::filesystem;
use crate::infra::toolchain::{Toolchain, ToolchainInvocation};

/// Compiler settings shared by every module build and the final link
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Naming and link conventions of the host
    pub profile: PlatformProfile,
    /// Flat output directory for every artifact
    pub output_dir: PathBuf,
    /// Flags applied to every compile
    pub flags: Vec<String>,
    /// Header search directories; the project root comes first
    pub include_dirs: Vec<PathBuf>,
    /// Extra library search directories
    pub lib_dirs: Vec<PathBuf>,
    /// External libraries linked into every artifact
    pub libs: Vec<String>,
}

impl BuildSettings {
    /// Resolve manifest settings against `project_root`
    pub fn from_manifest(manifest: &Manifest, project_root: &Path, profile: PlatformProfile) -> Self {
        let toolchain = &manifest.toolchain;
        let mut include_dirs = vec![project_root.to_path_buf()];
        include_dirs.extend(toolchain.include_dirs.iter().map(|d| project_root.join(d)));

        Self {
            profile,
            output_dir: project_root.join(&manifest.build.output_dir),
            flags: toolchain.flags.clone(),
            include_dirs,
            lib_dirs: toolchain.lib_dirs.iter().map(|d| project_root.join(d)).collect(),
            libs: toolchain.libs.clone(),
        }
    }

    /// Compile flags followed by `-I` for every include directory
    pub(crate) fn compile_flags(&self) -> Vec<String> {
        let mut flags = self.flags.clone();
        flags.extend(
            self.include_dirs
                .iter()
                .map(|d| format!("-I{}", d.display())),
        );
        flags
    }

    /// `-L`/`-l` flags for the given artifacts followed by the external libraries
    pub(crate) fn library_flags(&self, artifacts: &[Artifact]) -> Vec<String> {
        let mut search_dirs: Vec<&Path> = Vec::new();
        for artifact in artifacts {
            if let Some(parent) = artifact.path.parent() {
                if !search_dirs.contains(&parent) {
                    search_dirs.push(parent);
                }
            }
        }

        let mut flags: Vec<String> = search_dirs
            .iter()
            .map(|d| format!("-L{}", d.display()))
            .collect();
        flags.extend(
            artifacts
                .iter()
                .filter_map(|a| a.module.as_deref())
                .map(|m| self.profile.link_flag(m)),
        );
        flags.extend(self.lib_dirs.iter().map(|d| format!("-L{}", d.display())));
        flags.extend(self.libs.iter().map(|l| format!("-l{l}")));
        flags
    }

    /// Temporary path the toolchain writes to before the artifact is moved into place
    pub(crate) fn staging_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(format!(".partial-{file_name}"))
    }
}

/// Run `invocation`, whose output is a staging file, then move the result
/// onto `target`. The target is removed first so a failed build never
/// leaves a stale artifact behind.
///
/// Returns the toolchain diagnostics when the step failed.
pub(crate) fn produce(
    toolchain: &dyn Toolchain,
    invocation: &ToolchainInvocation,
    target: &Path,
) -> Result<Option<String>, ModbuildError> {
    let staging = &invocation.output;
    if filesystem::remove_file_if_exists(target)? {
        tracing::debug!("Removed previous artifact {}", target.display());
    }
    filesystem::remove_file_if_exists(staging)?;

    let output = toolchain.invoke(invocation)?;
    if !output.success {
        if let Err(e) = filesystem::remove_file_if_exists(staging) {
            tracing::warn!("Failed to clean up {}: {}", staging.display(), e);
        }
        return Ok(Some(output.diagnostics));
    }
    if !staging.exists() {
        return Ok(Some(format!(
            "{} reported success but wrote no file to {}",
            toolchain.name(),
            staging.display()
        )));
    }

    filesystem::rename(staging, target)?;
    if !output.diagnostics.trim().is_empty() {
        tracing::warn!("{}", output.diagnostics.trim_end());
    }
    Ok(None)
}

/// Compiles modules into shared libraries
#[derive(Clone)]
pub struct ModuleBuilder {
    settings: Arc<BuildSettings>,
    toolchain: Arc<dyn Toolchain>,
}

impl ModuleBuilder {
    /// Create a builder writing into `settings.output_dir`
    pub fn new(settings: Arc<BuildSettings>, toolchain: Arc<dyn Toolchain>) -> Self {
        Self {
            settings,
            toolchain,
        }
    }

    /// Final path of the shared library for `module`
    pub fn artifact_path(&self, module: &str) -> PathBuf {
        self.settings
            .output_dir
            .join(self.settings.profile.library_file_name(module))
    }

    /// Invocation that compiles `sources` into the library of `module`
    pub fn invocation(
        &self,
        module: &str,
        sources: &[PathBuf],
        dependencies: &[Artifact],
    ) -> ToolchainInvocation {
        let file_name = self.settings.profile.library_file_name(module);
        let mut flags = self.settings.compile_flags();
        flags.extend(self.settings.profile.shared_library_flags(&file_name));

        ToolchainInvocation {
            flags,
            sources: sources.to_vec(),
            link_flags: self.settings.library_flags(dependencies),
            output: self.settings.staging_path(&file_name),
        }
    }

    /// Build `module` from `sources`, linking against `dependencies`
    pub fn build(
        &self,
        module: &str,
        sources: &[PathBuf],
        dependencies: &[Artifact],
    ) -> Result<Artifact, ModbuildError> {
        let target = self.artifact_path(module);
        let invocation = self.invocation(module, sources, dependencies);
        tracing::info!(
            "Building module {module} ({} sources, {} dependencies)",
            sources.len(),
            dependencies.len()
        );

        if let Some(output) = produce(self.toolchain.as_ref(), &invocation, &target)? {
            return Err(BuildError::BuildFailed {
                module: module.to_string(),
                output,
            }
            .into());
        }

        tracing::info!("Built module {module}: {}", target.display());
        Ok(Artifact::shared_library(module, target))
    }
}

impl std::fmt::Debug for ModuleBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleBuilder")
            .field("output_dir", &self.settings.output_dir)
            .field("toolchain", &self.toolchain.name())
            .finish()
    }
}
