//! Final link
//!
//! Links the executable against every module library produced in this
//! run plus the platform's mandatory system libraries.

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::builder::{produce, BuildSettings};
use crate::core::module::Artifact;
use crate::error::{BuildError, ModbuildError};
use crate::infra::toolchain::{Toolchain, ToolchainInvocation};

/// Links the final executable
#[derive(Clone)]
pub struct Linker {
    settings: Arc<BuildSettings>,
    toolchain: Arc<dyn Toolchain>,
    executable: String,
}

impl Linker {
    /// Create a linker producing `<output_dir>/<executable><exe suffix>`
    pub fn new(settings: Arc<BuildSettings>, toolchain: Arc<dyn Toolchain>, executable: &str) -> Self {
        Self {
            settings,
            toolchain,
            executable: executable.to_string(),
        }
    }

    /// Final path of the executable
    pub fn executable_path(&self) -> PathBuf {
        self.settings
            .output_dir
            .join(self.settings.profile.executable_file_name(&self.executable))
    }

    /// Invocation linking `main_sources` against `artifacts`.
    ///
    /// `extra_libs` are platform libraries requested by individual modules.
    /// The output directory is embedded as runtime search path where the
    /// platform supports it; on Windows the libraries sit next to the
    /// executable, where the loader looks first.
    pub fn invocation(
        &self,
        main_sources: &[PathBuf],
        artifacts: &[Artifact],
        extra_libs: &[String],
    ) -> ToolchainInvocation {
        let profile = &self.settings.profile;
        let mut flags = self.settings.compile_flags();
        if let Some(rpath) = profile.rpath_flag(&self.settings.output_dir) {
            flags.push(rpath);
        }

        let mut link_flags = self.settings.library_flags(artifacts);
        let mut system_libs: Vec<&String> = Vec::new();
        for lib in extra_libs.iter().chain(profile.system_libs.iter()) {
            if !system_libs.contains(&lib) {
                system_libs.push(lib);
            }
        }
        link_flags.extend(system_libs.into_iter().map(|l| format!("-l{l}")));

        let file_name = profile.executable_file_name(&self.executable);
        ToolchainInvocation {
            flags,
            sources: main_sources.to_vec(),
            link_flags,
            output: self.settings.staging_path(&file_name),
        }
    }

    /// Link the executable
    pub fn link(
        &self,
        main_sources: &[PathBuf],
        artifacts: &[Artifact],
        extra_libs: &[String],
    ) -> Result<Artifact, ModbuildError> {
        let target = self.executable_path();
        let invocation = self.invocation(main_sources, artifacts, extra_libs);
        tracing::info!(
            "Linking {} against {} module libraries",
            target.display(),
            artifacts.len()
        );

        if let Some(output) = produce(self.toolchain.as_ref(), &invocation, &target)? {
            return Err(BuildError::LinkFailed { output }.into());
        }

        Ok(Artifact::executable(target))
    }
}

impl std::fmt::Debug for Linker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Linker")
            .field("executable", &self.executable)
            .field("toolchain", &self.toolchain.name())
            .finish()
    }
}
