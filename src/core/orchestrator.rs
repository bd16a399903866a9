//! Build orchestration
//!
//! Drives a complete run: plan the build from the manifest, build every
//! module library in plan order (or level by level in parallel), link the
//! executable and optionally run it.
//!
//! Configuration and graph errors are reported before any toolchain call.
//! The first failing build step aborts the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::defaults;
use crate::core::builder::{BuildSettings, ModuleBuilder};
use crate::core::discovery::discover;
use crate::core::linker::Linker;
use crate::core::manifest::Manifest;
use crate::core::module::{Artifact, ModuleRegistry, ModuleStatus};
use crate::core::platform::PlatformProfile;
use crate::core::resolver::{BuildPlan, DependencyGraph};
use crate::error::{BuildError, ModbuildError};
use crate::infra::filesystem;
use crate::infra::process::run_program;
use crate::infra::toolchain::{CommandToolchain, Toolchain};

/// What a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Build every library and link the executable
    Build,
    /// Build, link, then execute the program with forwarded arguments
    BuildAndRun,
    /// Build the libraries only; nothing is linked
    LibrariesOnly,
}

impl RunMode {
    /// Whether the executable is linked in this mode
    pub fn links(self) -> bool {
        !matches!(self, Self::LibrariesOnly)
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// The plan that was executed
    pub plan: BuildPlan,
    /// Modules built, in plan order
    pub built: Vec<String>,
    /// Modules skipped for lack of sources, in plan order
    pub skipped: Vec<String>,
    /// Every artifact produced, libraries in plan order then the executable
    pub artifacts: Vec<Artifact>,
    /// Path of the linked executable
    pub executable: Option<PathBuf>,
    /// Exit status of the program in run mode
    pub exit_code: Option<i32>,
}

/// A module that has sources and whose dependencies are all built
#[derive(Debug)]
struct BuildJob {
    name: String,
    sources: Vec<PathBuf>,
    dependencies: Vec<Artifact>,
}

/// Runs builds for one project
pub struct Orchestrator {
    manifest: Manifest,
    project_root: PathBuf,
    profile: PlatformProfile,
    toolchain: Arc<dyn Toolchain>,
    jobs: usize,
    progress: ProgressBar,
}

impl Orchestrator {
    /// Create an orchestrator for `manifest` rooted at `project_root`.
    ///
    /// Uses the manifest's compiler, the host platform and the manifest's
    /// job count. Progress is hidden until [`Self::with_progress`] is called.
    pub fn new(manifest: Manifest, project_root: &Path) -> Self {
        let toolchain = CommandToolchain::for_project(&manifest.toolchain.compiler, project_root);
        let jobs = manifest.build.jobs.unwrap_or(defaults::BUILD_JOBS);
        Self {
            manifest,
            project_root: project_root.to_path_buf(),
            profile: PlatformProfile::host(),
            toolchain: Arc::new(toolchain),
            jobs,
            progress: ProgressBar::hidden(),
        }
    }

    /// Use a different toolchain
    #[must_use]
    pub fn with_toolchain(mut self, toolchain: Arc<dyn Toolchain>) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Use a different platform profile
    #[must_use]
    pub fn with_profile(mut self, profile: PlatformProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Build up to `jobs` modules of a level at once; 0 means one per CPU
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Report module progress on `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Effective number of concurrent module builds
    pub fn jobs(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        }
    }

    /// Validate the manifest and compute the build plan
    pub fn plan(&self) -> Result<BuildPlan, ModbuildError> {
        self.manifest.validate()?;
        let graph = DependencyGraph::from_manifest(&self.manifest)?;
        Ok(graph.build_plan()?)
    }

    /// Execute a run in `mode`.
    ///
    /// `forwarded` is passed verbatim to the program in
    /// [`RunMode::BuildAndRun`] and ignored otherwise.
    pub async fn run(&self, mode: RunMode, forwarded: &[String]) -> Result<RunReport, ModbuildError> {
        let plan = self.plan()?;
        tracing::info!(
            "Build plan for '{}': {}",
            self.manifest.project.name,
            plan.order.join(", ")
        );

        self.toolchain.check()?;
        let settings = Arc::new(BuildSettings::from_manifest(
            &self.manifest,
            &self.project_root,
            self.profile.clone(),
        ));
        filesystem::create_dir_all(&settings.output_dir)?;

        let builder = ModuleBuilder::new(settings.clone(), self.toolchain.clone());
        let mut registry = ModuleRegistry::new(&plan.order);
        self.progress.set_length(plan.len() as u64);

        let jobs = self.jobs();
        let outcome = if jobs <= 1 {
            self.build_sequential(&plan, &builder, &mut registry).await
        } else {
            self.build_levels(&plan, &builder, &mut registry, jobs).await
        };
        if let Err(e) = outcome {
            self.progress.abandon();
            return Err(e);
        }

        let mut report = RunReport {
            built: registry.filter(&plan.order, ModuleStatus::Built),
            skipped: registry.filter(&plan.order, ModuleStatus::Skipped),
            artifacts: registry.artifacts_in(&plan.order),
            plan,
            ..RunReport::default()
        };

        if !mode.links() {
            self.progress.finish_and_clear();
            tracing::info!("Built {} module libraries", report.built.len());
            return Ok(report);
        }

        self.progress.set_message("linking");
        let linker = Linker::new(settings, self.toolchain.clone(), &self.manifest.project.executable);
        let main_sources: Vec<PathBuf> = self
            .manifest
            .project
            .main
            .iter()
            .map(|s| self.project_root.join(s))
            .collect();
        let artifacts = report.artifacts.clone();
        let extra_libs = self.platform_libs();
        let linked = tokio::task::spawn_blocking(move || {
            linker.link(&main_sources, &artifacts, &extra_libs)
        })
        .await
        .unwrap_or_else(|e| {
            Err(BuildError::TaskFailed {
                module: self.manifest.project.executable.clone(),
                error: e.to_string(),
            }
            .into())
        });
        let executable = match linked {
            Ok(executable) => executable,
            Err(e) => {
                self.progress.abandon();
                return Err(e);
            }
        };
        report.executable = Some(executable.path.clone());
        report.artifacts.push(executable.clone());

        if mode == RunMode::BuildAndRun {
            self.progress
                .println(format!("Running {}", executable.path.display()));
            self.progress.finish_and_clear();
            report.exit_code = Some(run_program(&executable.path, forwarded).await?);
        } else {
            self.progress.finish_and_clear();
        }

        Ok(report)
    }

    /// Build modules one at a time in plan order
    async fn build_sequential(
        &self,
        plan: &BuildPlan,
        builder: &ModuleBuilder,
        registry: &mut ModuleRegistry,
    ) -> Result<(), ModbuildError> {
        for name in &plan.order {
            let Some(job) = self.prepare(name, registry)? else {
                continue;
            };
            self.progress.set_message(job.name.clone());
            match build_blocking(builder.clone(), job).await {
                Ok(artifact) => {
                    registry.record_built(name, artifact);
                    self.progress.inc(1);
                }
                Err(e) => {
                    registry.transition(name, ModuleStatus::Failed);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Build each dependency level as a set of concurrent tasks.
    ///
    /// A level is joined completely before the next starts. When a module
    /// fails, its siblings still run to completion but no later level is
    /// started; the first failure in level order is returned.
    async fn build_levels(
        &self,
        plan: &BuildPlan,
        builder: &ModuleBuilder,
        registry: &mut ModuleRegistry,
        jobs: usize,
    ) -> Result<(), ModbuildError> {
        let semaphore = Arc::new(Semaphore::new(jobs));

        for (level_idx, level) in plan.levels.iter().enumerate() {
            let mut pending = Vec::new();
            for name in level {
                if let Some(job) = self.prepare(name, registry)? {
                    pending.push(job);
                }
            }
            if pending.is_empty() {
                continue;
            }
            tracing::debug!(
                "Level {level_idx}: building {} modules with up to {jobs} jobs",
                pending.len()
            );

            let names: Vec<String> = pending.iter().map(|j| j.name.clone()).collect();
            let mut set = JoinSet::new();
            for (index, job) in pending.into_iter().enumerate() {
                let builder = builder.clone();
                let semaphore = semaphore.clone();
                set.spawn(async move {
                    let result = match semaphore.acquire_owned().await {
                        Ok(_permit) => build_blocking(builder, job).await,
                        Err(e) => Err(BuildError::TaskFailed {
                            module: job.name,
                            error: e.to_string(),
                        }
                        .into()),
                    };
                    (index, result)
                });
            }

            let mut outcomes: Vec<Option<Result<Artifact, ModbuildError>>> =
                names.iter().map(|_| None).collect();
            let mut join_error = None;
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((index, result)) => outcomes[index] = Some(result),
                    Err(e) => join_error = Some(e.to_string()),
                }
            }

            let mut first_error = None;
            for (name, outcome) in names.iter().zip(outcomes) {
                let outcome = outcome.unwrap_or_else(|| {
                    Err(BuildError::TaskFailed {
                        module: name.clone(),
                        error: join_error
                            .clone()
                            .unwrap_or_else(|| "task did not report a result".to_string()),
                    }
                    .into())
                });
                match outcome {
                    Ok(artifact) => {
                        registry.record_built(name, artifact);
                        self.progress.inc(1);
                    }
                    Err(e) => {
                        registry.transition(name, ModuleStatus::Failed);
                        first_error.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = first_error {
                return Err(e);
            }
        }
        Ok(())
    }

    /// Discover sources for `name` and collect its dependency artifacts.
    ///
    /// Returns `None` when the module has no sources and is skipped.
    fn prepare(
        &self,
        name: &str,
        registry: &mut ModuleRegistry,
    ) -> Result<Option<BuildJob>, ModbuildError> {
        let Some(module) = self.manifest.module(name) else {
            return Ok(None);
        };

        let sources = discover(&module.directory(&self.project_root), &self.manifest.build.extensions);
        if sources.is_empty() {
            tracing::info!("Skipping module {name}: no source files");
            registry.transition(name, ModuleStatus::Skipped);
            self.progress.inc(1);
            return Ok(None);
        }

        let mut dependencies = Vec::with_capacity(module.depends.len());
        for dep in &module.depends {
            match registry.artifact(dep) {
                Some(artifact) => dependencies.push(artifact.clone()),
                None => {
                    return Err(BuildError::MissingArtifact {
                        module: name.to_string(),
                        dependency: dep.clone(),
                    }
                    .into())
                }
            }
        }

        registry.transition(name, ModuleStatus::Building);
        Ok(Some(BuildJob {
            name: name.to_string(),
            sources,
            dependencies,
        }))
    }

    /// Platform libraries requested by enabled modules, first occurrence kept
    fn platform_libs(&self) -> Vec<String> {
        let mut libs: Vec<String> = Vec::new();
        for module in self.manifest.enabled_modules() {
            for lib in module.libs_for(self.profile.os.key()) {
                if !libs.contains(lib) {
                    libs.push(lib.clone());
                }
            }
        }
        libs
    }
}

/// Run one module build on the blocking pool
async fn build_blocking(builder: ModuleBuilder, job: BuildJob) -> Result<Artifact, ModbuildError> {
    let BuildJob {
        name,
        sources,
        dependencies,
    } = job;
    let module = name.clone();
    tokio::task::spawn_blocking(move || builder.build(&module, &sources, &dependencies))
        .await
        .unwrap_or_else(|e| {
            Err(BuildError::TaskFailed {
                module: name,
                error: e.to_string(),
            }
            .into())
        })
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("project", &self.manifest.project.name)
            .field("project_root", &self.project_root)
            .field("toolchain", &self.toolchain.name())
            .field("jobs", &self.jobs)
            .finish()
    }
}
