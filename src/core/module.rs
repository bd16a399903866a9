//! Per-run module state and produced artifacts

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Build status of a module within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    /// Not started yet
    Pending,
    /// Toolchain running
    Building,
    /// Artifact produced
    Built,
    /// Toolchain failed
    Failed,
    /// No sources found, nothing produced
    Skipped,
}

impl ModuleStatus {
    /// Whether the status cannot change again during this run
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Built | Self::Failed | Self::Skipped)
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Building | Self::Skipped)
                | (Self::Building, Self::Built | Self::Failed)
        )
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Building => "building",
            Self::Built => "built",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Kind of build output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// One per built module
    SharedLibrary,
    /// The final program
    Executable,
}

/// A file produced by a successful build or link step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// What was produced
    pub kind: ArtifactKind,
    /// Absolute output path
    pub path: PathBuf,
    /// Owning module, `None` for the executable
    pub module: Option<String>,
}

impl Artifact {
    /// Shared library produced for `module`
    pub fn shared_library(module: &str, path: PathBuf) -> Self {
        Self {
            kind: ArtifactKind::SharedLibrary,
            path,
            module: Some(module.to_string()),
        }
    }

    /// Final executable
    pub fn executable(path: PathBuf) -> Self {
        Self {
            kind: ArtifactKind::Executable,
            path,
            module: None,
        }
    }
}

/// Status and artifacts of every planned module, owned by one run
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    statuses: HashMap<String, ModuleStatus>,
    artifacts: HashMap<String, Artifact>,
}

impl ModuleRegistry {
    /// Registry with every listed module pending
    pub fn new<'a>(modules: impl IntoIterator<Item = &'a String>) -> Self {
        Self {
            statuses: modules
                .into_iter()
                .map(|m| (m.clone(), ModuleStatus::Pending))
                .collect(),
            ..Self::default()
        }
    }

    /// Current status of a module
    pub fn status(&self, module: &str) -> Option<ModuleStatus> {
        self.statuses.get(module).copied()
    }

    /// Move a module to `next`. Illegal transitions are logged and refused.
    pub fn transition(&mut self, module: &str, next: ModuleStatus) -> bool {
        match self.statuses.get_mut(module) {
            Some(current) if current.can_transition_to(next) => {
                tracing::trace!("Module {module}: {current} -> {next}");
                *current = next;
                true
            }
            Some(current) => {
                tracing::warn!("Ignoring illegal transition for {module}: {current} -> {next}");
                false
            }
            None => false,
        }
    }

    /// Record a successful build
    pub fn record_built(&mut self, module: &str, artifact: Artifact) {
        if self.transition(module, ModuleStatus::Built) {
            self.artifacts.insert(module.to_string(), artifact);
        }
    }

    /// Artifact of a built module
    pub fn artifact(&self, module: &str) -> Option<&Artifact> {
        self.artifacts.get(module)
    }

    /// Artifacts of the built modules among `order`, in that order
    pub fn artifacts_in(&self, order: &[String]) -> Vec<Artifact> {
        order
            .iter()
            .filter_map(|m| self.artifacts.get(m).cloned())
            .collect()
    }

    /// Modules among `order` currently in `status`, in that order
    pub fn filter(&self, order: &[String], status: ModuleStatus) -> Vec<String> {
        order
            .iter()
            .filter(|m| self.status(m) == Some(status))
            .cloned()
            .collect()
    }
}
