//! Check command logic
//!
//! Validates the manifest, computes the build plan and reports what would
//! be built without invoking the toolchain.

use std::path::Path;

use serde::Serialize;

use crate::core::discovery::discover;
use crate::core::manifest::Manifest;
use crate::core::resolver::DependencyGraph;
use crate::error::ModbuildError;
use crate::infra::toolchain::CommandToolchain;

/// What a check found out about one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCheck {
    /// Module name
    pub name: String,
    /// Whether the module is enabled
    pub enabled: bool,
    /// Declared dependencies
    pub depends: Vec<String>,
    /// Number of discovered source files (0 for disabled modules)
    pub sources: usize,
}

/// Result of the check operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckResult {
    /// Project name
    pub project: String,
    /// Build order of enabled modules
    pub build_order: Vec<String>,
    /// Dependency levels of the build order
    pub levels: Vec<Vec<String>>,
    /// Every declared module, in declaration order
    pub modules: Vec<ModuleCheck>,
    /// Whether the configured compiler was found
    pub toolchain_available: bool,
    /// Non-fatal findings
    pub warnings: Vec<String>,
}

impl CheckResult {
    /// Enabled modules with no sources, which will be skipped
    pub fn empty_modules(&self) -> impl Iterator<Item = &ModuleCheck> {
        self.modules.iter().filter(|m| m.enabled && m.sources == 0)
    }
}

/// Validate `manifest` and report the plan.
///
/// Configuration and graph errors are returned as errors, exactly as a
/// build would report them. Problems that only surface while building
/// (missing compiler, empty modules that others depend on) become
/// warnings.
pub fn check(project_root: &Path, manifest: &Manifest) -> Result<CheckResult, ModbuildError> {
    manifest.validate()?;
    let plan = DependencyGraph::from_manifest(manifest)?.build_plan()?;

    let mut result = CheckResult {
        project: manifest.project.name.clone(),
        build_order: plan.order,
        levels: plan.levels,
        ..CheckResult::default()
    };

    for module in &manifest.modules {
        let sources = if module.enabled {
            discover(&module.directory(project_root), &manifest.build.extensions).len()
        } else {
            0
        };
        result.modules.push(ModuleCheck {
            name: module.name.clone(),
            enabled: module.enabled,
            depends: module.depends.clone(),
            sources,
        });
    }

    let empty: Vec<String> = result.empty_modules().map(|m| m.name.clone()).collect();
    for name in &empty {
        result
            .warnings
            .push(format!("Module '{name}' has no source files and will be skipped"));
    }
    for module in manifest.enabled_modules() {
        if let Some(dep) = module.depends.iter().find(|d| empty.contains(d)) {
            result.warnings.push(format!(
                "Module '{}' depends on '{dep}', which has no source files",
                module.name
            ));
        }
    }

    let toolchain = CommandToolchain::for_project(&manifest.toolchain.compiler, project_root);
    result.toolchain_available = toolchain.resolve().is_ok();
    if !result.toolchain_available {
        result.warnings.push(format!(
            "Compiler '{}' not found",
            toolchain.compiler().display()
        ));
    }

    Ok(result)
}
