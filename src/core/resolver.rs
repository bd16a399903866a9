//! Dependency resolution
//!
//! Computes the build order of enabled modules and rejects graphs that
//! cannot be built: cycles, missing nodes and dependencies on disabled
//! modules.

use std::collections::{HashMap, HashSet};

use crate::core::manifest::Manifest;
use crate::error::ResolverError;

/// Dependency graph over the enabled modules of a manifest
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Modules in declaration order
    nodes: Vec<String>,
    /// Adjacency list: module -> dependencies
    edges: HashMap<String, Vec<String>>,
}

/// A deterministic, topologically valid build order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    /// Total order: every module comes after all of its dependencies
    pub order: Vec<String>,
    /// Dependency levels: a module's dependencies all live in earlier levels
    pub levels: Vec<Vec<String>>,
}

impl BuildPlan {
    /// Number of modules in the plan
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the plan contains no modules
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Position of `module` in the total order
    pub fn position(&self, module: &str) -> Option<usize> {
        self.order.iter().position(|m| m == module)
    }
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of enabled modules.
    ///
    /// Fails if an enabled module depends on a disabled one. Disabled
    /// modules never appear in the graph.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self, ResolverError> {
        let mut graph = Self::new();

        for module in manifest.enabled_modules() {
            for dep in &module.depends {
                if manifest.module(dep).is_some_and(|m| !m.enabled) {
                    return Err(ResolverError::DisabledDependency {
                        module: module.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
            graph.add_module(&module.name, module.depends.clone());
        }

        Ok(graph)
    }

    /// Add a module to the graph. Declaration order is the insertion order.
    pub fn add_module(&mut self, name: &str, dependencies: Vec<String>) {
        let mut deduped = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            if !deduped.contains(&dep) {
                deduped.push(dep);
            }
        }

        if !self.edges.contains_key(name) {
            self.nodes.push(name.to_string());
        }
        self.edges.insert(name.to_string(), deduped);
    }

    /// Declared dependencies of a module
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.edges.get(name).map_or(&[], Vec::as_slice)
    }

    /// Compute the build plan.
    ///
    /// Repeatedly picks, among modules whose dependencies are all placed,
    /// the one declared earliest. Modules left over when nothing is
    /// selectable sit on or behind a cycle.
    pub fn build_plan(&self) -> Result<BuildPlan, ResolverError> {
        for node in &self.nodes {
            for dep in self.dependencies(node) {
                if !self.edges.contains_key(dep) {
                    return Err(ResolverError::MissingDependency {
                        module: node.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        let mut placed: HashSet<&str> = HashSet::new();
        let mut level_of: HashMap<&str, usize> = HashMap::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(next) = self.nodes.iter().find(|node| {
            !placed.contains(node.as_str())
                && self
                    .dependencies(node)
                    .iter()
                    .all(|dep| placed.contains(dep.as_str()))
        }) {
            let level = self
                .dependencies(next)
                .iter()
                .filter_map(|dep| level_of.get(dep.as_str()))
                .map(|l| l + 1)
                .max()
                .unwrap_or(0);
            level_of.insert(next, level);
            placed.insert(next);
            order.push(next.clone());
        }

        if order.len() < self.nodes.len() {
            return Err(ResolverError::CircularDependency {
                cycle: self.find_cycle(&placed),
            });
        }

        let depth = level_of.values().max().map_or(0, |max| max + 1);
        let mut levels = vec![Vec::new(); depth];
        for node in &self.nodes {
            levels[level_of[node.as_str()]].push(node.clone());
        }

        Ok(BuildPlan { order, levels })
    }

    /// Walk unplaced dependencies from the first unplaced module until a
    /// module repeats. Every unplaced module has at least one unplaced
    /// dependency, so the walk always closes a cycle.
    fn find_cycle(&self, placed: &HashSet<&str>) -> Vec<String> {
        let Some(start) = self.nodes.iter().find(|n| !placed.contains(n.as_str())) else {
            return Vec::new();
        };

        let mut path: Vec<&str> = vec![start.as_str()];
        let mut current: &str = start;
        loop {
            let Some(next) = self
                .dependencies(current)
                .iter()
                .find(|dep| !placed.contains(dep.as_str()))
            else {
                return path.into_iter().map(ToString::to_string).collect();
            };

            if let Some(pos) = path.iter().position(|n| *n == next.as_str()) {
                let mut cycle: Vec<String> = path[pos..].iter().map(ToString::to_string).collect();
                cycle.push(next.clone());
                return cycle;
            }
            path.push(next);
            current = next;
        }
    }

    /// Check if the graph has any cycles
    pub fn has_cycle(&self) -> bool {
        matches!(
            self.build_plan(),
            Err(ResolverError::CircularDependency { .. })
        )
    }
}
