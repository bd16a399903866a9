//! Manifest (modbuild.toml) parsing and validation
//!
//! The manifest is the static catalog of every known module, its enable
//! flag and its declared dependencies. Module order in the file is the
//! declaration order used to break ties in the build plan.
//! Supports environment variable substitution using ${VAR} syntax.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::error::ConfigError;

/// The project manifest (modbuild.toml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Project configuration
    pub project: ProjectConfig,

    /// Build configuration
    #[serde(default)]
    pub build: BuildConfig,

    /// Compiler configuration
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Module catalog, in declaration order
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Sources compiled into the final executable
    #[serde(default = "default_main")]
    pub main: Vec<String>,

    /// Executable stem (platform suffix is appended)
    #[serde(default = "default_executable")]
    pub executable: String,
}

fn default_main() -> Vec<String> {
    defaults::MAIN_SOURCES.iter().map(ToString::to_string).collect()
}

fn default_executable() -> String {
    defaults::EXECUTABLE_NAME.to_string()
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Output directory for libraries and the executable
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Source file extensions picked up by discovery
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Number of modules built concurrently within a dependency level
    #[serde(default)]
    pub jobs: Option<usize>,
}

fn default_output_dir() -> String {
    defaults::OUTPUT_DIR.to_string()
}

fn default_extensions() -> Vec<String> {
    defaults::SOURCE_EXTENSIONS
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            extensions: default_extensions(),
            jobs: None,
        }
    }
}

/// Compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolchainConfig {
    /// Compiler driver used for compiling and linking
    #[serde(default = "default_compiler")]
    pub compiler: String,

    /// Flags passed to every compile and link
    #[serde(default = "default_flags")]
    pub flags: Vec<String>,

    /// Extra header search directories
    #[serde(default)]
    pub include_dirs: Vec<String>,

    /// Extra library search directories
    #[serde(default)]
    pub lib_dirs: Vec<String>,

    /// External libraries linked into every artifact
    #[serde(default)]
    pub libs: Vec<String>,
}

fn default_compiler() -> String {
    defaults::COMPILER.to_string()
}

fn default_flags() -> Vec<String> {
    defaults::COMPILER_FLAGS
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            flags: default_flags(),
            include_dirs: Vec::new(),
            lib_dirs: Vec::new(),
            libs: Vec::new(),
        }
    }
}

/// A module declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleEntry {
    /// Module name, also the shared library name
    pub name: String,

    /// Whether the module takes part in this build
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Names of modules this one links against
    #[serde(default)]
    pub depends: Vec<String>,

    /// Source directory, defaults to the module name
    #[serde(default)]
    pub path: Option<String>,

    /// Extra system libraries keyed by OS (`linux`, `macos`, `windows`)
    #[serde(default)]
    pub platform_libs: BTreeMap<String, Vec<String>>,
}

fn default_enabled() -> bool {
    true
}

impl ModuleEntry {
    /// Create an enabled module with the given dependencies
    pub fn new(name: &str, depends: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            depends: depends.iter().map(ToString::to_string).collect(),
            path: None,
            platform_libs: BTreeMap::new(),
        }
    }

    /// Mark the module as disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Source directory of the module, resolved against the project root
    pub fn directory(&self, project_root: &Path) -> PathBuf {
        project_root.join(self.path.as_deref().unwrap_or(&self.name))
    }

    /// Extra system libraries for the given OS
    pub fn libs_for(&self, os: &str) -> &[String] {
        self.platform_libs.get(os).map_or(&[], Vec::as_slice)
    }
}

/// Substitute environment variables in a string using ${VAR} syntax.
///
/// Unset variables expand to the empty string. A `${` that does not form a
/// valid reference is an error.
///
/// # Examples
/// ```
/// use modbuild::core::manifest::substitute_env_vars;
///
/// std::env::set_var("MODBUILD_DOC_VAR", "hello");
/// let result = substitute_env_vars("prefix_${MODBUILD_DOC_VAR}_suffix").unwrap();
/// assert_eq!(result, "prefix_hello_suffix");
/// std::env::remove_var("MODBUILD_DOC_VAR");
/// ```
pub fn substitute_env_vars(input: &str) -> Result<String, String> {
    let re =
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| format!("Invalid regex: {e}"))?;

    let mut last_end = 0;
    let mut output = String::new();

    for cap in re.captures_iter(input) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let literal = &input[last_end..full_match.start()];
        check_literal(literal)?;
        output.push_str(literal);

        let value = std::env::var(&cap[1]).unwrap_or_default();
        output.push_str(&value);

        last_end = full_match.end();
    }

    let rest = &input[last_end..];
    check_literal(rest)?;
    output.push_str(rest);

    Ok(output)
}

fn check_literal(literal: &str) -> Result<(), String> {
    if literal.contains("${") {
        return Err(format!("Malformed variable reference in '{literal}'"));
    }
    Ok(())
}

/// Module names end up in `-l<name>` flags and file names
fn is_valid_module_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-'))
}

/// Recursively substitute environment variables in a TOML value
fn substitute_in_value(value: &mut toml::Value) -> Result<(), String> {
    match value {
        toml::Value::String(s) => {
            *s = substitute_env_vars(s)?;
        }
        toml::Value::Array(arr) => {
            for item in arr.iter_mut() {
                substitute_in_value(item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                substitute_in_value(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}

impl Manifest {
    /// Load, substitute and validate the manifest at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        substitute_in_value(&mut value).map_err(|error| ConfigError::Substitution { error })?;

        let manifest: Self = value.try_into().map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        manifest.validate()?;
        tracing::debug!(
            "Loaded manifest '{}' with {} modules",
            manifest.project.name,
            manifest.modules.len()
        );
        Ok(manifest)
    }

    /// Parse a manifest from a TOML string without validating it
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Check module names and that every declared dependency exists.
    ///
    /// A dependency on a disabled module passes here; whether that is
    /// allowed is decided when the build plan is computed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for module in &self.modules {
            if !is_valid_module_name(&module.name) {
                return Err(ConfigError::InvalidModuleName {
                    name: module.name.clone(),
                    reason: "names must be non-empty and use only letters, digits, '_', '.', '+' or '-'"
                        .to_string(),
                });
            }
            if !seen.insert(module.name.as_str()) {
                return Err(ConfigError::DuplicateModule {
                    name: module.name.clone(),
                });
            }
        }

        for module in &self.modules {
            for dep in &module.depends {
                if !seen.contains(dep.as_str()) {
                    return Err(ConfigError::UnknownDependency {
                        module: module.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Look up a module by name
    pub fn module(&self, name: &str) -> Option<&ModuleEntry> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Enabled modules, in declaration order
    pub fn enabled_modules(&self) -> impl Iterator<Item = &ModuleEntry> {
        self.modules.iter().filter(|m| m.enabled)
    }

    /// Names of enabled modules, in declaration order
    pub fn enabled_names(&self) -> Vec<String> {
        self.enabled_modules().map(|m| m.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::generators::module_name;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn manifest_with(modules: Vec<ModuleEntry>) -> Manifest {
        Manifest {
            project: ProjectConfig {
                name: "test".to_string(),
                main: default_main(),
                executable: default_executable(),
            },
            build: BuildConfig::default(),
            toolchain: ToolchainConfig::default(),
            modules,
        }
    }

    fn write_manifest(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("modbuild.toml");
        std::fs::write(&path, content).expect("Failed to write manifest");
        (dir, path)
    }

    #[test]
    fn test_manifest_deserializes_modules_in_order() {
        let toml_content = r#"
[project]
name = "cstd"

[toolchain]
compiler = "clang"
libs = ["ssl", "crypto"]

[[modules]]
name = "string"

[[modules]]
name = "fmt"
depends = ["string"]

[[modules]]
name = "dir"
enabled = false
path = "src/dir"
platform_libs = { windows = ["shlwapi"] }
"#;

        let manifest = Manifest::from_toml(toml_content).expect("Failed to parse");
        let names: Vec<&str> = manifest.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["string", "fmt", "dir"]);
        assert_eq!(manifest.toolchain.compiler, "clang");
        assert_eq!(manifest.toolchain.libs, vec!["ssl", "crypto"]);

        let dir = manifest.module("dir").unwrap();
        assert!(!dir.enabled);
        assert_eq!(dir.libs_for("windows"), ["shlwapi".to_string()]);
        assert!(dir.libs_for("linux").is_empty());
        assert_eq!(dir.directory(Path::new("/p")), PathBuf::from("/p/src/dir"));

        assert_eq!(manifest.enabled_names(), vec!["string", "fmt"]);
    }

    #[test]
    fn test_manifest_default_values() {
        let manifest = Manifest::from_toml("[project]\nname = \"x\"\n").unwrap();
        assert_eq!(manifest.project.main, vec!["main.c"]);
        assert_eq!(manifest.project.executable, "main");
        assert_eq!(manifest.build.output_dir, "build");
        assert_eq!(manifest.build.extensions, vec!["c"]);
        assert_eq!(manifest.build.jobs, None);
        assert_eq!(manifest.toolchain.compiler, "gcc");
        assert!(manifest.toolchain.flags.contains(&"-std=c17".to_string()));
        assert!(manifest.modules.is_empty());
    }

    #[test]
    fn test_manifest_missing_required_project_section() {
        let result = Manifest::from_toml("[[modules]]\nname = \"a\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_dependency() {
        let manifest = manifest_with(vec![ModuleEntry::new("a", &["ghost"])]);
        let err = manifest.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::UnknownDependency { ref module, ref dependency }
                if module == "a" && dependency == "ghost"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_validate_accepts_dependency_on_disabled_module() {
        let manifest = manifest_with(vec![
            ModuleEntry::new("b", &[]).disabled(),
            ModuleEntry::new("a", &["b"]),
        ]);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_dependency_of_disabled_module() {
        let manifest = manifest_with(vec![ModuleEntry::new("a", &["ghost"]).disabled()]);
        assert!(matches!(
            manifest.validate(),
            Err(ConfigError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_module() {
        let manifest = manifest_with(vec![ModuleEntry::new("a", &[]), ModuleEntry::new("a", &[])]);
        assert!(matches!(
            manifest.validate(),
            Err(ConfigError::DuplicateModule { ref name }) if name == "a"
        ));
    }

    #[test]
    fn test_validate_rejects_invalid_names() {
        for bad in ["", "-lm", "a/b", "a b"] {
            let manifest = manifest_with(vec![ModuleEntry::new(bad, &[])]);
            assert!(
                matches!(manifest.validate(), Err(ConfigError::InvalidModuleName { .. })),
                "'{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Manifest::load(&dir.path().join("modbuild.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let (_dir, path) = write_manifest("[project\nname = ");
        assert!(matches!(
            Manifest::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_validates() {
        let (_dir, path) = write_manifest(
            r#"
[project]
name = "p"

[[modules]]
name = "a"
depends = ["missing"]
"#,
        );
        assert!(matches!(
            Manifest::load(&path),
            Err(ConfigError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_load_substitutes_environment() {
        std::env::set_var("MODBUILD_TEST_INCLUDE", "/opt/ssl/include");
        let (_dir, path) = write_manifest(
            r#"
[project]
name = "p"

[toolchain]
include_dirs = ["${MODBUILD_TEST_INCLUDE}"]
"#,
        );
        let manifest = Manifest::load(&path).unwrap();
        std::env::remove_var("MODBUILD_TEST_INCLUDE");
        assert_eq!(manifest.toolchain.include_dirs, vec!["/opt/ssl/include"]);
    }

    #[test]
    fn test_substitute_unset_variable_is_empty() {
        let result = substitute_env_vars("a${MODBUILD_SURELY_UNSET_VAR}b").unwrap();
        assert_eq!(result, "ab");
    }

    #[test]
    fn test_substitute_rejects_malformed_reference() {
        assert!(substitute_env_vars("${unterminated").is_err());
        assert!(substitute_env_vars("${1BAD}").is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(crate::config::defaults::MIN_PROPTEST_ITERATIONS))]

        #[test]
        fn prop_text_without_references_is_unchanged(text in "[a-zA-Z0-9 _./{}-]{0,40}") {
            prop_assert_eq!(substitute_env_vars(&text).unwrap(), text);
        }

        #[test]
        fn prop_chained_modules_keep_declaration_order(
            names in prop::collection::hash_set(module_name(), 1..8)
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let mut content = String::from("[project]\nname = \"chain\"\n");
            for (i, name) in names.iter().enumerate() {
                content.push_str(&format!("\n[[modules]]\nname = \"{name}\"\n"));
                if i > 0 {
                    content.push_str(&format!("depends = [\"{}\"]\n", names[i - 1]));
                }
            }

            let manifest = Manifest::from_toml(&content).unwrap();
            prop_assert!(manifest.validate().is_ok());
            prop_assert_eq!(manifest.enabled_names(), names);
        }
    }
}
