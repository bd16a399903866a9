//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Compiler stand-in: writes a shell script to the `-o` path that prints its
/// arguments, logs every call to `tools/cc.log`, and fails on any source
/// named `broken.c`.
const STUB_COMPILER: &str = r#"#!/bin/sh
out=""
prev=""
for arg in "$@"; do
    if [ "$prev" = "-o" ]; then out="$arg"; fi
    case "$arg" in
        *broken.c) echo "stub-cc: error: cannot compile $arg" >&2; exit 1 ;;
    esac
    prev="$arg"
done
if [ -z "$out" ]; then
    echo "stub-cc: no output file" >&2
    exit 1
fi
echo "$*" >> "$(dirname "$0")/cc.log"
printf '#!/bin/sh\nprintf "%%s\\n" "$@"\nexit "${STUB_EXIT:-0}"\n' > "$out"
chmod +x "$out"
"#;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Project with the stub compiler, `main.c` and a manifest whose
    /// `[[modules]]` tables are `modules`
    pub fn with_modules(modules: &str) -> Self {
        let project = Self::new();
        project.install_stub_compiler();
        project.create_file("main.c", "int main(void) { return 0; }\n");
        project.write_manifest(modules);
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Create a module directory with one source file
    pub fn create_module(&self, name: &str) {
        self.create_file(&format!("{name}/{name}.c"), "int placeholder;\n");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Write modbuild.toml using the stub compiler
    pub fn write_manifest(&self, modules: &str) {
        self.create_file(
            "modbuild.toml",
            &format!(
                "[project]\nname = \"test-project\"\n\n[toolchain]\ncompiler = \"tools/cc.sh\"\n\n{modules}"
            ),
        );
    }

    /// Install the stub compiler at tools/cc.sh
    pub fn install_stub_compiler(&self) {
        use std::os::unix::fs::PermissionsExt;

        self.create_file("tools/cc.sh", STUB_COMPILER);
        let path = self.dir.path().join("tools/cc.sh");
        let mut permissions = std::fs::metadata(&path)
            .expect("Failed to stat stub compiler")
            .permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&path, permissions).expect("Failed to chmod stub compiler");
    }

    /// Every compiler invocation so far, one line each
    pub fn compiler_calls(&self) -> Vec<String> {
        if !self.file_exists("tools/cc.log") {
            return Vec::new();
        }
        self.read_file("tools/cc.log")
            .lines()
            .map(ToString::to_string)
            .collect()
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper to run modbuild with arguments in the project directory
pub fn run_modbuild(project: &TestProject, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_modbuild"));
    cmd.current_dir(project.path());
    cmd.env_remove("MODBUILD_MANIFEST");
    cmd.env_remove("RUST_LOG");
    for arg in args {
        cmd.arg(arg);
    }
    cmd.output().expect("Failed to execute modbuild")
}

/// Shared library file name for `module` on the host
pub fn lib_name(module: &str) -> String {
    if cfg!(target_os = "macos") {
        format!("lib{module}.dylib")
    } else {
        format!("lib{module}.so")
    }
}

/// stdout of a finished command
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// stderr of a finished command
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
