//! Test utilities
//!
//! A recording toolchain for driving builds without a compiler, and
//! generators for property-based tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::BuildError;
use crate::infra::toolchain::{Toolchain, ToolchainInvocation, ToolchainOutput};

/// Toolchain that records every invocation and writes a dummy artifact
#[derive(Debug, Default)]
pub struct RecordingToolchain {
    invocations: Mutex<Vec<ToolchainInvocation>>,
    /// Output file names containing any of these fail
    failing: Vec<String>,
    /// Report success without writing anything
    silent: bool,
    delay: Option<Duration>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    counter: AtomicUsize,
}

impl RecordingToolchain {
    /// Toolchain where every invocation succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail invocations whose output file name contains `pattern`
    #[must_use]
    pub fn failing(mut self, pattern: &str) -> Self {
        self.failing.push(pattern.to_string());
        self
    }

    /// Claim success without producing a file
    #[must_use]
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Sleep inside every invocation
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every invocation so far, in call order
    pub fn invocations(&self) -> Vec<ToolchainInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Output file names of every invocation, staging prefix stripped
    pub fn outputs(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .filter_map(|i| i.output.file_name())
            .map(|n| {
                n.to_string_lossy()
                    .trim_start_matches(".partial-")
                    .to_string()
            })
            .collect()
    }

    /// Highest number of invocations observed running at once
    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn should_fail(&self, output: &Path) -> bool {
        let name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.failing.iter().any(|p| name.contains(p.as_str()))
    }
}

impl Toolchain for RecordingToolchain {
    fn name(&self) -> String {
        "recording".to_string()
    }

    fn invoke(&self, invocation: &ToolchainInvocation) -> Result<ToolchainOutput, BuildError> {
        self.invocations.lock().unwrap().push(invocation.clone());
        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let result = if self.should_fail(&invocation.output) {
            ToolchainOutput {
                success: false,
                diagnostics: format!("error: cannot build {}", invocation.output.display()),
            }
        } else {
            if !self.silent {
                let n = self.counter.fetch_add(1, Ordering::SeqCst);
                std::fs::write(&invocation.output, format!("artifact #{n}")).unwrap();
            }
            ToolchainOutput {
                success: true,
                diagnostics: String::new(),
            }
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(result)
    }
}

/// Generators for proptest
pub mod generators {
    use proptest::prelude::*;

    /// Generate a valid module name
    pub fn module_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,15}"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_toolchain_fails_matching_outputs() {
        let dir = tempfile::TempDir::new().unwrap();
        let toolchain = RecordingToolchain::new().failing("libbad");
        let bad = ToolchainInvocation {
            output: dir.path().join("libbad.so"),
            ..ToolchainInvocation::default()
        };
        let good = ToolchainInvocation {
            output: dir.path().join("libgood.so"),
            ..ToolchainInvocation::default()
        };

        assert!(!toolchain.invoke(&bad).unwrap().success);
        assert!(toolchain.invoke(&good).unwrap().success);
        assert!(dir.path().join("libgood.so").exists());
        assert_eq!(toolchain.outputs(), vec!["libbad.so", "libgood.so"]);
    }
}
