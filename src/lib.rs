//! modbuild - dependency-aware builds for multi-module native projects
//!
//! This library plans and drives the build of a project made of
//! independently developed source modules: each enabled module becomes a
//! shared library, built after the modules it depends on, and the final
//! executable is linked against all of them.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Build planning and orchestration
//! - [`infra`] - Infrastructure layer (toolchain, filesystem, processes)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
