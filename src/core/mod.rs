//! Core business logic module
//!
//! Build planning and orchestration. Process and filesystem access goes
//! through [`crate::infra`].
//!
//! # Submodules
//!
//! - [`manifest`] - Manifest (modbuild.toml) parsing and validation
//! - [`platform`] - Platform naming and link conventions
//! - [`discovery`] - Source file discovery
//! - [`resolver`] - Dependency resolution and build plans
//! - [`module`] - Module status and artifacts
//! - [`builder`] - Shared library builds
//! - [`linker`] - Executable link
//! - [`orchestrator`] - Build orchestration
//! - [`check`] - Configuration validation logic
//! - [`clean`] - Clean build artifacts logic

pub mod builder;
pub mod check;
pub mod clean;
pub mod discovery;
pub mod linker;
pub mod manifest;
pub mod module;
pub mod orchestrator;
pub mod platform;
pub mod resolver;
