//! Core data types for modex.
//!
//! This module provides the fundamental types used throughout the workspace:
//! - Dotted versions with truncated comparison
//! - Dependency specifications parsed from manifest strings
//! - Packages and their `info.json` manifests

pub mod dependency;
pub mod manifest;
pub mod package;
pub mod version;

// Re-export all public types
pub use dependency::{Constraint, Dependency, DependencyError, DependencyKind};
pub use manifest::Manifest;
pub use package::{CleanupTask, Package};
pub use version::{Version, VersionError};
