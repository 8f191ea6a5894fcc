//! # modex-core
//!
//! Core types shared across all modex crates.
//!
//! This crate provides:
//! - `Version` with the truncated dotted comparison used by mod manifests
//! - `Dependency` parsing and `Package` dependency predicates
//! - `ModexError` enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, Dependency, Package, Manifest)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{ModexError, ModexResult};
pub use types::{
    CleanupTask, Constraint, Dependency, DependencyKind, Manifest, Package, Version,
};
