//! Package discovery and load ordering for modex
//!
//! This crate finds installed packages (built-in and user-added), filters them
//! to the enabled subset and computes a load order in which every package
//! comes after the packages it depends on.

pub mod archive;
pub mod discovery;
pub mod loader;
pub mod order;
pub mod set;

// Re-export main types
pub use discovery::{filter_enabled, Discovery};
pub use loader::{FsPackageLoader, PackageLoader, MANIFEST_FILE};
pub use order::{order, order_checked};
pub use set::PackageSet;

use modex_core::error::ModexError;

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, ModexError>;
