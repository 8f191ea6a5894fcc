//! Configuration parsing for modex
//!
//! This crate handles the game's `mod-list.json` enablement list and the
//! optional `modex.toml` file, and layers them with command-line overrides
//! into one `ModexConfig`.

pub mod merge;
pub mod mod_list;
pub mod toml;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, LoaderOptions, ModexConfig};
pub use mod_list::{ModList, ModListEntry};
pub use toml::{CategoriesSection, ExtractSection, ModexToml, PathsSection};

use modex_core::error::ModexError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ModexError>;
