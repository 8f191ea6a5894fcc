//! `mod-list.json` parsing
//!
//! The game keeps the enablement state of installed mods in
//! `mods/mod-list.json`:
//!
//! ```json
//! { "mods": [ { "name": "base", "enabled": true } ] }
//! ```

use crate::ConfigResult;
use camino::Utf8Path;
use modex_core::error::ModexError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Complete mod-list.json document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModList {
    #[serde(default)]
    pub mods: Vec<ModListEntry>,
}

/// One `{name, enabled}` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModListEntry {
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
}

impl ModList {
    /// Names of every mod listed with `enabled: true`
    pub fn enabled_names(&self) -> HashSet<String> {
        self.mods
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Check whether `name` is listed and enabled
    pub fn is_enabled(&self, name: &str) -> bool {
        self.mods.iter().any(|entry| entry.enabled && entry.name == name)
    }
}

/// Parse mod-list.json content. `origin` is only used in error messages.
pub fn parse_mod_list(content: &str, origin: &str) -> ConfigResult<ModList> {
    serde_json::from_str(content).map_err(|e| ModexError::ModListRead {
        path: origin.to_string(),
        message: format!("JSON parsing error: {}", e),
    })
}

/// Read and parse a mod-list.json file
pub fn load_from_file(path: &Utf8Path) -> ConfigResult<ModList> {
    let content = std::fs::read_to_string(path).map_err(|e| ModexError::ModListRead {
        path: path.to_string(),
        message: e.to_string(),
    })?;

    let list = parse_mod_list(&content, path.as_str())?;
    tracing::debug!(
        "Read {} mod list entries ({} enabled) from {}",
        list.mods.len(),
        list.enabled_names().len(),
        path
    );
    Ok(list)
}
