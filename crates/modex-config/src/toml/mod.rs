//! modex.toml configuration parsing and serialization
//!
//! Every field is optional so that a file, or a set of command-line flags
//! expressed as a `ModexToml`, only overrides what it names.

use crate::ConfigResult;
use camino::{Utf8Path, Utf8PathBuf};
use modex_core::error::ModexError;
use serde::{Deserialize, Serialize};

/// Complete modex.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModexToml {
    /// Where the game and its mods live
    #[serde(default)]
    pub paths: PathsSection,

    /// Which raw categories end up in the output
    #[serde(default)]
    pub categories: CategoriesSection,

    /// Pipeline behavior
    #[serde(default)]
    pub extract: ExtractSection,
}

/// `[paths]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathsSection {
    /// Game install directory, containing `data` and `mods`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<Utf8PathBuf>,

    /// Directory of built-in packages (defaults to `<game>/data`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Utf8PathBuf>,

    /// Directory of user-added packages (defaults to `<game>/mods`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mods: Option<Utf8PathBuf>,

    /// Enablement list (defaults to `<mods>/mod-list.json`)
    #[serde(skip_serializing_if = "Option::is_none", rename = "mod-list")]
    pub mod_list: Option<Utf8PathBuf>,

    /// Include built-in packages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vanilla: Option<bool>,

    /// Include user-added packages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<bool>,
}

/// `[categories]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoriesSection {
    /// Raw categories collected under `items`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,

    /// Raw categories collected at the top level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,
}

/// `[extract]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractSection {
    /// Pass script file names, in execution order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passes: Option<Vec<String>>,

    /// Skip packages caught in dependency cycles instead of failing
    #[serde(skip_serializing_if = "Option::is_none", rename = "allow-cycles")]
    pub allow_cycles: Option<bool>,

    /// Library directory holding `dataloader.lua` (defaults to
    /// `<data>/core/lualib`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lualib: Option<Utf8PathBuf>,
}

/// Parse TOML string to ModexToml configuration
pub fn parse_modex_toml(content: &str) -> ConfigResult<ModexToml> {
    let config: ModexToml = toml::from_str(content).map_err(|e| ModexError::TomlParse {
        message: format!("TOML parsing error: {}", e),
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize ModexToml to TOML string
pub fn serialize_modex_toml(config: &ModexToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| ModexError::TomlParse {
        message: format!("TOML serialization error: {}", e),
    })
}

/// Validate configuration values that serde cannot check
pub fn validate_config(config: &ModexToml) -> ConfigResult<()> {
    if let Some(passes) = &config.extract.passes {
        if passes.is_empty() {
            return Err(ModexError::ConfigValidation {
                field: "extract.passes".to_string(),
                reason: "at least one pass file is required".to_string(),
            });
        }
        if let Some(bad) = passes.iter().find(|p| p.contains(['/', '\\'])) {
            return Err(ModexError::ConfigValidation {
                field: "extract.passes".to_string(),
                reason: format!("'{}' must be a file name, not a path", bad),
            });
        }
    }

    for (field, list) in [
        ("categories.items", &config.categories.items),
        ("categories.data", &config.categories.data),
    ] {
        if let Some(empty) = list.iter().flatten().find(|c| c.trim().is_empty()) {
            return Err(ModexError::ConfigValidation {
                field: field.to_string(),
                reason: format!("category name '{}' is empty", empty),
            });
        }
    }

    Ok(())
}

/// Read and parse a modex.toml file
pub fn load_from_file(path: &Utf8Path) -> ConfigResult<ModexToml> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ModexError::io(format!("Failed to read {}", path), e))?;

    parse_modex_toml(&content).map_err(|e| match e {
        ModexError::TomlParse { message } => ModexError::TomlParse {
            message: format!("In file {}: {}", path, message),
        },
        other => other,
    })
}
