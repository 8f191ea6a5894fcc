//! `info.json` manifest model.

use crate::error::{ModexError, ModexResult};
use serde::{Deserialize, Serialize};

/// Contents of a package's `info.json`
///
/// Every field is optional at the serde level so that a manifest can be read
/// before it is validated; `Package::from_manifest` enforces `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Game version the package targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factorio_version: Option<String>,

    /// Raw dependency strings, parsed by `Package::from_manifest`
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Manifest {
    /// Create a manifest with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Parse manifest JSON. `origin` is only used in error messages.
    pub fn from_json(content: &str, origin: &str) -> ModexResult<Self> {
        serde_json::from_str(content).map_err(|e| ModexError::ManifestParse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }
}
