//! Package types.
//!
//! A `Package` is built once from an `info.json` manifest and is read-only
//! afterwards. Ordering and extraction borrow packages; the owner releases
//! them with `Package::cleanup`, which consumes the package so it can only run
//! once.

use super::{Constraint, Dependency, DependencyError, Manifest, Version};
use crate::error::{ModexError, ModexResult};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use tracing::warn;

/// Work to run when a package is released, such as removing the temporary
/// directory an archive was unpacked into
pub type CleanupTask = Box<dyn FnOnce() -> std::io::Result<()> + Send>;

/// Name of the game's base content package
pub const BASE_PACKAGE: &str = "base";

/// Name of the package every `base` implicitly depends on
pub const CORE_PACKAGE: &str = "core";

/// A content package (a "mod")
pub struct Package {
    name: String,
    version: Version,
    dependencies: Vec<Dependency>,
    manifest: Manifest,
    root: Utf8PathBuf,
    cleanup: Option<CleanupTask>,
}

impl Package {
    /// Create a package directly, without a manifest on disk
    pub fn new(name: impl Into<String>, version: Version, dependencies: Vec<Dependency>) -> Self {
        let name = name.into();
        let dependencies = with_implicit_dependencies(&name, dependencies);
        let manifest = Manifest {
            name: Some(name.clone()),
            version: Some(version.to_string()),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            ..Manifest::default()
        };

        Self {
            name,
            version,
            dependencies,
            manifest,
            root: Utf8PathBuf::new(),
            cleanup: None,
        }
    }

    /// Build a package from a parsed manifest. `root` is the directory holding
    /// the manifest and the package's scripts.
    pub fn from_manifest(manifest: Manifest, root: impl Into<Utf8PathBuf>) -> ModexResult<Self> {
        let root = root.into();
        let origin = root.join("info.json");

        let name = manifest
            .name
            .clone()
            .ok_or_else(|| ModexError::ManifestParse {
                path: origin.to_string(),
                message: "missing required field 'name'".to_string(),
            })?;

        let version = match manifest.version.as_deref() {
            Some(text) => text.parse().map_err(|e| ModexError::ManifestParse {
                path: origin.to_string(),
                message: format!("invalid version: {}", e),
            })?,
            None => Version::default(),
        };

        // An unknown comparator drops that dependency, not the package
        let mut declared = Vec::with_capacity(manifest.dependencies.len());
        for text in &manifest.dependencies {
            match text.parse::<Dependency>() {
                Ok(dependency) => declared.push(dependency),
                Err(e @ DependencyError::UnsupportedComparator { .. }) => {
                    warn!("{}: ignoring dependency: {}", origin, e);
                }
                Err(e) => {
                    return Err(ModexError::ManifestParse {
                        path: origin.to_string(),
                        message: e.to_string(),
                    })
                }
            }
        }

        Ok(Self {
            dependencies: with_implicit_dependencies(&name, declared),
            name,
            version,
            manifest,
            root,
            cleanup: None,
        })
    }

    /// Set the directory scripts are loaded from
    pub fn with_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Register work to run when the package is released
    pub fn with_cleanup(mut self, task: CleanupTask) -> Self {
        self.cleanup = Some(task);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Declared dependencies, plus `core` for the `base` package
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Human readable title, falling back to the name
    pub fn title(&self) -> &str {
        self.manifest.title.as_deref().unwrap_or(&self.name)
    }

    /// Directory containing `info.json` and the pass scripts
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Check if this package satisfies `dep`
    pub fn satisfies_dependency(&self, dep: &Dependency) -> bool {
        if self.name != dep.name {
            return false;
        }

        match dep.constraint {
            Constraint::None => true,
            Constraint::Equal => self.version == dep.version,
            Constraint::GreaterThan => self.version.is_greater(&dep.version),
            Constraint::GreaterThanOrEqual => {
                self.version == dep.version || self.version.is_greater(&dep.version)
            }
        }
    }

    /// Check if this package depends on `other`.
    ///
    /// Only dependencies that affect load order count. With
    /// `ignore_optional`, dependencies marked optional are skipped too.
    pub fn depends_on(&self, other: &Package, ignore_optional: bool) -> bool {
        self.dependencies
            .iter()
            .filter(|dep| dep.kind.affects_load_order())
            .filter(|dep| !(ignore_optional && dep.is_optional()))
            .any(|dep| other.satisfies_dependency(dep))
    }

    /// Release the package, running its registered cleanup task if any
    pub fn cleanup(mut self) -> ModexResult<()> {
        match self.cleanup.take() {
            Some(task) => task().map_err(|e| {
                ModexError::io(format!("Failed to clean up package '{}'", self.name), e)
            }),
            None => Ok(()),
        }
    }
}

fn with_implicit_dependencies(name: &str, mut dependencies: Vec<Dependency>) -> Vec<Dependency> {
    if name == BASE_PACKAGE && !dependencies.iter().any(|d| d.name == CORE_PACKAGE) {
        dependencies.push(Dependency::new(CORE_PACKAGE));
    }
    dependencies
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("dependencies", &self.dependencies)
            .field("root", &self.root)
            .field("has_cleanup", &self.cleanup.is_some())
            .finish()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
