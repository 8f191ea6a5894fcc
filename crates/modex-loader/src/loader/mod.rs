//! Building packages from disk
//!
//! A package is either a directory holding `info.json` or a `.zip` archive
//! whose contents are unpacked into a temporary directory owned by the
//! package until it is cleaned up.

use crate::archive::{extract_zip, locate_package_root};
use crate::LoaderResult;
use camino::{Utf8Path, Utf8PathBuf};
use modex_core::error::ModexError;
use modex_core::{Manifest, Package};
use std::fs;
use tracing::debug;

/// Manifest file name at the root of every package
pub const MANIFEST_FILE: &str = "info.json";

/// Turns a location on disk into a `Package`
pub trait PackageLoader: Send + Sync {
    /// Load an unpacked package from the directory holding its manifest
    fn load_from_directory(&self, path: &Utf8Path) -> LoaderResult<Package>;

    /// Load a packaged (`.zip`) package
    fn load_from_archive(&self, path: &Utf8Path) -> LoaderResult<Package>;
}

/// File-system backed loader
#[derive(Debug, Clone, Default)]
pub struct FsPackageLoader;

impl FsPackageLoader {
    pub fn new() -> Self {
        Self
    }
}

impl PackageLoader for FsPackageLoader {
    fn load_from_directory(&self, path: &Utf8Path) -> LoaderResult<Package> {
        let manifest_path = path.join(MANIFEST_FILE);
        let content = fs::read_to_string(&manifest_path)
            .map_err(|e| ModexError::io(format!("Failed to read {}", manifest_path), e))?;

        let manifest = Manifest::from_json(&content, manifest_path.as_str())?;
        let package = Package::from_manifest(manifest, path)?;
        debug!("Loaded {} from {}", package, path);

        Ok(package)
    }

    fn load_from_archive(&self, path: &Utf8Path) -> LoaderResult<Package> {
        let temp = tempfile::Builder::new()
            .prefix("modex-")
            .tempdir()
            .map_err(|e| ModexError::io("Failed to create temporary directory", e))?;

        let file = fs::File::open(path)
            .map_err(|e| ModexError::io(format!("Failed to open {}", path), e))?;
        extract_zip(file, temp.path(), path.as_str())?;

        let root = locate_package_root(temp.path(), MANIFEST_FILE).ok_or_else(|| {
            ModexError::Archive {
                path: path.to_string(),
                message: format!("no {} at the archive root or in a single top-level folder", MANIFEST_FILE),
            }
        })?;
        let root = Utf8PathBuf::from_path_buf(root).map_err(|p| ModexError::Archive {
            path: path.to_string(),
            message: format!("extracted path is not UTF-8: {}", p.display()),
        })?;

        let package = self.load_from_directory(&root)?;
        debug!("Unpacked {} into {}", path, root);

        Ok(package.with_cleanup(Box::new(move || temp.close())))
    }
}
