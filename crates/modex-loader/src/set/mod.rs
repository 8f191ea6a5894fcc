//! Owned collection of discovered packages

use crate::LoaderResult;
use modex_core::error::ModexError;
use modex_core::Package;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Every package found by discovery, in discovery order.
///
/// The set owns its packages; filtering and ordering hand out references.
/// `finalize` consumes the set and releases each package exactly once. A set
/// dropped without `finalize` still runs cleanups.
#[derive(Debug, Default)]
pub struct PackageSet {
    packages: Vec<Package>,
}

impl PackageSet {
    pub fn new(packages: Vec<Package>) -> Self {
        Self { packages }
    }

    pub fn push(&mut self, package: Package) {
        self.packages.push(package);
    }

    pub fn extend(&mut self, mut other: PackageSet) {
        self.packages.append(&mut other.packages);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Package> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Borrow every package, preserving discovery order
    pub fn refs(&self) -> Vec<&Package> {
        self.packages.iter().collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.name()).collect()
    }

    /// Release every package concurrently.
    ///
    /// All cleanups are attempted; failures are collected into one
    /// `ModexError::Cleanup` reported after the last one finishes.
    pub fn finalize(mut self) -> LoaderResult<()> {
        let packages = std::mem::take(&mut self.packages);
        let count = packages.len();

        let failures: Vec<String> = packages
            .into_par_iter()
            .filter_map(|package| package.cleanup().err())
            .map(|e| e.to_string())
            .collect();

        if failures.is_empty() {
            debug!("Released {} package(s)", count);
            Ok(())
        } else {
            Err(ModexError::Cleanup { failures })
        }
    }
}

impl Drop for PackageSet {
    fn drop(&mut self) {
        for package in self.packages.drain(..) {
            let name = package.name().to_string();
            if let Err(e) = package.cleanup() {
                warn!("Cleanup of '{}' failed during drop: {}", name, e);
            }
        }
    }
}

impl<'a> IntoIterator for &'a PackageSet {
    type Item = &'a Package;
    type IntoIter = std::slice::Iter<'a, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.iter()
    }
}

impl FromIterator<Package> for PackageSet {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
