//! Package discovery
//!
//! Built-in ("vanilla") packages live as directories under the game's data
//! directory. User-added packages live under the mods directory, usually as
//! `.zip` archives and occasionally unpacked.

use crate::loader::{FsPackageLoader, PackageLoader, MANIFEST_FILE};
use crate::set::PackageSet;
use crate::LoaderResult;
use camino::{Utf8Path, Utf8PathBuf};
use modex_config::{mod_list, LoaderOptions};
use modex_core::error::ModexError;
use modex_core::Package;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Finds installed packages according to `LoaderOptions`
pub struct Discovery {
    options: LoaderOptions,
    loader: Arc<dyn PackageLoader>,
}

impl Discovery {
    /// Discovery backed by the file-system loader
    pub fn new(options: LoaderOptions) -> Self {
        Self::with_loader(options, Arc::new(FsPackageLoader::new()))
    }

    pub fn with_loader(options: LoaderOptions, loader: Arc<dyn PackageLoader>) -> Self {
        Self {
            options: options.resolved(),
            loader,
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Every built-in package: each `*/info.json` directly under `data_path`
    pub fn vanilla(&self, data_path: &Utf8Path) -> LoaderResult<PackageSet> {
        let mut set = PackageSet::default();
        for manifest in matches(data_path, &format!("*/{}", MANIFEST_FILE))? {
            let root = parent_dir(&manifest);
            set.push(self.loader.load_from_directory(&root)?);
        }
        debug!("Found {} built-in package(s) in {}", set.len(), data_path);
        Ok(set)
    }

    /// Every user-added package: each `*.zip` archive, then each unpacked
    /// `*/info.json` directory, directly under `mod_path`
    pub fn added(&self, mod_path: &Utf8Path) -> LoaderResult<PackageSet> {
        let mut set = PackageSet::default();
        for archive in matches(mod_path, "*.zip")? {
            set.push(self.loader.load_from_archive(&archive)?);
        }
        for manifest in matches(mod_path, &format!("*/{}", MANIFEST_FILE))? {
            let root = parent_dir(&manifest);
            set.push(self.loader.load_from_directory(&root)?);
        }
        debug!("Found {} user-added package(s) in {}", set.len(), mod_path);
        Ok(set)
    }

    /// Built-in followed by user-added packages. The two searches run
    /// concurrently; either may be switched off in the options.
    pub fn discover_all(&self) -> LoaderResult<PackageSet> {
        let vanilla_path = match self.options.vanilla {
            true => Some(self.options.require_data_path()?),
            false => None,
        };
        let added_path = match self.options.added {
            true => Some(self.options.require_mod_path()?),
            false => None,
        };

        let (vanilla, added) = rayon::join(
            || vanilla_path.map_or_else(|| Ok(PackageSet::default()), |p| self.vanilla(p)),
            || added_path.map_or_else(|| Ok(PackageSet::default()), |p| self.added(p)),
        );

        let mut all = vanilla?;
        all.extend(added?);

        info!("Discovered {} package(s)", all.len());
        Ok(all)
    }

    /// Packages of `set` listed as enabled in the configured mod list
    pub fn enabled<'a>(&self, set: &'a PackageSet) -> LoaderResult<Vec<&'a Package>> {
        let list = mod_list::load_from_file(self.options.require_mod_list()?)?;
        let enabled = filter_enabled(set.iter(), &list.enabled_names());

        info!("{} of {} package(s) enabled", enabled.len(), set.len());
        Ok(enabled)
    }
}

/// Keep packages whose name is in `enabled`, preserving input order
pub fn filter_enabled<'a, I>(packages: I, enabled: &HashSet<String>) -> Vec<&'a Package>
where
    I: IntoIterator<Item = &'a Package>,
{
    packages
        .into_iter()
        .filter(|package| enabled.contains(package.name()))
        .collect()
}

/// Sorted paths matching `pattern` inside `dir`. A missing directory matches
/// nothing.
fn matches(dir: &Utf8Path, pattern: &str) -> LoaderResult<Vec<Utf8PathBuf>> {
    let full = format!("{}/{}", glob::Pattern::escape(dir.as_str()), pattern);
    let paths = glob::glob(&full).map_err(|e| ModexError::ConfigValidation {
        field: "paths".to_string(),
        reason: format!("invalid search pattern '{}': {}", full, e),
    })?;

    let mut found = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| {
            let message = format!("Failed to read {}", e.path().display());
            ModexError::io(message, e.into_error())
        })?;
        match Utf8PathBuf::from_path_buf(path) {
            Ok(path) => found.push(path),
            Err(path) => debug!("Skipping non UTF-8 path {}", path.display()),
        }
    }
    found.sort();

    Ok(found)
}

fn parent_dir(manifest: &Utf8Path) -> Utf8PathBuf {
    manifest
        .parent()
        .map(Utf8Path::to_path_buf)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::build_zip;
    use modex_core::Version;
    use std::fs;
    use std::sync::Mutex;

    /// Records what it was asked to load and hands back bare packages named
    /// after the last path component
    #[derive(Default)]
    struct RecordingLoader {
        directories: Mutex<Vec<Utf8PathBuf>>,
        archives: Mutex<Vec<Utf8PathBuf>>,
    }

    impl PackageLoader for RecordingLoader {
        fn load_from_directory(&self, path: &Utf8Path) -> LoaderResult<Package> {
            self.directories.lock().unwrap().push(path.to_path_buf());
            Ok(Package::new(path.file_name().unwrap(), Version::default(), vec![]))
        }

        fn load_from_archive(&self, path: &Utf8Path) -> LoaderResult<Package> {
            self.archives.lock().unwrap().push(path.to_path_buf());
            Ok(Package::new(path.file_stem().unwrap(), Version::default(), vec![]))
        }
    }

    struct GameDir {
        _temp: tempfile::TempDir,
        root: Utf8PathBuf,
    }

    impl GameDir {
        fn new() -> Self {
            let temp = tempfile::tempdir().unwrap();
            let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
            fs::create_dir_all(root.join("data")).unwrap();
            fs::create_dir_all(root.join("mods")).unwrap();
            Self { _temp: temp, root }
        }

        fn package_dir(&self, parent: &str, name: &str, manifest: &str) {
            let dir = self.root.join(parent).join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
        }

        fn archive(&self, file: &str, entries: &[(&str, &str)]) {
            fs::write(self.root.join("mods").join(file), build_zip(entries)).unwrap();
        }

        fn mod_list(&self, json: &str) {
            fs::write(self.root.join("mods").join("mod-list.json"), json).unwrap();
        }
    }

    fn package(name: &str) -> Package {
        Package::new(name, Version::default(), vec![])
    }

    #[test]
    fn test_vanilla_finds_manifest_directories() {
        let game = GameDir::new();
        game.package_dir("data", "base", "{}");
        game.package_dir("data", "core", "{}");
        fs::create_dir_all(game.root.join("data/no-manifest")).unwrap();

        let loader = Arc::new(RecordingLoader::default());
        let discovery = Discovery::with_loader(LoaderOptions::for_game(&game.root), loader.clone());
        let set = discovery.vanilla(&game.root.join("data")).unwrap();

        assert_eq!(set.names(), vec!["base", "core"]);
        let dirs = loader.directories.lock().unwrap();
        assert!(dirs.contains(&game.root.join("data/base")));
        assert!(dirs.contains(&game.root.join("data/core")));
        assert!(loader.archives.lock().unwrap().is_empty());
    }

    #[test]
    fn test_added_finds_archives_and_directories() {
        let game = GameDir::new();
        game.archive("zipped_1.0.0.zip", &[]);
        game.package_dir("mods", "unpacked", "{}");
        fs::write(game.root.join("mods/notes.txt"), "").unwrap();

        let loader = Arc::new(RecordingLoader::default());
        let discovery = Discovery::with_loader(LoaderOptions::for_game(&game.root), loader.clone());
        let set = discovery.added(&game.root.join("mods")).unwrap();

        assert_eq!(set.names(), vec!["zipped_1.0.0", "unpacked"]);
        assert_eq!(
            *loader.archives.lock().unwrap(),
            vec![game.root.join("mods/zipped_1.0.0.zip")]
        );
    }

    #[test]
    fn test_missing_directory_finds_nothing() {
        let discovery = Discovery::with_loader(
            LoaderOptions::default(),
            Arc::new(RecordingLoader::default()),
        );
        let set = discovery.vanilla(Utf8Path::new("/definitely/not/here")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_discover_all_respects_switches() {
        let game = GameDir::new();
        game.package_dir("data", "base", "{}");
        game.package_dir("mods", "extra", "{}");

        let loader: Arc<dyn PackageLoader> = Arc::new(RecordingLoader::default());

        let both = Discovery::with_loader(LoaderOptions::for_game(&game.root), loader.clone());
        assert_eq!(both.discover_all().unwrap().names(), vec!["base", "extra"]);

        let mut options = LoaderOptions::for_game(&game.root);
        options.added = false;
        let vanilla_only = Discovery::with_loader(options, loader.clone());
        assert_eq!(vanilla_only.discover_all().unwrap().names(), vec!["base"]);

        let mut options = LoaderOptions::for_game(&game.root);
        options.vanilla = false;
        let added_only = Discovery::with_loader(options, loader);
        assert_eq!(added_only.discover_all().unwrap().names(), vec!["extra"]);
    }

    #[test]
    fn test_discover_all_requires_paths() {
        let discovery = Discovery::with_loader(
            LoaderOptions::default(),
            Arc::new(RecordingLoader::default()),
        );
        let err = discovery.discover_all().unwrap_err();
        assert!(matches!(err, ModexError::ConfigValidation { .. }));
    }

    #[test]
    fn test_discover_all_with_real_loader() {
        let game = GameDir::new();
        game.package_dir("data", "core", r#"{"name": "core", "version": "0.15.0"}"#);
        game.package_dir("data", "base", r#"{"name": "base", "version": "0.15.0"}"#);
        game.archive(
            "helper_0.2.0.zip",
            &[("helper_0.2.0/info.json", r#"{"name": "helper", "version": "0.2.0", "dependencies": ["base"]}"#)],
        );

        let set = Discovery::new(LoaderOptions::for_game(&game.root))
            .discover_all()
            .unwrap();

        assert_eq!(set.names(), vec!["base", "core", "helper"]);
        set.finalize().unwrap();
    }

    #[test]
    fn test_filter_enabled() {
        let packages = [
            package("enabled-mod-1"),
            package("disabled-mod-1"),
            package("unlisted-mod-1"),
        ];
        let enabled: HashSet<String> = ["enabled-mod-1".to_string()].into_iter().collect();

        let names: Vec<&str> = filter_enabled(&packages, &enabled)
            .into_iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["enabled-mod-1"]);
    }

    #[test]
    fn test_filter_enabled_preserves_order() {
        let packages = [package("c"), package("a"), package("b")];
        let enabled: HashSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

        let names: Vec<&str> = filter_enabled(&packages, &enabled)
            .into_iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_enabled_reads_mod_list() {
        let game = GameDir::new();
        game.mod_list(
            r#"{"mods": [
                {"name": "enabled-mod-1", "enabled": true},
                {"name": "disabled-mod-1", "enabled": false}
            ]}"#,
        );

        let discovery = Discovery::with_loader(
            LoaderOptions::for_game(&game.root),
            Arc::new(RecordingLoader::default()),
        );
        let set = PackageSet::new(vec![
            package("enabled-mod-1"),
            package("disabled-mod-1"),
            package("unlisted-mod-1"),
        ]);

        let names: Vec<&str> = discovery
            .enabled(&set)
            .unwrap()
            .into_iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["enabled-mod-1"]);
    }

    #[test]
    fn test_enabled_without_mod_list() {
        let game = GameDir::new();
        let discovery = Discovery::with_loader(
            LoaderOptions::for_game(&game.root),
            Arc::new(RecordingLoader::default()),
        );

        let err = discovery.enabled(&PackageSet::default()).unwrap_err();
        assert!(matches!(err, ModexError::ModListRead { .. }));
    }
}
