//! Configuration layering and fallback logic
//!
//! Layers are applied in order, later ones winning field by field:
//! built-in defaults, then `modex.toml`, then command-line flags.

use crate::{toml::ModexToml, ConfigResult};
use camino::{Utf8Path, Utf8PathBuf};
use modex_core::error::ModexError;

/// File name searched for by `ConfigLoader`
pub const CONFIG_FILE_NAME: &str = "modex.toml";

/// Raw categories collected under `items` by default
pub const DEFAULT_ITEM_TYPES: &[&str] = &[
    "item",
    "fluid",
    "capsule",
    "module",
    "ammo",
    "gun",
    "armor",
    "blueprint",
    "deconstruction-item",
    "mining-tool",
    "repair-tool",
    "tool",
];

/// Raw categories collected at the top level by default
pub const DEFAULT_DATA_TYPES: &[&str] = &[
    "recipe",
    "assembling-machine",
    "furnace",
    "mining-drill",
    "resource",
    "module",
];

/// Pass scripts, in execution order
pub const DEFAULT_PASSES: &[&str] = &["data.lua", "data-updates.lua", "data-final-fixes.lua"];

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Directory to start searching from
    cwd: Utf8PathBuf,
}

/// Configuration layering and merging
#[derive(Debug, Default)]
pub struct ConfigLayering {
    layers: Vec<ModexToml>,
}

/// Options controlling where packages are searched for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    pub game_path: Option<Utf8PathBuf>,
    pub data_path: Option<Utf8PathBuf>,
    pub mod_path: Option<Utf8PathBuf>,
    pub mod_list: Option<Utf8PathBuf>,
    pub vanilla: bool,
    pub added: bool,
}

/// Fully merged configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModexConfig {
    pub loader: LoaderOptions,
    pub item_types: Vec<String>,
    pub data_types: Vec<String>,
    pub passes: Vec<String>,
    pub allow_cycles: bool,
    pub lualib: Option<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Find modex.toml in `cwd` or one of its parents
    pub fn find_config(&self) -> Option<Utf8PathBuf> {
        self.cwd
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|path| path.is_file())
    }

    /// Load an explicit config file, or the nearest modex.toml if any
    pub fn load(&self, explicit: Option<&Utf8Path>) -> ConfigResult<Option<ModexToml>> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match self.find_config() {
                Some(path) => path,
                None => {
                    tracing::debug!("No {} found above {}", CONFIG_FILE_NAME, self.cwd);
                    return Ok(None);
                }
            },
        };

        tracing::debug!("Loading configuration from {}", path);
        crate::toml::load_from_file(&path).map(Some)
    }
}

impl ConfigLayering {
    /// Create an empty layering (defaults only)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer that overrides everything added before it
    pub fn with_layer(mut self, layer: ModexToml) -> Self {
        self.layers.push(layer);
        self
    }

    /// Add a layer if present
    pub fn with_optional_layer(self, layer: Option<ModexToml>) -> Self {
        match layer {
            Some(layer) => self.with_layer(layer),
            None => self,
        }
    }

    /// Merge all layers over the defaults.
    ///
    /// A layer that sets `paths.game` also discards the `data`, `mods` and
    /// `mod-list` paths of earlier layers, so they are derived from the new
    /// game directory unless the same layer sets them.
    pub fn merge(self) -> ModexConfig {
        let mut merged = ModexToml::default();

        for layer in self.layers {
            let paths = layer.paths;
            if paths.game.is_some() {
                merged.paths.data = None;
                merged.paths.mods = None;
                merged.paths.mod_list = None;
            }
            merged.paths.game = paths.game.or(merged.paths.game);
            merged.paths.data = paths.data.or(merged.paths.data);
            merged.paths.mods = paths.mods.or(merged.paths.mods);
            merged.paths.mod_list = paths.mod_list.or(merged.paths.mod_list);
            merged.paths.vanilla = paths.vanilla.or(merged.paths.vanilla);
            merged.paths.added = paths.added.or(merged.paths.added);

            merged.categories.items = layer.categories.items.or(merged.categories.items);
            merged.categories.data = layer.categories.data.or(merged.categories.data);

            merged.extract.passes = layer.extract.passes.or(merged.extract.passes);
            merged.extract.allow_cycles = layer.extract.allow_cycles.or(merged.extract.allow_cycles);
            merged.extract.lualib = layer.extract.lualib.or(merged.extract.lualib);
        }

        let loader = LoaderOptions {
            game_path: merged.paths.game,
            data_path: merged.paths.data,
            mod_path: merged.paths.mods,
            mod_list: merged.paths.mod_list,
            vanilla: merged.paths.vanilla.unwrap_or(true),
            added: merged.paths.added.unwrap_or(true),
        }
        .resolved();

        ModexConfig {
            loader,
            item_types: merged
                .categories
                .items
                .unwrap_or_else(|| to_strings(DEFAULT_ITEM_TYPES)),
            data_types: merged
                .categories
                .data
                .unwrap_or_else(|| to_strings(DEFAULT_DATA_TYPES)),
            passes: merged
                .extract
                .passes
                .unwrap_or_else(|| to_strings(DEFAULT_PASSES)),
            allow_cycles: merged.extract.allow_cycles.unwrap_or(false),
            lualib: merged.extract.lualib,
        }
    }
}

impl LoaderOptions {
    /// Options rooted at a game install directory
    pub fn for_game(game_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            game_path: Some(game_path.into()),
            ..Self::default()
        }
        .resolved()
    }

    /// Fill in paths derived from other paths:
    /// `data = game/data`, `mods = game/mods`, `mod_list = mods/mod-list.json`.
    /// Explicit values are never replaced.
    pub fn resolved(mut self) -> Self {
        if self.data_path.is_none() {
            self.data_path = self.game_path.as_ref().map(|game| game.join("data"));
        }
        if self.mod_path.is_none() {
            self.mod_path = self.game_path.as_ref().map(|game| game.join("mods"));
        }
        if self.mod_list.is_none() {
            self.mod_list = self.mod_path.as_ref().map(|mods| mods.join("mod-list.json"));
        }
        self
    }

    /// Directory of built-in packages, required when `vanilla` is set
    pub fn require_data_path(&self) -> ConfigResult<&Utf8Path> {
        require(self.data_path.as_deref(), "paths.data", "set --data or paths.game")
    }

    /// Directory of user-added packages, required when `added` is set
    pub fn require_mod_path(&self) -> ConfigResult<&Utf8Path> {
        require(self.mod_path.as_deref(), "paths.mods", "set --data or paths.mods")
    }

    /// Enablement list, required when filtering
    pub fn require_mod_list(&self) -> ConfigResult<&Utf8Path> {
        require(
            self.mod_list.as_deref(),
            "paths.mod-list",
            "set --mod-list or paths.mods",
        )
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            game_path: None,
            data_path: None,
            mod_path: None,
            mod_list: None,
            vanilla: true,
            added: true,
        }
    }
}

impl ModexConfig {
    /// Library directory holding `dataloader.lua`
    pub fn lualib_path(&self) -> ConfigResult<Utf8PathBuf> {
        match &self.lualib {
            Some(path) => Ok(path.clone()),
            None => Ok(self.loader.require_data_path()?.join("core").join("lualib")),
        }
    }
}

fn require<'a>(value: Option<&'a Utf8Path>, field: &str, hint: &str) -> ConfigResult<&'a Utf8Path> {
    value.ok_or_else(|| ModexError::ConfigValidation {
        field: field.to_string(),
        reason: format!("no path configured ({})", hint),
    })
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toml::{ExtractSection, PathsSection};

    fn paths(game: &str) -> ModexToml {
        ModexToml {
            paths: PathsSection {
                game: Some(Utf8PathBuf::from(game)),
                ..PathsSection::default()
            },
            ..ModexToml::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ConfigLayering::new().merge();
        assert!(config.loader.vanilla);
        assert!(config.loader.added);
        assert_eq!(config.loader.game_path, None);
        assert_eq!(config.passes, to_strings(DEFAULT_PASSES));
        assert_eq!(config.item_types.len(), 12);
        assert_eq!(config.data_types.len(), 6);
        assert!(!config.allow_cycles);
    }

    #[test]
    fn test_derived_paths() {
        let options = LoaderOptions::for_game("/games/factorio");
        assert_eq!(options.data_path.as_deref(), Some(Utf8Path::new("/games/factorio/data")));
        assert_eq!(options.mod_path.as_deref(), Some(Utf8Path::new("/games/factorio/mods")));
        assert_eq!(
            options.mod_list.as_deref(),
            Some(Utf8Path::new("/games/factorio/mods/mod-list.json"))
        );
    }

    #[test]
    fn test_explicit_paths_are_kept() {
        let options = LoaderOptions {
            game_path: Some(Utf8PathBuf::from("/g")),
            mod_path: Some(Utf8PathBuf::from("/elsewhere/mods")),
            ..LoaderOptions::default()
        }
        .resolved();

        assert_eq!(options.data_path.as_deref(), Some(Utf8Path::new("/g/data")));
        assert_eq!(options.mod_path.as_deref(), Some(Utf8Path::new("/elsewhere/mods")));
        assert_eq!(
            options.mod_list.as_deref(),
            Some(Utf8Path::new("/elsewhere/mods/mod-list.json"))
        );
    }

    #[test]
    fn test_game_path_replaces_earlier_derived_paths() {
        let mut file = paths("/from/file");
        file.paths.data = Some(Utf8PathBuf::from("/from/file/custom-data"));
        file.paths.mods = Some(Utf8PathBuf::from("/from/file/custom-mods"));
        file.paths.mod_list = Some(Utf8PathBuf::from("/from/file/list.json"));

        let config = ConfigLayering::new()
            .with_layer(file.clone())
            .with_layer(paths("/from/cli"))
            .merge();
        assert_eq!(config.loader.data_path.as_deref(), Some(Utf8Path::new("/from/cli/data")));
        assert_eq!(config.loader.mod_path.as_deref(), Some(Utf8Path::new("/from/cli/mods")));
        assert_eq!(
            config.loader.mod_list.as_deref(),
            Some(Utf8Path::new("/from/cli/mods/mod-list.json"))
        );

        // Paths set alongside the game path in the same layer still win
        let mut cli = paths("/from/cli");
        cli.paths.mods = Some(Utf8PathBuf::from("/elsewhere/mods"));
        let config = ConfigLayering::new().with_layer(file.clone()).with_layer(cli).merge();
        assert_eq!(config.loader.mod_path.as_deref(), Some(Utf8Path::new("/elsewhere/mods")));
        assert_eq!(config.loader.data_path.as_deref(), Some(Utf8Path::new("/from/cli/data")));

        // A later layer without a game path keeps the earlier explicit paths
        let config = ConfigLayering::new()
            .with_layer(file)
            .with_layer(ModexToml::default())
            .merge();
        assert_eq!(
            config.loader.data_path.as_deref(),
            Some(Utf8Path::new("/from/file/custom-data"))
        );
    }

    #[test]
    fn test_later_layers_win() {
        let mut cli = paths("/from/cli");
        cli.extract = ExtractSection {
            allow_cycles: Some(true),
            ..ExtractSection::default()
        };

        let mut file = paths("/from/file");
        file.paths.added = Some(false);

        let config = ConfigLayering::new()
            .with_optional_layer(Some(file))
            .with_layer(cli)
            .merge();

        assert_eq!(config.loader.game_path.as_deref(), Some(Utf8Path::new("/from/cli")));
        assert!(!config.loader.added);
        assert!(config.allow_cycles);
    }

    #[test]
    fn test_missing_paths_are_reported() {
        let options = LoaderOptions::default();
        let err = options.require_data_path().unwrap_err();
        assert!(matches!(err, ModexError::ConfigValidation { ref field, .. } if field == "paths.data"));
        assert!(options.require_mod_list().is_err());
    }

    #[test]
    fn test_lualib_path() {
        let config = ConfigLayering::new().with_layer(paths("/g")).merge();
        assert_eq!(config.lualib_path().unwrap(), Utf8PathBuf::from("/g/data/core/lualib"));
    }

    #[test]
    fn test_find_config_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(CONFIG_FILE_NAME), "[paths]\ngame = \"/g\"\n").unwrap();

        let loader = ConfigLoader::new(nested);
        assert_eq!(loader.find_config(), Some(root.join(CONFIG_FILE_NAME)));

        let loaded = loader.load(None).unwrap().unwrap();
        assert_eq!(loaded.paths.game.as_deref(), Some(Utf8Path::new("/g")));
    }
}
