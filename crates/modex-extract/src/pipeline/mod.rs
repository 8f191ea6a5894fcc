//! Multi-pass extraction pipeline
//!
//! The pipeline bootstraps one engine, replays every pass script of every
//! package against it in load order, then reads back `data.raw` and
//! normalizes it. A script that fails is recorded and skipped; only a failed
//! bootstrap or an unreadable raw table stops the run.

mod shim;

pub use shim::{COMPAT_SHIM, SHIM_CHUNK};

use crate::engine::{with_search_dir, ScriptEngine};
use crate::normalize::{Normalizer, OutputDocument};
use camino::Utf8PathBuf;
use modex_config::ModexConfig;
use modex_core::error::ModexError;
use modex_core::{ModexResult, Package};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::io::ErrorKind;
use tracing::{debug, info, warn};

/// Library file that defines the global `data` table
pub const DATA_LOADER_FILE: &str = "dataloader.lua";

/// Where a pipeline is in its run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Bootstrapped,
    /// Running the named pass
    Pass(String),
    Collected,
    Normalized,
    Finalized,
    Failed,
}

/// A pass script that did not run to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptFailure {
    pub package: String,
    pub pass: String,
    pub message: String,
}

impl fmt::Display for ScriptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.package, self.pass, self.message)
    }
}

/// Result of a completed run
#[derive(Debug)]
pub struct Extraction {
    pub document: OutputDocument,
    pub failures: Vec<ScriptFailure>,
}

impl Extraction {
    /// Number of scripts that failed
    pub fn error_count(&self) -> usize {
        self.failures.len()
    }
}

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Pass script file names, in execution order
    pub passes: Vec<String>,
    /// Raw categories collected under `items`
    pub item_types: Vec<String>,
    /// Raw categories collected at the top level
    pub data_types: Vec<String>,
    /// Directory holding `dataloader.lua` and the game's Lua libraries
    pub lualib: Utf8PathBuf,
    /// Prelude evaluated after the data loader
    pub shim: String,
}

impl ExtractorConfig {
    /// Settings taken from a merged configuration
    pub fn from_config(config: &ModexConfig) -> ModexResult<Self> {
        Normalizer::new(&config.item_types, &config.data_types)?;
        Ok(Self {
            passes: config.passes.clone(),
            item_types: config.item_types.clone(),
            data_types: config.data_types.clone(),
            lualib: config.lualib_path()?,
            shim: COMPAT_SHIM.to_string(),
        })
    }
}

/// Drives a `ScriptEngine` through bootstrap, passes, collection and
/// normalization
pub struct Extractor<E: ScriptEngine> {
    engine: E,
    config: ExtractorConfig,
    state: PipelineState,
    baseline_path: String,
    failures: Vec<ScriptFailure>,
}

impl<E: ScriptEngine> Extractor<E> {
    pub fn new(engine: E, config: ExtractorConfig) -> Self {
        Self {
            engine,
            config,
            state: PipelineState::Uninitialized,
            baseline_path: String::new(),
            failures: Vec::new(),
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn failures(&self) -> &[ScriptFailure] {
        &self.failures
    }

    /// Run every step up to and including normalization
    pub fn extract(&mut self, packages: &[&Package]) -> ModexResult<Extraction> {
        let result = self.run(packages);
        if result.is_err() {
            self.state = PipelineState::Failed;
        }
        result
    }

    fn run(&mut self, packages: &[&Package]) -> ModexResult<Extraction> {
        self.bootstrap()?;
        self.run_passes(packages)?;
        let raw = self.collect()?;
        let document = self.normalize(&raw)?;

        Ok(Extraction {
            document,
            failures: std::mem::take(&mut self.failures),
        })
    }

    /// Prepare the engine: make the game's library directory searchable,
    /// remember that search path as the baseline, load the data loader and
    /// evaluate the prelude
    pub fn bootstrap(&mut self) -> ModexResult<()> {
        self.require_state(&PipelineState::Uninitialized, "bootstrap")?;

        self.bootstrap_engine().map_err(|e| ModexError::Bootstrap {
            message: e.to_string(),
        })?;

        info!("Script engine ready (library path {})", self.config.lualib);
        self.state = PipelineState::Bootstrapped;
        Ok(())
    }

    fn bootstrap_engine(&mut self) -> ModexResult<()> {
        self.engine.add_search_dir(&self.config.lualib)?;
        self.baseline_path = self.engine.package_path()?;

        self.engine
            .load_library_file(&self.config.lualib.join(DATA_LOADER_FILE))?;
        self.engine.evaluate_source(self.config.shim.as_bytes(), SHIM_CHUNK)
    }

    /// Run each pass over every package in order
    pub fn run_passes(&mut self, packages: &[&Package]) -> ModexResult<()> {
        self.require_state(&PipelineState::Bootstrapped, "run passes")?;

        let passes = self.config.passes.clone();
        for pass in &passes {
            info!("Running {}", pass);
            self.state = PipelineState::Pass(pass.clone());
            for package in packages {
                self.run_script(package, pass);
            }
        }

        if !self.failures.is_empty() {
            info!("Ignoring {} script error(s)", self.failures.len());
        }
        Ok(())
    }

    fn run_script(&mut self, package: &Package, pass: &str) {
        match self.try_run_script(package, pass) {
            Ok(true) => debug!("Ran {}/{}", package.name(), pass),
            Ok(false) => debug!("No {} in {}", pass, package.name()),
            Err(e) => {
                warn!("{} failed in {}: {}", pass, package.name(), e);
                self.failures.push(ScriptFailure {
                    package: package.name().to_string(),
                    pass: pass.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    /// `Ok(false)` when the package has no script for this pass
    fn try_run_script(&mut self, package: &Package, pass: &str) -> ModexResult<bool> {
        let root = package.root();
        self.engine
            .set_package_path(&with_search_dir(&self.baseline_path, root))?;
        self.engine.reset_loaded_modules()?;

        let script_path = root.join(pass);
        let source = match std::fs::read(&script_path) {
            Ok(source) => source,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(ModexError::io(format!("Failed to read {}", script_path), e)),
        };

        self.engine
            .evaluate_source(&source, &format!("{}/{}", package.name(), pass))?;
        Ok(true)
    }

    /// Read `data.raw` back from the engine
    pub fn collect(&mut self) -> ModexResult<Value> {
        if !matches!(self.state, PipelineState::Pass(_) | PipelineState::Bootstrapped) {
            return Err(self.out_of_order("collect"));
        }

        let data = self.engine.global_table("data")?;
        let raw = match data {
            Value::Object(mut fields) => fields.remove("raw").unwrap_or(Value::Null),
            _ => Value::Null,
        };

        self.state = PipelineState::Collected;
        Ok(raw)
    }

    fn normalize(&mut self, raw: &Value) -> ModexResult<OutputDocument> {
        let normalizer = Normalizer::new(&self.config.item_types, &self.config.data_types)?;
        let document = normalizer.normalize(raw);
        self.state = PipelineState::Normalized;
        Ok(document)
    }

    /// Record the outcome of releasing the packages after a run
    pub fn finish(&mut self, cleanup_succeeded: bool) {
        self.state = if cleanup_succeeded && self.state == PipelineState::Normalized {
            PipelineState::Finalized
        } else {
            PipelineState::Failed
        };
    }

    fn require_state(&self, expected: &PipelineState, step: &str) -> ModexResult<()> {
        if &self.state == expected {
            Ok(())
        } else {
            Err(self.out_of_order(step))
        }
    }

    fn out_of_order(&self, step: &str) -> ModexError {
        ModexError::Script {
            chunk: "pipeline".to_string(),
            message: format!("cannot {} while {:?}", step, self.state),
        }
    }
}
