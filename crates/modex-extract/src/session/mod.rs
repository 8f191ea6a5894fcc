//! One complete extraction run
//!
//! discovery → enablement filter → load order → pipeline → output file →
//! release of every discovered package. Packages are released whether or not
//! the run succeeded.

use crate::engine::{LuaEngine, ScriptEngine};
use crate::normalize::OutputDocument;
use crate::pipeline::{Extraction, Extractor, ExtractorConfig};
use camino::{Utf8Path, Utf8PathBuf};
use modex_config::ModexConfig;
use modex_core::error::ModexError;
use modex_core::ModexResult;
use modex_loader::{order, order_checked, Discovery, PackageSet};
use std::fs;
use tracing::{info, warn};

/// Where and how to write the output document
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub path: Utf8PathBuf,
    pub pretty: bool,
}

/// Discovery plus pipeline for a single run
pub struct Session<E: ScriptEngine> {
    discovery: Discovery,
    extractor: Extractor<E>,
    allow_cycles: bool,
}

impl Session<LuaEngine> {
    /// Session over the file system and a fresh Lua engine
    pub fn new(config: &ModexConfig) -> ModexResult<Self> {
        Self::with_parts(config, Discovery::new(config.loader.clone()), LuaEngine::new())
    }
}

impl<E: ScriptEngine> Session<E> {
    pub fn with_parts(config: &ModexConfig, discovery: Discovery, engine: E) -> ModexResult<Self> {
        Ok(Self {
            discovery,
            extractor: Extractor::new(engine, ExtractorConfig::from_config(config)?),
            allow_cycles: config.allow_cycles,
        })
    }

    pub fn extractor(&self) -> &Extractor<E> {
        &self.extractor
    }

    /// Run to completion, writing the document to `output` when given.
    ///
    /// If the run fails and releasing the packages fails too, the run's
    /// error is returned and the release error is logged.
    pub fn run(&mut self, output: Option<&OutputTarget>) -> ModexResult<Extraction> {
        let packages = self.discovery.discover_all()?;

        let outcome = self.extract_from(&packages, output);
        let released = packages.finalize();
        self.extractor
            .finish(outcome.is_ok() && released.is_ok());

        match (outcome, released) {
            (Ok(extraction), Ok(())) => Ok(extraction),
            (Ok(_), Err(cleanup)) => Err(cleanup),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup)) => {
                warn!("{}", cleanup);
                Err(e)
            }
        }
    }

    fn extract_from(
        &mut self,
        packages: &PackageSet,
        output: Option<&OutputTarget>,
    ) -> ModexResult<Extraction> {
        let enabled = self.discovery.enabled(packages)?;
        let ordered = if self.allow_cycles {
            order(&enabled)
        } else {
            order_checked(&enabled)?
        };
        info!(
            "Load order: {}",
            ordered.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
        );

        let extraction = self.extractor.extract(&ordered)?;

        if let Some(target) = output {
            write_document(&extraction.document, &target.path, target.pretty)?;
        }
        Ok(extraction)
    }
}

/// Serialize the document and write it to `path` in one go
pub fn write_document(document: &OutputDocument, path: &Utf8Path, pretty: bool) -> ModexResult<()> {
    let text = if pretty {
        serde_json::to_string_pretty(document)
    } else {
        serde_json::to_string(document)
    }
    .map_err(|e| ModexError::Serialize {
        message: e.to_string(),
    })?;

    fs::write(path, text).map_err(|e| ModexError::io(format!("Failed to write {}", path), e))?;
    info!("Wrote {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    #[test]
    fn test_write_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("out.json")).unwrap();

        let mut items = IndexMap::new();
        items.insert("item".to_string(), Default::default());
        let document = OutputDocument {
            items,
            data: IndexMap::new(),
        };

        write_document(&document, &path, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"items":{"item":{}}}"#);

        write_document(&document, &path, true).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, json!({"items": {"item": {}}}));
    }

    #[test]
    fn test_write_into_missing_directory() {
        let err = write_document(
            &OutputDocument::default(),
            Utf8Path::new("/no/such/dir/out.json"),
            false,
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
