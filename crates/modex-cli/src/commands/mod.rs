//! Command implementations.

use anyhow::{anyhow, Context};
use camino::Utf8PathBuf;

pub mod extract;


use crate::output::OutputHandler;

/// Shared context for commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
    pub verbose: bool,
}

impl CommandContext {
    /// Context rooted at the process working directory
    pub fn new(verbose: bool) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let cwd = Utf8PathBuf::from_path_buf(cwd)
            .map_err(|p| anyhow!("Current directory is not valid UTF-8: {}", p.display()))?;

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
            verbose,
        })
    }
}
