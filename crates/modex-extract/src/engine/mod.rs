//! Script engine abstraction
//!
//! The pipeline only needs a handful of operations from the interpreter that
//! runs package scripts, so it talks to it through `ScriptEngine`. All
//! scripts share one engine and one global state.

mod lua;

pub use lua::{LuaEngine, MAX_TABLE_DEPTH};

use camino::Utf8Path;
use modex_core::ModexResult;
use serde_json::Value;

/// A stateful, re-enterable script interpreter
pub trait ScriptEngine {
    /// Load and run a library file (such as `dataloader.lua`)
    fn load_library_file(&mut self, path: &Utf8Path) -> ModexResult<()>;

    /// Run `source` in the shared global state. `chunk_name` identifies the
    /// chunk in error messages. Source is raw bytes; scripts need not be
    /// valid UTF-8.
    fn evaluate_source(&mut self, source: &[u8], chunk_name: &str) -> ModexResult<()>;

    /// Replace the module search path
    fn set_package_path(&mut self, value: &str) -> ModexResult<()>;

    /// Current module search path
    fn package_path(&self) -> ModexResult<String>;

    /// Snapshot of a global table as JSON
    fn global_table(&self, name: &str) -> ModexResult<Value>;

    /// Forget every loaded module so the next `require` searches again
    fn reset_loaded_modules(&mut self) -> ModexResult<()>;

    /// Append `<dir>/?.lua` to the module search path
    fn add_search_dir(&mut self, dir: &Utf8Path) -> ModexResult<()> {
        let current = self.package_path()?;
        self.set_package_path(&with_search_dir(&current, dir))
    }
}

/// `path` with `<dir>/?.lua` appended as the last search template
pub fn with_search_dir(path: &str, dir: &Utf8Path) -> String {
    format!("{};{}/?.lua", path, dir)
}
