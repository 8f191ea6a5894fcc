//! Lua 5.2 engine backed by `mlua`

use super::ScriptEngine;
use camino::Utf8Path;
use modex_core::error::ModexError;
use modex_core::ModexResult;
use mlua::{Lua, Table, Value as LuaValue};
use serde_json::{Map, Number, Value};
use std::fs;
use tracing::trace;

/// Tables nested deeper than this cannot be converted to JSON. Also stops
/// self-referencing tables.
pub const MAX_TABLE_DEPTH: usize = 256;

/// Largest integer an `f64` represents exactly
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Script engine running package scripts in one shared Lua state
pub struct LuaEngine {
    lua: Lua,
}

impl LuaEngine {
    pub fn new() -> Self {
        Self { lua: Lua::new() }
    }

    fn package_table(&self) -> ModexResult<Table<'_>> {
        self.lua
            .globals()
            .get::<_, Table>("package")
            .map_err(|e| script_error("package", e))
    }
}

impl Default for LuaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEngine for LuaEngine {
    fn load_library_file(&mut self, path: &Utf8Path) -> ModexResult<()> {
        let source =
            fs::read(path).map_err(|e| ModexError::io(format!("Failed to read {}", path), e))?;
        self.evaluate_source(&source, path.as_str())
    }

    fn evaluate_source(&mut self, source: &[u8], chunk_name: &str) -> ModexResult<()> {
        trace!("Evaluating {}", chunk_name);
        self.lua
            .load(source)
            .set_name(format!("={}", chunk_name))
            .exec()
            .map_err(|e| script_error(chunk_name, e))
    }

    fn set_package_path(&mut self, value: &str) -> ModexResult<()> {
        self.package_table()?
            .set("path", value)
            .map_err(|e| script_error("package.path", e))
    }

    fn package_path(&self) -> ModexResult<String> {
        self.package_table()?
            .get::<_, String>("path")
            .map_err(|e| script_error("package.path", e))
    }

    fn global_table(&self, name: &str) -> ModexResult<Value> {
        let value: LuaValue = self
            .lua
            .globals()
            .get(name)
            .map_err(|e| global_error(name, e.to_string()))?;

        match value {
            LuaValue::Table(table) => table_to_json(table, 0).map_err(|m| global_error(name, m)),
            LuaValue::Nil => Err(global_error(name, "not defined".to_string())),
            other => Err(global_error(
                name,
                format!("expected a table, found {}", other.type_name()),
            )),
        }
    }

    fn reset_loaded_modules(&mut self) -> ModexResult<()> {
        let loaded: Table = self
            .package_table()?
            .get("loaded")
            .map_err(|e| script_error("package.loaded", e))?;

        let keys = loaded
            .clone()
            .pairs::<LuaValue, LuaValue>()
            .map(|pair| pair.map(|(key, _)| key))
            .collect::<mlua::Result<Vec<_>>>()
            .map_err(|e| script_error("package.loaded", e))?;

        for key in keys {
            loaded
                .set(key, false)
                .map_err(|e| script_error("package.loaded", e))?;
        }
        Ok(())
    }
}

fn script_error(chunk: &str, error: mlua::Error) -> ModexError {
    ModexError::Script {
        chunk: chunk.to_string(),
        message: error.to_string(),
    }
}

fn global_error(name: &str, message: String) -> ModexError {
    ModexError::GlobalTable {
        name: name.to_string(),
        message,
    }
}

/// Convert a Lua value. `None` means the value has no JSON form (functions,
/// userdata, threads) and should be left out.
fn to_json(value: LuaValue<'_>, depth: usize) -> Result<Option<Value>, String> {
    let json = match value {
        LuaValue::Nil => Value::Null,
        LuaValue::Boolean(b) => Value::Bool(b),
        LuaValue::Integer(i) => Value::from(i),
        LuaValue::Number(n) => number_to_json(n),
        LuaValue::String(s) => Value::String(s.to_string_lossy().into_owned()),
        LuaValue::Table(table) => table_to_json(table, depth)?,
        _ => return Ok(None),
    };
    Ok(Some(json))
}

fn number_to_json(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_FLOAT_INT {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Tables keyed exactly `1..=n` become arrays, every other non-empty table an
/// object. An empty table is an object.
fn table_to_json(table: Table<'_>, depth: usize) -> Result<Value, String> {
    if depth >= MAX_TABLE_DEPTH {
        return Err(format!("tables nested deeper than {} levels", MAX_TABLE_DEPTH));
    }

    let entries = table
        .pairs::<LuaValue, LuaValue>()
        .collect::<mlua::Result<Vec<_>>>()
        .map_err(|e| e.to_string())?;

    if let Some(indices) = sequence_indices(&entries) {
        let mut array = vec![Value::Null; entries.len()];
        for (index, (_, value)) in indices.into_iter().zip(entries) {
            array[index] = to_json(value, depth + 1)?.unwrap_or(Value::Null);
        }
        return Ok(Value::Array(array));
    }

    let mut object = Map::new();
    for (key, value) in entries {
        let Some(key) = key_to_string(&key) else {
            continue;
        };
        if let Some(value) = to_json(value, depth + 1)? {
            object.insert(key, value);
        }
    }
    Ok(Value::Object(object))
}

/// Zero-based positions when the keys are exactly `1..=len`
fn sequence_indices(entries: &[(LuaValue<'_>, LuaValue<'_>)]) -> Option<Vec<usize>> {
    if entries.is_empty() {
        return None;
    }

    let len = entries.len();
    let mut seen = vec![false; len];
    let mut indices = Vec::with_capacity(len);

    for (key, _) in entries {
        let position = match key {
            LuaValue::Integer(i) => i64::try_from(*i).ok(),
            LuaValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT_FLOAT_INT => {
                Some(*n as i64)
            }
            _ => None,
        }?;
        if position < 1 || position as usize > len || seen[position as usize - 1] {
            return None;
        }
        seen[position as usize - 1] = true;
        indices.push(position as usize - 1);
    }

    Some(indices)
}

fn key_to_string(key: &LuaValue<'_>) -> Option<String> {
    match key {
        LuaValue::String(s) => Some(s.to_string_lossy().into_owned()),
        LuaValue::Integer(i) => Some(i.to_string()),
        LuaValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT_FLOAT_INT => {
            Some((*n as i64).to_string())
        }
        LuaValue::Number(n) => Some(n.to_string()),
        LuaValue::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}
