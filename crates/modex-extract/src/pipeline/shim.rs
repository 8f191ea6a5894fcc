//! Lua prelude evaluated after `dataloader.lua`
//!
//! Package scripts run outside the game, so globals the game runtime would
//! normally provide are stubbed here.

/// Chunk name used for the prelude in error messages
pub const SHIM_CHUNK: &str = "compat-shim";

/// Default prelude
pub const COMPAT_SHIM: &str = r#"
function module(name, ...)
end

function log(...)
end

require("util")

util = type(util) == "table" and util or {}
util.table = util.table or {}
util.table.deepcopy = util.table.deepcopy or table.deepcopy
util.multiplystripes = util.multiplystripes or multiplystripes
util.by_pixel = util.by_pixel or by_pixel
util.format_number = util.format_number or format_number
util.increment = util.increment or increment

defines = defines or {}
defines.difficulty_settings = {
  recipe_difficulty = { normal = 1 },
  technology_difficulty = { normal = 1 },
}
defines.direction = { north = 1, east = 2, south = 3, west = 4 }

data.raw["gui-style"] = { default = {} }
"#;
