//! Data extraction for modex
//!
//! Runs every enabled package's definition scripts, in load order and pass
//! by pass, against one shared Lua state, then projects the resulting raw
//! data table into a compact JSON document.
//!
//! ## Architecture
//!
//! - `engine`: the `ScriptEngine` trait and its Lua implementation
//! - `pipeline`: bootstrap, passes and collection over any engine
//! - `normalize`: field filtering and the output document
//! - `session`: a full run from discovery to package cleanup

pub mod engine;
pub mod normalize;
pub mod pipeline;
pub mod session;

// Re-export main types
pub use engine::{LuaEngine, ScriptEngine};
pub use normalize::{filter_fields, FieldFilter, FieldFilters, Normalizer, OutputDocument};
pub use pipeline::{Extraction, Extractor, ExtractorConfig, PipelineState, ScriptFailure};
pub use session::{write_document, OutputTarget, Session};
