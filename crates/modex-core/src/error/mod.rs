//! Error types and result aliases for modex operations.
//!
//! Provides a unified error type covering discovery, configuration, script
//! execution and cleanup, with actionable messages for the CLI.

use thiserror::Error;

/// Unified error type for all modex operations
#[derive(Error, Debug)]
pub enum ModexError {
    // Package errors
    #[error("Failed to parse manifest {path}: {message}")]
    ManifestParse { path: String, message: String },

    #[error("Failed to unpack archive {path}: {message}")]
    Archive { path: String, message: String },

    // Config errors
    #[error("Failed to read mod list {path}: {message}")]
    ModListRead { path: String, message: String },

    #[error("Failed to parse modex.toml: {message}")]
    TomlParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Ordering errors
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency {
        cycle: String,
        unordered: Vec<String>,
    },

    // Script engine errors
    #[error("Script engine bootstrap failed: {message}")]
    Bootstrap { message: String },

    #[error("Script error in {chunk}: {message}")]
    Script { chunk: String, message: String },

    #[error("Failed to read global '{name}' from the script engine: {message}")]
    GlobalTable { name: String, message: String },

    // Output errors
    #[error("Failed to serialize output: {message}")]
    Serialize { message: String },

    #[error("Cleanup failed for {} package(s): {}", .failures.len(), .failures.join("; "))]
    Cleanup { failures: Vec<String> },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for modex operations
pub type ModexResult<T> = Result<T, ModexError>;

impl ModexError {
    /// Create an IO error from std::io::Error
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Check if this is an IO "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModexError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ModexError::ModListRead { .. } => {
                Some("Check that mods/mod-list.json exists or pass --mod-list")
            },
            ModexError::Bootstrap { .. } => {
                Some("Check that --data points at a game directory containing data/core/lualib")
            },
            ModexError::CircularDependency { .. } => {
                Some("Disable one of the mods in the cycle, or pass --allow-cycles to skip them")
            },
            ModexError::ManifestParse { .. } => {
                Some("Check the info.json of the named package, or disable it")
            },
            ModexError::TomlParse { .. } | ModexError::ConfigValidation { .. } => {
                Some("Check modex.toml against the documented sections")
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_not_found() {
        let err = ModexError::io(
            "reading data.lua",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.is_not_found());
        assert!(err.to_string().contains("reading data.lua"));

        let err = ModexError::io(
            "reading data.lua",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_cleanup_message_lists_failures() {
        let err = ModexError::Cleanup {
            failures: vec!["a: locked".to_string(), "b: busy".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("2 package(s)"));
        assert!(message.contains("a: locked; b: busy"));
    }

    #[test]
    fn test_suggestions() {
        let err = ModexError::CircularDependency {
            cycle: "a -> b -> a".to_string(),
            unordered: vec!["a".to_string(), "b".to_string()],
        };
        assert!(err.suggestion().unwrap().contains("--allow-cycles"));

        let err = ModexError::Serialize {
            message: "x".to_string(),
        };
        assert!(err.suggestion().is_none());
    }
}
