//! Error message formatting with actionable suggestions.

use super::colors::ColorSupport;
use modex_core::error::ModexError;
use std::error::Error;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self::with_colors(ColorSupport::detect())
    }

    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// The error, a `help:` line when a fix is known, then every cause
    pub fn format_error(&self, error: &ModexError) -> String {
        let mut output = format!("{}: {}\n", self.colors.red("error"), error);

        if let ModexError::CircularDependency { unordered, .. } = error {
            output.push_str(&format!(
                "{}: left unordered: {}\n",
                self.colors.dim("note"),
                unordered.join(", ")
            ));
        }

        if let Some(suggestion) = error.suggestion() {
            output.push_str(&format!("\n{}: {}\n", self.colors.dim("help"), suggestion));
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push_str(&format!("\n{}: {}", self.colors.dim("caused by"), err));
            source = err.source();
        }

        output
    }

    /// Errors from outside the library crates
    pub fn format_simple(&self, message: &str) -> String {
        format!("{}: {}", self.colors.red("error"), message)
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> ErrorFormatter {
        ErrorFormatter::with_colors(ColorSupport::disabled())
    }

    #[test]
    fn test_format_with_suggestion() {
        let error = ModexError::ModListRead {
            path: "/game/mods/mod-list.json".to_string(),
            message: "No such file or directory".to_string(),
        };

        let text = plain().format_error(&error);
        assert!(text.starts_with("error: Failed to read mod list /game/mods/mod-list.json"));
        assert!(text.contains("help: "));
    }

    #[test]
    fn test_format_cause_chain() {
        let error = ModexError::io(
            "Failed to write out.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only file system"),
        );

        let text = plain().format_error(&error);
        assert!(text.contains("caused by: read-only file system"));
    }

    #[test]
    fn test_format_cycle_lists_unordered() {
        let error = ModexError::CircularDependency {
            cycle: "a -> b -> a".to_string(),
            unordered: vec!["a".to_string(), "b".to_string(), "lib".to_string()],
        };

        let text = plain().format_error(&error);
        assert!(text.contains("a -> b -> a"));
        assert!(text.contains("note: left unordered: a, b, lib"));
        assert!(text.contains("--allow-cycles"));
    }

    #[test]
    fn test_format_simple() {
        assert_eq!(plain().format_simple("boom"), "error: boom");
    }
}
