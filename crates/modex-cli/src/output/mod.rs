//! Terminal output formatting.
//!
//! Status lines go to stdout, errors to stderr. Logging has its own writer
//! (stderr) and is configured in `main`.

pub mod colors;
pub mod errors;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
}

impl OutputHandler {
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
        }
    }

    /// Print a secondary, dimmed line
    pub fn info(&self, message: &str) {
        println!("{}", self.colors.dim(message));
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", self.colors.green("✓"), message);
    }

    pub fn warn(&self, message: &str) {
        println!("{} {}", self.colors.yellow("⚠"), message);
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
