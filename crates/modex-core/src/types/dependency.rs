//! Dependency specification types.
//!
//! Manifests list dependencies as short strings such as `"base >= 0.16"`,
//! `"? bobplates"` or `"! incompatible-mod"`.

use super::version::{Version, VersionError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Dependency specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub constraint: Constraint,
    pub version: Version,
    pub kind: DependencyKind,
}

/// Version comparator attached to a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// `name = version`
    Equal,
    /// `name > version`
    GreaterThan,
    /// `name >= version`
    GreaterThanOrEqual,
    /// No comparator; any version of `name` will do
    None,
}

/// Type of dependency, taken from the string prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// No prefix
    Required,
    /// `?` prefix
    Optional,
    /// `(?)` prefix, optional and hidden in the game's mod list
    HiddenOptional,
    /// `!` prefix, the two packages cannot be loaded together
    Incompatible,
    /// `~` prefix, required but without affecting load order
    NoLoadOrder,
}

/// Dependency string parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("Dependency '{input}' has no package name")]
    MissingName { input: String },

    #[error("Unsupported comparator '{comparator}' in dependency '{input}'")]
    UnsupportedComparator { input: String, comparator: String },

    #[error("Invalid version in dependency '{input}': {source}")]
    InvalidVersion {
        input: String,
        #[source]
        source: VersionError,
    },
}

impl Dependency {
    /// Create a required dependency on any version of `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: Constraint::None,
            version: Version::default(),
            kind: DependencyKind::Required,
        }
    }

    /// Constrain the accepted versions
    pub fn with_constraint(mut self, constraint: Constraint, version: Version) -> Self {
        self.constraint = constraint;
        self.version = version;
        self
    }

    /// Make this dependency optional
    pub fn optional(mut self) -> Self {
        self.kind = DependencyKind::Optional;
        self
    }

    /// Whether the dependency was marked optional (`?` or `(?)`)
    pub fn is_optional(&self) -> bool {
        self.kind.is_optional()
    }
}

impl DependencyKind {
    /// Check if this dependency may be missing
    pub fn is_optional(&self) -> bool {
        matches!(self, DependencyKind::Optional | DependencyKind::HiddenOptional)
    }

    /// Check if this dependency forces the target to load first
    pub fn affects_load_order(&self) -> bool {
        matches!(
            self,
            DependencyKind::Required | DependencyKind::Optional | DependencyKind::HiddenOptional
        )
    }

    fn prefix(&self) -> &'static str {
        match self {
            DependencyKind::Required => "",
            DependencyKind::Optional => "? ",
            DependencyKind::HiddenOptional => "(?) ",
            DependencyKind::Incompatible => "! ",
            DependencyKind::NoLoadOrder => "~ ",
        }
    }
}

impl Constraint {
    fn symbol(&self) -> Option<&'static str> {
        match self {
            Constraint::Equal => Some("="),
            Constraint::GreaterThan => Some(">"),
            Constraint::GreaterThanOrEqual => Some(">="),
            Constraint::None => None,
        }
    }
}

impl FromStr for Dependency {
    type Err = DependencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        // "(?)" must be checked before "?"
        let (kind, rest) = if let Some(stripped) = input.strip_prefix("(?)") {
            (DependencyKind::HiddenOptional, stripped)
        } else if let Some(stripped) = input.strip_prefix('?') {
            (DependencyKind::Optional, stripped)
        } else if let Some(stripped) = input.strip_prefix('!') {
            (DependencyKind::Incompatible, stripped)
        } else if let Some(stripped) = input.strip_prefix('~') {
            (DependencyKind::NoLoadOrder, stripped)
        } else {
            (DependencyKind::Required, input)
        };

        let (name, comparator, version) = match rest.find(['<', '>', '=']) {
            Some(start) => {
                let tail = &rest[start..];
                let end = tail
                    .find(|c: char| !matches!(c, '<' | '>' | '='))
                    .unwrap_or(tail.len());
                (&rest[..start], Some(&tail[..end]), tail[end..].trim())
            }
            None => (rest, None, ""),
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(DependencyError::MissingName {
                input: s.to_string(),
            });
        }

        let constraint = match comparator {
            None => Constraint::None,
            Some("=") => Constraint::Equal,
            Some(">") => Constraint::GreaterThan,
            Some(">=") => Constraint::GreaterThanOrEqual,
            Some(other) => {
                return Err(DependencyError::UnsupportedComparator {
                    input: s.to_string(),
                    comparator: other.to_string(),
                })
            }
        };

        let version = if version.is_empty() {
            Version::default()
        } else {
            version
                .parse()
                .map_err(|source| DependencyError::InvalidVersion {
                    input: s.to_string(),
                    source,
                })?
        };

        Ok(Dependency {
            name: name.to_string(),
            constraint,
            version,
            kind,
        })
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.name)?;
        if let Some(symbol) = self.constraint.symbol() {
            write!(f, " {} {}", symbol, self.version)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Dependency {
        s.parse().unwrap()
    }

    #[test]
    fn test_dependency_creation() {
        let dep = Dependency::new("base");
        assert_eq!(dep.name, "base");
        assert_eq!(dep.constraint, Constraint::None);
        assert_eq!(dep.version, Version::default());
        assert_eq!(dep.kind, DependencyKind::Required);
        assert!(!dep.is_optional());
        assert!(Dependency::new("base").optional().is_optional());
    }

    #[test]
    fn test_parse_name_only() {
        let dep = parse("one");
        assert_eq!(dep.name, "one");
        assert_eq!(dep.constraint, Constraint::None);
        assert_eq!(dep.version.to_string(), "0.0.0.0");
    }

    #[test]
    fn test_parse_comparators() {
        let dep = parse("base > 0.0.0.0");
        assert_eq!(dep.name, "base");
        assert_eq!(dep.constraint, Constraint::GreaterThan);

        let dep = parse("core = 0.1.2.3");
        assert_eq!(dep.constraint, Constraint::Equal);
        assert_eq!(dep.version.to_string(), "0.1.2.3");

        let dep = parse("base >= 0.16");
        assert_eq!(dep.constraint, Constraint::GreaterThanOrEqual);
        assert_eq!(dep.version.to_string(), "0.16");

        let dep = parse("base>=0.16.1");
        assert_eq!(dep.name, "base");
        assert_eq!(dep.constraint, Constraint::GreaterThanOrEqual);
    }

    #[test]
    fn test_parse_comparator_without_version() {
        let dep = parse("base >");
        assert_eq!(dep.constraint, Constraint::GreaterThan);
        assert_eq!(dep.version, Version::default());
    }

    #[test]
    fn test_parse_prefixes() {
        assert_eq!(parse("? one > 0.0.0.0").kind, DependencyKind::Optional);
        assert_eq!(parse("?one").name, "one");
        assert_eq!(parse("(?) one").kind, DependencyKind::HiddenOptional);
        assert_eq!(parse("! other").kind, DependencyKind::Incompatible);
        assert_eq!(parse("~ lib >= 1.0").kind, DependencyKind::NoLoadOrder);

        assert!(parse("? one").is_optional());
        assert!(parse("(?) one").is_optional());
        assert!(!parse("! one").is_optional());
    }

    #[test]
    fn test_load_order_kinds() {
        assert!(DependencyKind::Required.affects_load_order());
        assert!(DependencyKind::Optional.affects_load_order());
        assert!(DependencyKind::HiddenOptional.affects_load_order());
        assert!(!DependencyKind::Incompatible.affects_load_order());
        assert!(!DependencyKind::NoLoadOrder.affects_load_order());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Dependency::from_str("?"),
            Err(DependencyError::MissingName { .. })
        ));
        assert!(matches!(
            Dependency::from_str("base < 0.17"),
            Err(DependencyError::UnsupportedComparator { .. })
        ));
        assert!(matches!(
            Dependency::from_str("base == 0.17"),
            Err(DependencyError::UnsupportedComparator { .. })
        ));
        assert!(matches!(
            Dependency::from_str("base >= zero"),
            Err(DependencyError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(parse("? one>0.1").to_string(), "? one > 0.1");
        assert_eq!(parse("base").to_string(), "base");
        assert_eq!(parse("(?) x = 1.0.0").to_string(), "(?) x = 1.0.0");
    }
}
