//! Dotted mod versions.
//!
//! Mod manifests use plain dot-separated integers (conventionally four
//! components, `0.16.51.0`). Comparison is positional and truncated to the
//! length of the version being tested against, so `Version` deliberately does
//! not implement `Ord`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Dot-separated version (`major.minor.patch.build`, any length >= 1)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    components: Vec<u64>,
}

/// Version parsing and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version format: '{input}'")]
    InvalidFormat { input: String },

    #[error("Invalid number in version: '{component}'")]
    InvalidNumber { component: String },
}

impl Version {
    /// Create a version from its components
    pub fn new(components: Vec<u64>) -> Result<Self, VersionError> {
        if components.is_empty() {
            return Err(VersionError::InvalidFormat {
                input: String::new(),
            });
        }
        Ok(Self { components })
    }

    /// The individual numeric components
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Check whether this version is greater than `test`.
    ///
    /// Only the first `test.components().len()` positions are compared. The
    /// first position where both versions have a component and those differ
    /// decides; a position missing from `self` neither wins nor loses. If no
    /// position decides, the result is `false`, which also covers equality.
    ///
    /// This makes the relation asymmetric for versions of unequal length:
    /// `1.2` and `1.2.5` are each "not greater" than the other.
    pub fn is_greater(&self, test: &Version) -> bool {
        for (index, expected) in test.components.iter().enumerate() {
            match self.components.get(index) {
                Some(actual) if actual > expected => return true,
                Some(actual) if actual < expected => return false,
                _ => continue,
            }
        }
        false
    }
}

impl Default for Version {
    /// `0.0.0.0`, used when a manifest or dependency omits its version
    fn default() -> Self {
        Self {
            components: vec![0, 0, 0, 0],
        }
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(VersionError::InvalidFormat {
                input: s.to_string(),
            });
        }

        let components = input
            .split('.')
            .map(|part| {
                part.trim()
                    .parse::<u64>()
                    .map_err(|_| VersionError::InvalidNumber {
                        component: part.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { components })
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = self.components.iter();
        if let Some(first) = parts.next() {
            write!(f, "{}", first)?;
        }
        for part in parts {
            write!(f, ".{}", part)?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn version_never_greater_than_itself(
            components in prop::collection::vec(0u64..10_000, 1..6)
        ) {
            let version = Version::new(components).unwrap();
            prop_assert!(!version.is_greater(&version));
        }
    }

    proptest! {
        #[test]
        fn version_display_round_trip(
            components in prop::collection::vec(0u64..10_000, 1..6)
        ) {
            let original = Version::new(components).unwrap();
            let parsed = Version::from_str(&original.to_string()).unwrap();
            prop_assert_eq!(parsed, original);
        }
    }

    proptest! {
        #[test]
        fn same_length_versions_order_like_tuples(
            a in prop::collection::vec(0u64..50, 4),
            b in prop::collection::vec(0u64..50, 4)
        ) {
            let left = Version::new(a.clone()).unwrap();
            let right = Version::new(b.clone()).unwrap();
            prop_assert_eq!(left.is_greater(&right), a > b);
        }
    }
}
