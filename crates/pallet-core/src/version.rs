//! Concrete semantic versions.
//!
//! [`SemanticVersion`] is the totally ordered version value used everywhere a
//! real, resolved version is meant. Range matching lives in
//! [`crate::specifier`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a version string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// Input was empty.
    #[error("empty version string")]
    Empty,
    /// A numeric component was missing or not a number.
    #[error("invalid version number in '{0}'")]
    InvalidNumber(String),
    /// Expected `major.minor.patch`, got fewer or more components.
    #[error("expected three version components in '{0}'")]
    WrongComponentCount(String),
    /// Pre-release or build metadata segment was empty or malformed.
    #[error("invalid suffix in '{0}'")]
    InvalidSuffix(String),
}

/// A concrete semantic version.
///
/// Ordering follows semver precedence: major, minor, patch, then pre-release,
/// where a release (no pre-release tag) sorts **above** any pre-release of the
/// same triple. Build metadata is ignored by both ordering and equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticVersion {
    /// Major version number.
    pub major: u64,
    /// Minor version number.
    pub minor: u64,
    /// Patch version number.
    pub patch: u64,
    /// Pre-release tag, e.g. `beta.1` in `1.2.0-beta.1`.
    pub pre_release: Option<String>,
    /// Build metadata, e.g. `abc123` in `1.2.0+abc123`. Carried but never
    /// compared.
    pub build_metadata: Option<String>,
}

/// Pre-release ordering: absence sorts above any value, values compare as
/// ordinal strings.
pub(crate) fn cmp_pre_release(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.cmp(y),
    }
}

impl SemanticVersion {
    /// Create a release version with no pre-release tag.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: None,
            build_metadata: None,
        }
    }

    /// Attach a pre-release tag.
    #[must_use]
    pub fn with_pre_release(mut self, pre: impl Into<String>) -> Self {
        self.pre_release = Some(pre.into());
        self
    }

    /// Attach build metadata.
    #[must_use]
    pub fn with_build_metadata(mut self, build: impl Into<String>) -> Self {
        self.build_metadata = Some(build.into());
        self
    }

    /// Whether this version carries a pre-release tag.
    #[must_use]
    pub fn is_pre_release(&self) -> bool {
        self.pre_release.is_some()
    }

    /// Parse a `major.minor.patch[-prerelease][+build]` string.
    ///
    /// # Errors
    /// Returns [`VersionParseError`] on malformed input. Use the [`FromStr`]
    /// impl when `?` propagation is wanted.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let (s, build_metadata) = match s.split_once('+') {
            Some((head, build)) => {
                if build.is_empty() {
                    return Err(VersionParseError::InvalidSuffix(input.to_string()));
                }
                (head, Some(build.to_string()))
            }
            None => (s, None),
        };

        let (numbers, pre_release) = match s.split_once('-') {
            Some((head, pre)) => {
                if pre.is_empty() {
                    return Err(VersionParseError::InvalidSuffix(input.to_string()));
                }
                (head, Some(pre.to_string()))
            }
            None => (s, None),
        };

        let mut parts = numbers.split('.');
        let major = parse_number(parts.next(), input)?;
        let minor = parse_number(parts.next(), input)?;
        let patch = parse_number(parts.next(), input)?;
        if parts.next().is_some() {
            return Err(VersionParseError::WrongComponentCount(input.to_string()));
        }

        Ok(Self {
            major,
            minor,
            patch,
            pre_release,
            build_metadata,
        })
    }
}

fn parse_number(part: Option<&str>, input: &str) -> Result<u64, VersionParseError> {
    let part = part.ok_or_else(|| VersionParseError::WrongComponentCount(input.to_string()))?;
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionParseError::InvalidNumber(input.to_string()));
    }
    part.parse()
        .map_err(|_| VersionParseError::InvalidNumber(input.to_string()))
}

impl FromStr for SemanticVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl std::hash::Hash for SemanticVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.pre_release.hash(state);
        // build metadata is excluded to stay consistent with Eq
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
            .then_with(|| self.patch.cmp(&other.patch))
            .then_with(|| {
                cmp_pre_release(self.pre_release.as_deref(), other.pre_release.as_deref())
            })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre_release {
            write!(f, "-{pre}")?;
        }
        if let Some(build) = &self.build_metadata {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).expect("test version should parse")
    }

    #[test_case("1.2.3", 1, 2, 3, None, None)]
    #[test_case("0.0.0", 0, 0, 0, None, None)]
    #[test_case("1.2.3-beta", 1, 2, 3, Some("beta"), None)]
    #[test_case("1.2.3-rc.1+build5", 1, 2, 3, Some("rc.1"), Some("build5"))]
    #[test_case("10.20.30+meta", 10, 20, 30, None, Some("meta"))]
    fn parse_valid(
        input: &str,
        major: u64,
        minor: u64,
        patch: u64,
        pre: Option<&str>,
        build: Option<&str>,
    ) {
        let parsed = v(input);
        assert_eq!(parsed.major, major);
        assert_eq!(parsed.minor, minor);
        assert_eq!(parsed.patch, patch);
        assert_eq!(parsed.pre_release.as_deref(), pre);
        assert_eq!(parsed.build_metadata.as_deref(), build);
    }

    #[test_case(""; "empty")]
    #[test_case("1.2"; "two components")]
    #[test_case("1.2.3.4"; "four components")]
    #[test_case("1.a.3"; "non numeric")]
    #[test_case("1.2.3-"; "empty pre release")]
    #[test_case("1.2.3+"; "empty build")]
    fn parse_invalid(input: &str) {
        assert!(SemanticVersion::parse(input).is_err());
    }

    #[test]
    fn release_sorts_above_pre_release() {
        assert!(v("1.2.0") > v("1.2.0-rc.1"));
        assert!(v("1.2.0-alpha") < v("1.2.0-beta"));
        assert!(v("1.2.0-rc.1") < v("1.2.1-alpha"));
    }

    #[test]
    fn build_metadata_ignored_by_comparison() {
        assert_eq!(v("1.2.3+abc"), v("1.2.3+def"));
        assert_eq!(v("1.2.3+abc").cmp(&v("1.2.3")), Ordering::Equal);
    }

    #[test]
    fn display_round_trips() {
        for s in ["1.2.3", "1.2.3-beta.2", "1.2.3-rc.1+build", "0.1.0+meta"] {
            assert_eq!(v(s).to_string(), s);
        }
    }

    fn arb_version() -> impl Strategy<Value = SemanticVersion> {
        (
            0u64..20,
            0u64..20,
            0u64..20,
            proptest::option::of("[a-z]{1,4}(\\.[0-9]{1,2})?"),
        )
            .prop_map(|(major, minor, patch, pre)| SemanticVersion {
                major,
                minor,
                patch,
                pre_release: pre,
                build_metadata: None,
            })
    }

    proptest! {
        #[test]
        fn ordering_is_antisymmetric(a in arb_version(), b in arb_version()) {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        }

        #[test]
        fn ordering_is_transitive(a in arb_version(), b in arb_version(), c in arb_version()) {
            let mut sorted = vec![a, b, c];
            sorted.sort();
            prop_assert!(sorted[0] <= sorted[1] && sorted[1] <= sorted[2]);
            prop_assert!(sorted[0] <= sorted[2]);
        }

        #[test]
        fn release_above_its_pre_releases(a in arb_version()) {
            let release = SemanticVersion::new(a.major, a.minor, a.patch);
            prop_assert!(release >= a);
        }

        #[test]
        fn parse_display_round_trip(a in arb_version()) {
            let reparsed = SemanticVersion::parse(&a.to_string()).unwrap();
            prop_assert_eq!(reparsed, a);
        }
    }
}
