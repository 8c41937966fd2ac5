//! Version range specifiers.
//!
//! A [`VersionSpecifier`] is a partial version pattern plus a match mode. It
//! answers three questions: does a concrete version satisfy it
//! ([`VersionSpecifier::is_compatible`]), does every version another
//! specifier admits also satisfy it ([`VersionSpecifier::is_satisfied_by`]),
//! and is it a strictly wider requirement ([`VersionSpecifier::is_superset_of`]).
//!
//! # Grammar
//!
//! ```text
//! Any                                  every version, pre-releases included
//! *                                    every release
//! [^]major[.minor[.patch]][-pre][+build]
//! ```
//!
//! A leading `^` selects [`MatchBehavior::Compatible`] (caret) matching,
//! otherwise matching is exact. In the pre-release position, `*` accepts any
//! pre-release (`^1.2-*`).

use crate::version::{SemanticVersion, cmp_pre_release};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing or constructing a version specifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecifierParseError {
    /// Input was empty.
    #[error("empty version specifier")]
    Empty,
    /// A numeric component was not a number.
    #[error("invalid version number in '{0}'")]
    InvalidNumber(String),
    /// More than three numeric components.
    #[error("too many version components in '{0}'")]
    TooManyComponents(String),
    /// Pre-release or build metadata segment was empty.
    #[error("invalid suffix in '{0}'")]
    InvalidSuffix(String),
    /// A version level was set below an unset one (e.g. patch without minor).
    #[error("version specifier cannot skip a level")]
    SkippedLevel,
    /// Exact matching needs at least a major version to match against.
    #[error("exact specifier requires a major version")]
    ExactWithoutMajor,
    /// A pre-release or build suffix is meaningless without a major version
    /// and would be dropped by `Display`.
    #[error("pre-release or build metadata requires a major version")]
    SuffixWithoutMajor,
}

/// How a specifier's set fields are matched against a concrete version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchBehavior {
    /// Every set field must match exactly.
    Exact,
    /// Caret semantics: major must match, minor (if set) is a floor.
    Compatible,
}

/// A partial version pattern with a match mode.
///
/// Unset fields are wildcards. The level invariant holds by construction: a
/// set minor implies a set major, a set patch implies a set minor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionSpecifier {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre_release: Option<String>,
    build_metadata: Option<String>,
    behavior: MatchBehavior,
    any_prerelease: bool,
}

impl VersionSpecifier {
    /// The specifier that matches every version, pre-releases included.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            major: None,
            minor: None,
            patch: None,
            pre_release: None,
            build_metadata: None,
            behavior: MatchBehavior::Compatible,
            any_prerelease: true,
        }
    }

    /// Build a specifier from components, enforcing the level invariant.
    ///
    /// # Errors
    /// [`SpecifierParseError::SkippedLevel`] when a level is set below an
    /// unset one; [`SpecifierParseError::ExactWithoutMajor`] for an exact
    /// specifier with no major version;
    /// [`SpecifierParseError::SuffixWithoutMajor`] for a pre-release or
    /// build suffix with no major version.
    pub fn new(
        major: Option<u64>,
        minor: Option<u64>,
        patch: Option<u64>,
        pre_release: Option<String>,
        build_metadata: Option<String>,
        behavior: MatchBehavior,
    ) -> Result<Self, SpecifierParseError> {
        if (major.is_none() && minor.is_some()) || (minor.is_none() && patch.is_some()) {
            return Err(SpecifierParseError::SkippedLevel);
        }
        if major.is_none() && behavior == MatchBehavior::Exact {
            return Err(SpecifierParseError::ExactWithoutMajor);
        }
        if major.is_none() && (pre_release.is_some() || build_metadata.is_some()) {
            return Err(SpecifierParseError::SuffixWithoutMajor);
        }
        Ok(Self {
            major,
            minor,
            patch,
            pre_release,
            build_metadata,
            behavior,
            any_prerelease: false,
        })
    }

    /// Specifier matching exactly the given version.
    #[must_use]
    pub fn exact(version: &SemanticVersion) -> Self {
        Self {
            major: Some(version.major),
            minor: Some(version.minor),
            patch: Some(version.patch),
            pre_release: version.pre_release.clone(),
            build_metadata: None,
            behavior: MatchBehavior::Exact,
            any_prerelease: false,
        }
    }

    /// Caret specifier for the given version (`^major.minor.patch`).
    #[must_use]
    pub fn compatible(version: &SemanticVersion) -> Self {
        Self {
            major: Some(version.major),
            minor: Some(version.minor),
            patch: Some(version.patch),
            pre_release: version.pre_release.clone(),
            build_metadata: None,
            behavior: MatchBehavior::Compatible,
            any_prerelease: false,
        }
    }

    /// Accept any pre-release in addition to what already matches.
    #[must_use]
    pub const fn with_any_prerelease(mut self) -> Self {
        self.any_prerelease = true;
        self
    }

    /// Major version, if constrained.
    #[must_use]
    pub const fn major(&self) -> Option<u64> {
        self.major
    }

    /// Minor version, if constrained.
    #[must_use]
    pub const fn minor(&self) -> Option<u64> {
        self.minor
    }

    /// Patch version, if constrained.
    #[must_use]
    pub const fn patch(&self) -> Option<u64> {
        self.patch
    }

    /// Pre-release constraint, if any.
    #[must_use]
    pub fn pre_release(&self) -> Option<&str> {
        self.pre_release.as_deref()
    }

    /// Build metadata constraint, if any.
    #[must_use]
    pub fn build_metadata(&self) -> Option<&str> {
        self.build_metadata.as_deref()
    }

    /// Match mode.
    #[must_use]
    pub const fn behavior(&self) -> MatchBehavior {
        self.behavior
    }

    /// Whether any pre-release is acceptable.
    #[must_use]
    pub const fn any_prerelease(&self) -> bool {
        self.any_prerelease
    }

    /// Whether this specifier matches every version, pre-releases included.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        self.major.is_none()
            && self.pre_release.is_none()
            && matches!(self.behavior, MatchBehavior::Compatible)
            && self.any_prerelease
    }

    /// Test a concrete version (or the absence of one) against this
    /// specifier.
    ///
    /// `None` stands for "package not installed"; it is compatible only with
    /// a fully unconstrained compatible specifier, never with exact matching.
    #[must_use]
    pub fn is_compatible(&self, actual: Option<&SemanticVersion>) -> bool {
        let Some(actual) = actual else {
            return self.behavior == MatchBehavior::Compatible
                && self.major.is_none()
                && self.pre_release.is_none()
                && self.build_metadata.is_none();
        };

        match self.behavior {
            MatchBehavior::Exact => {
                if self.major.is_some_and(|major| actual.major != major)
                    || self.minor.is_some_and(|minor| actual.minor != minor)
                    || self.patch.is_some_and(|patch| actual.patch != patch)
                {
                    return false;
                }
                if !self.any_prerelease && self.pre_release != actual.pre_release {
                    return false;
                }
                match &self.build_metadata {
                    Some(build) if !build.is_empty() => {
                        actual.build_metadata.as_deref() == Some(build)
                    }
                    _ => true,
                }
            }
            MatchBehavior::Compatible => {
                if self.major.is_some_and(|major| actual.major != major) {
                    return false;
                }
                // Minor is a floor, not a target: newer minors stay compatible.
                if self.minor.is_some_and(|minor| actual.minor < minor) {
                    return false;
                }
                if !self.any_prerelease
                    && cmp_pre_release(self.pre_release.as_deref(), actual.pre_release.as_deref())
                        == Ordering::Greater
                {
                    return false;
                }
                true
            }
        }
    }

    /// Whether every version satisfying `other` also satisfies `self`.
    ///
    /// Used to merge two requirements on the same package: if this returns
    /// true, `other` is the tighter requirement and can stand for both.
    #[must_use]
    pub fn is_satisfied_by(&self, other: &VersionSpecifier) -> bool {
        if self.is_any() {
            return true;
        }

        match self.behavior {
            MatchBehavior::Exact => {
                // Only another exact specifier can pin fields tightly enough.
                if other.behavior != MatchBehavior::Exact {
                    return false;
                }
                let levels_pinned = [
                    (self.major, other.major),
                    (self.minor, other.minor),
                    (self.patch, other.patch),
                ]
                .iter()
                .all(|(ours, theirs)| match ours {
                    Some(value) => *theirs == Some(*value),
                    None => true,
                });
                if !levels_pinned {
                    return false;
                }
                if !self.any_prerelease
                    && (other.any_prerelease || other.pre_release != self.pre_release)
                {
                    return false;
                }
                match &self.build_metadata {
                    Some(build) if !build.is_empty() => {
                        other.build_metadata.as_deref() == Some(build)
                    }
                    _ => true,
                }
            }
            MatchBehavior::Compatible => {
                if let Some(major) = self.major {
                    if other.major != Some(major) {
                        return false;
                    }
                }
                if let Some(minor) = self.minor {
                    match other.minor {
                        Some(theirs) if theirs >= minor => {}
                        _ => return false,
                    }
                }
                if !self.any_prerelease {
                    if other.any_prerelease {
                        return false;
                    }
                    // The loosest version `other` admits carries its own
                    // pre-release; that one must still clear our floor.
                    if cmp_pre_release(self.pre_release.as_deref(), other.pre_release.as_deref())
                        == Ordering::Greater
                    {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Strict variant of [`is_satisfied_by`](Self::is_satisfied_by): the two
    /// specifiers must also be distinguishable.
    #[must_use]
    pub fn is_superset_of(&self, other: &VersionSpecifier) -> bool {
        self.is_satisfied_by(other) && self != other
    }

    /// Parse a specifier string. See the module docs for the grammar.
    ///
    /// # Errors
    /// Returns [`SpecifierParseError`] on malformed input.
    pub fn parse(input: &str) -> Result<Self, SpecifierParseError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(SpecifierParseError::Empty);
        }
        if s.eq_ignore_ascii_case("any") {
            return Ok(Self::any());
        }
        if s == "*" {
            // Every release, but not pre-releases.
            return Ok(Self {
                any_prerelease: false,
                ..Self::any()
            });
        }

        let (s, behavior) = match s.strip_prefix('^') {
            Some(rest) => (rest, MatchBehavior::Compatible),
            None => (s, MatchBehavior::Exact),
        };

        let (s, build_metadata) = match s.split_once('+') {
            Some((head, build)) => {
                if build.is_empty() {
                    return Err(SpecifierParseError::InvalidSuffix(input.to_string()));
                }
                (head, Some(build.to_string()))
            }
            None => (s, None),
        };

        let (numbers, pre_release, any_prerelease) = match s.split_once('-') {
            Some((head, "*")) => (head, None, true),
            Some((head, pre)) => {
                if pre.is_empty() {
                    return Err(SpecifierParseError::InvalidSuffix(input.to_string()));
                }
                (head, Some(pre.to_string()), false)
            }
            None => (s, None, false),
        };

        let mut parts = numbers.split('.');
        let major = parse_component(parts.next(), input)?;
        let minor = parse_component(parts.next(), input)?;
        let patch = parse_component(parts.next(), input)?;
        if parts.next().is_some() {
            return Err(SpecifierParseError::TooManyComponents(input.to_string()));
        }

        let mut spec = Self::new(major, minor, patch, pre_release, build_metadata, behavior)?;
        spec.any_prerelease = any_prerelease;
        Ok(spec)
    }
}

fn parse_component(part: Option<&str>, input: &str) -> Result<Option<u64>, SpecifierParseError> {
    let Some(part) = part else {
        return Ok(None);
    };
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SpecifierParseError::InvalidNumber(input.to_string()));
    }
    part.parse()
        .map(Some)
        .map_err(|_| SpecifierParseError::InvalidNumber(input.to_string()))
}

impl FromStr for VersionSpecifier {
    type Err = SpecifierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Default for VersionSpecifier {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(major) = self.major else {
            return if self.any_prerelease {
                write!(f, "Any")
            } else {
                write!(f, "*")
            };
        };

        if self.behavior == MatchBehavior::Compatible {
            write!(f, "^")?;
        }
        write!(f, "{major}")?;
        if let Some(minor) = self.minor {
            write!(f, ".{minor}")?;
        }
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        if self.any_prerelease {
            write!(f, "-*")?;
        } else if let Some(pre) = &self.pre_release {
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
    use test_case::test_case;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).expect("test version should parse")
    }

    fn spec(s: &str) -> VersionSpecifier {
        VersionSpecifier::parse(s).expect("test specifier should parse")
    }

    #[test]
    fn any_matches_everything() {
        let any = VersionSpecifier::any();
        assert!(any.is_compatible(Some(&v("0.0.1"))));
        assert!(any.is_compatible(Some(&v("99.0.0-alpha"))));
        assert!(any.is_compatible(None));
    }

    #[test_case("1.2.3", "1.2.3", true; "exact full match")]
    #[test_case("1.2.3", "1.2.4", false; "exact patch mismatch")]
    #[test_case("1.2", "1.2.9", true; "exact unset patch is wildcard")]
    #[test_case("1", "1.9.9", true; "exact major only")]
    #[test_case("1.2.3", "1.2.3-beta", false; "exact rejects pre release")]
    #[test_case("1.2.3-beta", "1.2.3-beta", true; "exact pre release match")]
    #[test_case("^1.2", "1.5.0", true; "compatible newer minor ok")]
    #[test_case("^1.2", "1.1.0", false; "compatible minor below floor")]
    #[test_case("^1.2", "2.0.0", false; "compatible major mismatch")]
    #[test_case("^1.2.9", "1.2.0", true; "compatible patch not checked")]
    #[test_case("^1.0", "1.5.0-rc.1", false; "compatible rejects pre release by default")]
    #[test_case("^1.0-*", "1.5.0-rc.1", true; "any prerelease wildcard")]
    #[test_case("^1.0-beta", "1.0.0-rc.1", true; "pre release floor satisfied")]
    #[test_case("^1.0-rc", "1.0.0-beta", false; "pre release below floor")]
    #[test_case("^1.0-beta", "1.0.0", true; "release satisfies pre release floor")]
    #[test_case("*", "3.1.4", true; "star matches any release")]
    #[test_case("*", "3.1.4-beta", false; "star rejects pre release")]
    fn compatibility(spec_str: &str, version: &str, expected: bool) {
        assert_eq!(spec(spec_str).is_compatible(Some(&v(version))), expected);
    }

    #[test]
    fn missing_version_compatibility() {
        assert!(VersionSpecifier::any().is_compatible(None));
        assert!(spec("*").is_compatible(None));
        assert!(!spec("1.2.3").is_compatible(None));
        assert!(!spec("^1.2").is_compatible(None));
    }

    #[test]
    fn compatible_minor_is_a_floor_not_a_target() {
        let requirement = spec("^2.1");
        assert!(requirement.is_compatible(Some(&v("2.1.0"))));
        assert!(requirement.is_compatible(Some(&v("2.7.3"))));
        assert!(!requirement.is_compatible(Some(&v("2.0.9"))));
    }

    #[test_case("^1.0", "^1.2", true; "tighter minor floor satisfies")]
    #[test_case("^1.2", "^1.0", false; "looser minor floor does not")]
    #[test_case("^1.0", "1.4.2", true; "exact pin satisfies caret")]
    #[test_case("^1.0", "^2.0", false; "different major")]
    #[test_case("1.2", "1.2.3", true; "exact pin satisfies looser exact")]
    #[test_case("1.2.3", "1.2", false; "looser exact does not pin patch")]
    #[test_case("^1.0", "^1.0-*", false; "prerelease wildcard widens")]
    fn satisfaction(ours: &str, theirs: &str, expected: bool) {
        assert_eq!(spec(ours).is_satisfied_by(&spec(theirs)), expected);
    }

    #[test]
    fn superset_requires_distinguishable_specs() {
        assert!(spec("^1.0").is_superset_of(&spec("^1.2")));
        assert!(!spec("^1.2").is_superset_of(&spec("^1.2")));
        assert!(VersionSpecifier::any().is_superset_of(&spec("1.0.0")));
    }

    #[test]
    fn round_trip_preserves_compatibility() {
        let samples = [
            "0.0.1", "1.0.0", "1.2.0", "1.2.3", "1.5.0", "2.0.0", "1.2.3-beta", "1.5.0-rc.1",
            "2.0.0-alpha",
        ];
        for raw in ["Any", "*", "1", "1.2", "1.2.3", "^1", "^1.2", "^1.2.3", "^1.2-*",
            "1.2.3-beta", "^1.0-beta", "1.2.3+build"]
        {
            let original = spec(raw);
            let reparsed = spec(&original.to_string());
            for sample in samples {
                let version = v(sample);
                assert_eq!(
                    original.is_compatible(Some(&version)),
                    reparsed.is_compatible(Some(&version)),
                    "behavior diverged for {raw} on {sample}",
                );
            }
        }
    }

    #[test]
    fn level_invariant_enforced() {
        assert_eq!(
            VersionSpecifier::new(
                None,
                Some(2),
                None,
                None,
                None,
                MatchBehavior::Compatible
            )
            .unwrap_err(),
            SpecifierParseError::SkippedLevel
        );
    }

    #[test]
    fn suffix_without_major_rejected() {
        assert_eq!(
            VersionSpecifier::new(
                None,
                None,
                None,
                Some("rc1".into()),
                None,
                MatchBehavior::Compatible
            )
            .unwrap_err(),
            SpecifierParseError::SuffixWithoutMajor
        );
        assert_eq!(
            VersionSpecifier::new(
                None,
                None,
                None,
                None,
                Some("build.7".into()),
                MatchBehavior::Compatible
            )
            .unwrap_err(),
            SpecifierParseError::SuffixWithoutMajor
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        for input in ["", "^", "1.2.3.4", "a.b.c", "1.2.3-", "^1.2+"] {
            assert!(VersionSpecifier::parse(input).is_err(), "{input}");
        }
    }

    #[test]
    fn compatible_monotonicity_across_minor_and_patch() {
        let requirement = spec("^3.1");
        let mut previous = v("3.1.0");
        for next in ["3.1.5", "3.2.0", "3.9.9"] {
            let next = v(next);
            assert!(next > previous);
            assert!(requirement.is_compatible(Some(&next)));
            previous = next;
        }
        // Not across a major boundary.
        assert!(!requirement.is_compatible(Some(&v("4.0.0"))));
    }
}
