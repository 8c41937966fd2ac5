//! Dependency issues reported by the analyzer and the incremental resolver.
//!
//! Issues are data, not errors: an inconsistent package set is a valid
//! analysis result, and callers decide what to do with it. Only
//! infrastructure problems (repository failures, resource limits) surface
//! as `Err`.

use pallet_core::{SemanticVersion, VersionSpecifier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a dependency edge is unsatisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// The required package is not present at all.
    Missing,
    /// The package is present but its version does not satisfy the
    /// requirement.
    IncompatibleVersion,
    /// The package is present but one of its own dependencies is broken,
    /// so it cannot be considered usable.
    DependencyMissing,
    /// Two co-resolved requirements on the same package exclude each other.
    VersionConflict,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Missing => "missing",
            Self::IncompatibleVersion => "incompatible version",
            Self::DependencyMissing => "broken dependency",
            Self::VersionConflict => "version conflict",
        };
        f.write_str(text)
    }
}

/// A single unsatisfied dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyIssue {
    /// Name of the package the edge points at.
    pub package_name: String,
    /// What the dependent asked for.
    pub expected: VersionSpecifier,
    /// The version actually present, if any.
    pub loaded: Option<SemanticVersion>,
    /// Classification of the failure.
    pub kind: IssueKind,
}

impl DependencyIssue {
    /// Issue for a package that is absent from the set.
    #[must_use]
    pub fn missing(package_name: impl Into<String>, expected: VersionSpecifier) -> Self {
        Self {
            package_name: package_name.into(),
            expected,
            loaded: None,
            kind: IssueKind::Missing,
        }
    }

    /// Issue for a package whose present version fails the requirement.
    #[must_use]
    pub fn incompatible(
        package_name: impl Into<String>,
        expected: VersionSpecifier,
        loaded: Option<SemanticVersion>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            expected,
            loaded,
            kind: IssueKind::IncompatibleVersion,
        }
    }
}

impl fmt::Display for DependencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: requires {} ", self.package_name, self.expected)?;
        match &self.loaded {
            Some(version) => write!(f, "but {version} is present")?,
            None => f.write_str("but nothing is present")?,
        }
        write!(f, " ({})", self.kind)
    }
}
