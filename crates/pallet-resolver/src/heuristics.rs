//! Scoring heuristics that order the solver's search.
//!
//! Scores are doubled so the half-point for "not `Any`" stays in integer
//! arithmetic.

use pallet_core::{MatchBehavior, SemanticVersion, VersionSpecifier};

/// Specificity of a specifier. Higher means more constrained.
///
/// The solver resolves the most constrained requirement first, so broad
/// requirements keep their freedom until the pinned ones have pruned the
/// search space. The incremental resolver uses the same score to decide
/// which of two duplicate top-level requests to keep.
#[must_use]
pub fn specificity(spec: &VersionSpecifier) -> u32 {
    if spec.is_any() {
        return 0;
    }
    let mut score = 1;
    if spec.behavior() == MatchBehavior::Exact {
        score += 2;
    }
    if spec.major().is_some() {
        score += 2;
    }
    if spec.minor().is_some() {
        score += 2;
    }
    if spec.patch().is_some() {
        score += 2;
    }
    score
}

/// Fitness of a candidate version against a requirement. Higher is tried
/// first.
///
/// Rewards landing exactly on the requested minor and patch. Compatibility
/// itself is decided elsewhere; this only orders candidates that already
/// passed.
#[must_use]
pub fn fitness(version: &SemanticVersion, requirement: &VersionSpecifier) -> u32 {
    let mut score = 1;
    if requirement.minor() == Some(version.minor) {
        score += 1;
    }
    if requirement.patch() == Some(version.patch) {
        score += 1;
    }
    score
}

/// Of two specifiers on the same name, the one to keep when folding
/// duplicates. Ties keep the first argument.
#[must_use]
pub fn more_specific<'a>(
    a: &'a VersionSpecifier,
    b: &'a VersionSpecifier,
) -> &'a VersionSpecifier {
    if specificity(b) > specificity(a) { b } else { a }
}
