//! Core types for the Pallet package manager.
//!
//! This crate holds the pure value logic everything else is built on:
//!
//! - [`version`]: [`SemanticVersion`], a totally ordered concrete version
//! - [`specifier`]: [`VersionSpecifier`], a version range with exact or
//!   caret (compatible) matching
//! - [`package`]: package identity ([`PackageIdentifier`]), queries
//!   ([`PackageSpecifier`]) and definitions ([`PackageDef`])
//!
//! No I/O happens here; the only failure mode is malformed input surfaced
//! through `FromStr`/`parse`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod package;
pub mod specifier;
pub mod version;

pub use error::{Error, Result};
pub use package::{
    CpuArchitecture, PackageDef, PackageDependency, PackageIdentifier, PackageSpecifier,
    os_matches,
};
pub use specifier::{MatchBehavior, SpecifierParseError, VersionSpecifier};
pub use version::{SemanticVersion, VersionParseError};
