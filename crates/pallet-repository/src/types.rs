//! Repository row types.

use pallet_core::{CpuArchitecture, PackageIdentifier, SemanticVersion};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A concrete version of a package as listed by a repository.
///
/// This is the lightweight answer to "which versions exist" — identity
/// fields only, no dependency edges. Fetching the full [`pallet_core::PackageDef`]
/// is a separate, heavier query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersion {
    /// Package name.
    pub name: String,
    /// Concrete version.
    pub version: SemanticVersion,
    /// Target CPU architecture of this build.
    pub architecture: CpuArchitecture,
    /// Target OS names, comma-separated; empty accepts every OS.
    pub os: String,
}

impl PackageVersion {
    /// The structural identity of this row.
    #[must_use]
    pub fn identifier(&self) -> PackageIdentifier {
        PackageIdentifier {
            name: self.name.clone(),
            version: Some(self.version.clone()),
            architecture: self.architecture,
            os: self.os.clone(),
        }
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
