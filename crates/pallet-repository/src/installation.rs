//! Snapshot of an installed package set.

use ahash::AHashMap;
use pallet_core::{PackageDef, PackageIdentifier};

/// The set of packages currently installed, captured once per resolution.
///
/// Resolvers never mutate this; it is the "already decided" side of the
/// question. Whoever performs actual install/uninstall I/O rebuilds the
/// snapshot afterwards.
#[derive(Debug, Clone, Default)]
pub struct Installation {
    packages: Vec<PackageDef>,
}

impl Installation {
    /// Wrap a list of installed package definitions.
    #[must_use]
    pub fn new(packages: Vec<PackageDef>) -> Self {
        Self { packages }
    }

    /// All installed packages.
    #[must_use]
    pub fn packages(&self) -> &[PackageDef] {
        &self.packages
    }

    /// Look up an installed package by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&PackageDef> {
        self.packages.iter().find(|def| def.name == name)
    }

    /// Name-keyed view of the installed set.
    #[must_use]
    pub fn by_name(&self) -> AHashMap<&str, &PackageDef> {
        self.packages
            .iter()
            .map(|def| (def.name.as_str(), def))
            .collect()
    }

    /// Identities of all installed packages, for platform-compatibility
    /// filtering in repository queries.
    #[must_use]
    pub fn identifiers(&self) -> Vec<PackageIdentifier> {
        self.packages.iter().map(PackageDef::identifier).collect()
    }

    /// Whether nothing is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Number of installed packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }
}
