//! In-memory repository.

use crate::repository::{RepoFuture, Repository};
use crate::types::PackageVersion;
use ahash::AHashMap;
use pallet_core::{
    PackageDef, PackageIdentifier, PackageSpecifier, SemanticVersion, VersionSpecifier, os_matches,
};
use parking_lot::RwLock;

/// A repository backed by an in-memory table.
///
/// Used by tests and by callers embedding a fixed catalog. Thread-safe;
/// queries observe a consistent snapshot taken under the read lock.
#[derive(Debug)]
pub struct MemoryRepository {
    name: String,
    packages: RwLock<AHashMap<String, Vec<PackageDef>>>,
}

impl MemoryRepository {
    /// Create an empty repository with a display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            packages: RwLock::new(AHashMap::new()),
        }
    }

    /// Add a package definition.
    pub fn add_package(&self, def: PackageDef) {
        self.packages
            .write()
            .entry(def.name.clone())
            .or_default()
            .push(def);
    }

    /// Convenience for building catalogs from literals:
    /// `repo.add_version("app", "1.2.0", &[("base", "^1.0")])`.
    ///
    /// # Panics
    /// On malformed version or specifier literals.
    pub fn add_version(&self, name: &str, version: &str, dependencies: &[(&str, &str)]) {
        let version = SemanticVersion::parse(version).expect("valid version literal");
        let mut def = PackageDef::new(name, version);
        for (dep_name, dep_spec) in dependencies {
            let spec = VersionSpecifier::parse(dep_spec).expect("valid specifier literal");
            def = def.with_dependency(*dep_name, spec);
        }
        self.add_package(def);
    }

    /// Number of distinct package names.
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.packages.read().len()
    }

    fn platform_fits(def: &PackageDef, compatible_with: &[PackageIdentifier]) -> bool {
        compatible_with.iter().all(|id| {
            def.architecture.is_compatible_with(id.architecture)
                && (id.os.is_empty() || os_matches(&def.os, &id.os))
        })
    }
}

impl Repository for MemoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_packages<'a>(
        &'a self,
        query: &'a PackageSpecifier,
        compatible_with: &'a [PackageIdentifier],
    ) -> RepoFuture<'a, Vec<PackageDef>> {
        Box::pin(async move {
            let packages = self.packages.read();
            let candidates: Vec<PackageDef> = match &query.name {
                Some(name) => packages.get(name).cloned().unwrap_or_default(),
                None => packages.values().flatten().cloned().collect(),
            };
            Ok(candidates
                .into_iter()
                .filter(|def| query.matches(def) && Self::platform_fits(def, compatible_with))
                .collect())
        })
    }

    fn get_package_versions<'a>(
        &'a self,
        name: &'a str,
        compatible_with: &'a [PackageIdentifier],
    ) -> RepoFuture<'a, Vec<PackageVersion>> {
        Box::pin(async move {
            let packages = self.packages.read();
            let rows = packages
                .get(name)
                .into_iter()
                .flatten()
                .filter(|def| Self::platform_fits(def, compatible_with))
                .filter_map(|def| {
                    def.version.clone().map(|version| PackageVersion {
                        name: def.name.clone(),
                        version,
                        architecture: def.architecture,
                        os: def.os.clone(),
                    })
                })
                .collect();
            Ok(rows)
        })
    }

    fn get_package_names<'a>(
        &'a self,
        compatible_with: &'a [PackageIdentifier],
    ) -> RepoFuture<'a, Vec<String>> {
        Box::pin(async move {
            let packages = self.packages.read();
            let mut names: Vec<String> = packages
                .iter()
                .filter(|(_, defs)| {
                    defs.iter()
                        .any(|def| Self::platform_fits(def, compatible_with))
                })
                .map(|(name, _)| name.clone())
                .collect();
            names.sort_unstable();
            Ok(names)
        })
    }
}
