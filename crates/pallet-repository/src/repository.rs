//! The repository collaborator contract.

use crate::error::Result;
use crate::types::PackageVersion;
use pallet_core::{PackageDef, PackageIdentifier, PackageSpecifier};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by [`Repository`] methods.
pub type RepoFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A source of package definitions: a local directory scan, a remote
/// catalog, or an in-memory table.
///
/// Implementations answer three queries. `compatible_with` carries the
/// identities of already-chosen packages so a repository can pre-filter to
/// builds whose architecture and OS fit alongside them; an empty slice means
/// no platform restriction.
///
/// The trait is object-safe; resolvers hold `Arc<dyn Repository>` lists
/// whose order is the priority order (index 0 wins version ties).
pub trait Repository: Send + Sync {
    /// Display name used in diagnostics (a URL or directory path).
    fn name(&self) -> &str;

    /// All package definitions matching a query.
    fn get_packages<'a>(
        &'a self,
        query: &'a PackageSpecifier,
        compatible_with: &'a [PackageIdentifier],
    ) -> RepoFuture<'a, Vec<PackageDef>>;

    /// All known versions of a named package.
    fn get_package_versions<'a>(
        &'a self,
        name: &'a str,
        compatible_with: &'a [PackageIdentifier],
    ) -> RepoFuture<'a, Vec<PackageVersion>>;

    /// All package names this repository can provide.
    fn get_package_names<'a>(
        &'a self,
        compatible_with: &'a [PackageIdentifier],
    ) -> RepoFuture<'a, Vec<String>>;
}

impl<T: Repository + ?Sized> Repository for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get_packages<'a>(
        &'a self,
        query: &'a PackageSpecifier,
        compatible_with: &'a [PackageIdentifier],
    ) -> RepoFuture<'a, Vec<PackageDef>> {
        (**self).get_packages(query, compatible_with)
    }

    fn get_package_versions<'a>(
        &'a self,
        name: &'a str,
        compatible_with: &'a [PackageIdentifier],
    ) -> RepoFuture<'a, Vec<PackageVersion>> {
        (**self).get_package_versions(name, compatible_with)
    }

    fn get_package_names<'a>(
        &'a self,
        compatible_with: &'a [PackageIdentifier],
    ) -> RepoFuture<'a, Vec<String>> {
        (**self).get_package_names(compatible_with)
    }
}
