//! Greedy incremental dependency resolution.
//!
//! Starting from a set of requested packages, the resolver walks dependency
//! edges outward, consulting the installation first and then the configured
//! repositories, and keeps one chosen package per name. A later, better or
//! required candidate replaces an earlier choice; replacement is a plain map
//! overwrite on the name. Problems are accumulated as diagnostics, never
//! raised: unknown requirements, version conflicts, and repository outages
//! all land in accessor lists and the caller decides what blocks an install.
//!
//! This resolver is best-effort by design. It never backtracks, so a
//! replacement can leave an earlier depender's requirement unchecked against
//! the new choice. [`TreeSolver`](crate::solver::TreeSolver) is the strict
//! alternative when a mutually consistent assignment must be guaranteed.

use crate::heuristics;
use crate::issue::{DependencyIssue, IssueKind};
use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;
use pallet_core::{PackageDef, PackageSpecifier, SemanticVersion, VersionSpecifier};
use pallet_repository::error::RepositoryError;
use pallet_repository::{Installation, Repository, query};
use smallvec::SmallVec;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// One resolved package and how it got chosen.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    /// The chosen definition.
    pub package: PackageDef,
    /// The requirement that selected it.
    pub requirement: VersionSpecifier,
    /// Names of the packages that asked for it. Empty for top-level
    /// requests. Most packages have one or two dependers.
    pub requested_by: SmallVec<[String; 2]>,
    /// Whether the choice came from the installation rather than a
    /// repository.
    pub installed: bool,
}

/// Best-effort resolver state. Build it with [`DependencyResolver::resolve`]
/// and read the results through the accessors.
#[derive(Debug, Default)]
pub struct DependencyResolver {
    entries: IndexMap<String, ResolvedEntry>,
    unknown: Vec<PackageSpecifier>,
    issues: Vec<DependencyIssue>,
    repository_failures: Vec<(String, RepositoryError)>,
    cancelled: bool,
}

impl DependencyResolver {
    /// Resolve the requested specifiers against an installation and an
    /// ordered repository list. Lower repository index means higher
    /// priority when several repositories carry the same best version.
    ///
    /// Cancellation stops the walk and returns whatever was resolved so
    /// far.
    pub async fn resolve(
        installation: &Installation,
        requests: &[PackageSpecifier],
        repositories: &[Arc<dyn Repository>],
        cancel: &CancellationToken,
    ) -> Self {
        let mut resolver = Self::default();
        let installed: AHashMap<&str, &PackageDef> = installation.by_name();

        // Fold duplicate top-level requests before any lookups, keeping the
        // most specific requirement per name and flagging contradictions.
        let mut queue: Vec<(PackageSpecifier, Option<String>)> = Vec::new();
        let mut by_name: IndexMap<String, PackageSpecifier> = IndexMap::new();
        for request in requests {
            let Some(name) = request.name.clone() else {
                resolver.unknown.push(request.clone());
                continue;
            };
            match by_name.get_mut(&name) {
                None => {
                    by_name.insert(name, request.clone());
                }
                Some(existing) => {
                    let a = &existing.version;
                    let b = &request.version;
                    if !a.is_satisfied_by(b) && !b.is_satisfied_by(a) {
                        resolver.issues.push(DependencyIssue {
                            package_name: name,
                            expected: a.clone(),
                            loaded: None,
                            kind: IssueKind::VersionConflict,
                        });
                    }
                    if heuristics::more_specific(a, b) == b {
                        existing.version = b.clone();
                    }
                }
            }
        }
        queue.extend(by_name.into_values().map(|spec| (spec, None)));
        queue.reverse();

        // Versions already chosen per name. Re-choosing a displaced version
        // would cycle forever, so that is cut off as a conflict.
        let mut history: AHashMap<String, AHashSet<Option<SemanticVersion>>> = AHashMap::new();

        while let Some((request, requested_by)) = queue.pop() {
            if cancel.is_cancelled() {
                resolver.cancelled = true;
                break;
            }
            resolver
                .step(
                    &request,
                    requested_by,
                    &installed,
                    repositories,
                    &mut history,
                    cancel,
                )
                .await
                .into_iter()
                .for_each(|work| queue.push(work));
        }
        debug!(
            resolved = resolver.entries.len(),
            unknown = resolver.unknown.len(),
            issues = resolver.issues.len(),
            "incremental resolution finished"
        );
        resolver
    }

    /// Convenience entry point for already-concrete definitions: each is
    /// requested by name at exactly its own version.
    pub async fn resolve_defs(
        installation: &Installation,
        requested: &[PackageDef],
        repositories: &[Arc<dyn Repository>],
        cancel: &CancellationToken,
    ) -> Self {
        let requests: Vec<PackageSpecifier> = requested
            .iter()
            .map(|def| {
                let version = def
                    .version
                    .as_ref()
                    .map_or_else(VersionSpecifier::any, VersionSpecifier::exact);
                PackageSpecifier::by_name(&def.name).with_version(version)
            })
            .collect();
        Self::resolve(installation, &requests, repositories, cancel).await
    }

    /// Handle one requirement; returns follow-up work for the queue.
    async fn step(
        &mut self,
        request: &PackageSpecifier,
        requested_by: Option<String>,
        installed: &AHashMap<&str, &PackageDef>,
        repositories: &[Arc<dyn Repository>],
        history: &mut AHashMap<String, AHashSet<Option<SemanticVersion>>>,
        cancel: &CancellationToken,
    ) -> Vec<(PackageSpecifier, Option<String>)> {
        let Some(name) = request.name.as_deref() else {
            self.unknown.push(request.clone());
            return Vec::new();
        };

        // An existing choice that already satisfies the requirement only
        // gains a requester.
        if let Some(entry) = self.entries.get_mut(name) {
            if request.version.is_compatible(entry.package.version.as_ref()) {
                if let Some(parent) = requested_by {
                    if !entry.requested_by.contains(&parent) {
                        entry.requested_by.push(parent);
                    }
                }
                return Vec::new();
            }
        }

        // Installation first, repositories second.
        let mut choice: Option<(PackageDef, bool)> = installed
            .get(name)
            .filter(|def| request.matches(def))
            .map(|def| ((*def).clone(), true));
        if choice.is_none() {
            choice = self
                .best_from_repositories(request, repositories, cancel)
                .await
                .map(|def| (def, false));
        }

        let Some((package, from_installation)) = choice else {
            trace!(package = name, requirement = %request.version, "no candidate anywhere");
            self.unknown.push(request.clone());
            return Vec::new();
        };

        if !history
            .entry(name.to_string())
            .or_default()
            .insert(package.version.clone())
        {
            self.issues.push(DependencyIssue {
                package_name: name.to_string(),
                expected: request.version.clone(),
                loaded: self
                    .entries
                    .get(name)
                    .and_then(|entry| entry.package.version.clone()),
                kind: IssueKind::VersionConflict,
            });
            return Vec::new();
        }

        // Replacing a previous choice is allowed, but a displaced entry
        // whose own requirement the newcomer fails is a conflict worth
        // reporting.
        if let Some(old) = self.entries.get(name) {
            if old.package.version != package.version
                && !old.requirement.is_compatible(package.version.as_ref())
            {
                self.issues.push(DependencyIssue {
                    package_name: name.to_string(),
                    expected: old.requirement.clone(),
                    loaded: package.version.clone(),
                    kind: IssueKind::VersionConflict,
                });
            }
        }

        let follow_up: Vec<(PackageSpecifier, Option<String>)> = package
            .dependencies
            .iter()
            .map(|dep| (PackageSpecifier::from(dep), Some(name.to_string())))
            .collect();
        trace!(
            package = name,
            version = ?package.version,
            installed = from_installation,
            "resolved"
        );
        self.entries.insert(
            name.to_string(),
            ResolvedEntry {
                package,
                requirement: request.version.clone(),
                requested_by: requested_by.into_iter().collect(),
                installed: from_installation,
            },
        );
        follow_up
    }

    /// Best repository match: highest version wins, exact-minor candidates
    /// are preferred when the requirement names a minor, and the
    /// lowest-index repository breaks version ties.
    async fn best_from_repositories(
        &mut self,
        request: &PackageSpecifier,
        repositories: &[Arc<dyn Repository>],
        cancel: &CancellationToken,
    ) -> Option<PackageDef> {
        let outcome = query::get_packages_from_all(repositories, request, &[], cancel).await;
        if outcome.cancelled {
            self.cancelled = true;
        }
        if outcome.results.is_empty() && !outcome.failures.is_empty() {
            warn!(
                package = request.name.as_deref().unwrap_or("<unnamed>"),
                failures = outcome.failures.len(),
                "every repository failed for requirement"
            );
        }
        self.repository_failures.extend(outcome.failures);

        let mut candidates: Vec<(usize, PackageDef)> = outcome
            .results
            .into_iter()
            .filter(|(_, def)| request.version.is_compatible(def.version.as_ref()))
            .collect();
        if let Some(minor) = request.version.minor() {
            let exact_minor: Vec<(usize, PackageDef)> = candidates
                .iter()
                .filter(|(_, def)| {
                    def.version.as_ref().is_some_and(|v| v.minor == minor)
                })
                .cloned()
                .collect();
            if !exact_minor.is_empty() {
                candidates = exact_minor;
            }
        }
        candidates
            .into_iter()
            .filter(|(_, def)| def.version.is_some())
            .max_by(|(index_a, a), (index_b, b)| {
                a.version
                    .cmp(&b.version)
                    .then_with(|| index_b.cmp(index_a))
            })
            .map(|(_, def)| def)
    }

    /// All resolved definitions, requested ones included, in resolution
    /// order.
    #[must_use]
    pub fn dependencies(&self) -> Vec<&PackageDef> {
        self.entries.values().map(|entry| &entry.package).collect()
    }

    /// Resolved packages that did not come from the installation.
    #[must_use]
    pub fn missing_dependencies(&self) -> Vec<&PackageDef> {
        self.entries
            .values()
            .filter(|entry| !entry.installed)
            .map(|entry| &entry.package)
            .collect()
    }

    /// Requirements no repository or installation could satisfy.
    #[must_use]
    pub fn unknown_dependencies(&self) -> &[PackageSpecifier] {
        &self.unknown
    }

    /// Conflict diagnostics collected during the walk.
    #[must_use]
    pub fn dependency_issues(&self) -> &[DependencyIssue] {
        &self.issues
    }

    /// Per-repository failures observed during fan-out queries. Non-fatal
    /// by themselves.
    #[must_use]
    pub fn repository_failures(&self) -> &[(String, RepositoryError)] {
        &self.repository_failures
    }

    /// The full entry for a name, if resolved.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&ResolvedEntry> {
        self.entries.get(name)
    }

    /// Whether resolution stopped early on cancellation.
    #[must_use]
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pallet_core::SemanticVersion;
    use pallet_repository::MemoryRepository;
    use std::str::FromStr;

    fn spec(name: &str, version: &str) -> PackageSpecifier {
        PackageSpecifier::by_name(name)
            .with_version(VersionSpecifier::from_str(version).unwrap())
    }

    fn repos(repo: MemoryRepository) -> Vec<Arc<dyn Repository>> {
        vec![Arc::new(repo)]
    }

    #[tokio::test]
    async fn test_no_dependency_request_echoes_back() {
        let repo = MemoryRepository::new("main");
        repo.add_version("solo", "1.0.0", &[]);

        let resolver = DependencyResolver::resolve(
            &Installation::default(),
            &[spec("solo", "^1.0")],
            &repos(repo),
            &CancellationToken::new(),
        )
        .await;

        let names: Vec<&str> = resolver.dependencies().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["solo"]);
        assert!(resolver.unknown_dependencies().is_empty());
        assert!(resolver.dependency_issues().is_empty());
        // Nothing was installed, so the one resolved package is missing.
        assert_eq!(resolver.missing_dependencies().len(), 1);
    }

    #[tokio::test]
    async fn test_transitive_dependencies_are_pulled_in() {
        let repo = MemoryRepository::new("main");
        repo.add_version("app", "1.0.0", &[("lib", "^1.0")]);
        repo.add_version("lib", "1.3.0", &[("base", "^2.0")]);
        repo.add_version("base", "2.1.0", &[]);

        let resolver = DependencyResolver::resolve(
            &Installation::default(),
            &[spec("app", "^1.0")],
            &repos(repo),
            &CancellationToken::new(),
        )
        .await;

        let mut names: Vec<&str> =
            resolver.dependencies().iter().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["app", "base", "lib"]);
        assert_eq!(
            resolver.entry("lib").unwrap().requested_by.to_vec(),
            vec!["app".to_string()]
        );
    }

    #[tokio::test]
    async fn test_installed_package_satisfies_without_repository() {
        let repo = MemoryRepository::new("main");
        repo.add_version("app", "1.0.0", &[("lib", "^1.0")]);

        let installation = Installation::new(vec![PackageDef::new(
            "lib",
            SemanticVersion::from_str("1.5.0").unwrap(),
        )]);

        let resolver = DependencyResolver::resolve(
            &installation,
            &[spec("app", "^1.0")],
            &repos(repo),
            &CancellationToken::new(),
        )
        .await;

        assert!(resolver.entry("lib").unwrap().installed);
        let missing: Vec<&str> = resolver
            .missing_dependencies()
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(missing, vec!["app"]);
    }

    #[tokio::test]
    async fn test_compatible_duplicate_requests_fold_to_one_entry() {
        let repo = MemoryRepository::new("main");
        repo.add_version("lib", "1.2.4", &[]);

        let resolver = DependencyResolver::resolve(
            &Installation::default(),
            &[spec("lib", "^1.2"), spec("lib", "^1.2.3")],
            &repos(repo),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(resolver.dependencies().len(), 1);
        assert!(resolver.dependency_issues().is_empty());
    }

    #[tokio::test]
    async fn test_exclusive_duplicate_requests_record_conflict() {
        let repo = MemoryRepository::new("main");
        repo.add_version("lib", "1.0.0", &[]);
        repo.add_version("lib", "2.0.0", &[]);

        let resolver = DependencyResolver::resolve(
            &Installation::default(),
            &[spec("lib", "1.0.0"), spec("lib", "2.0.0")],
            &repos(repo),
            &CancellationToken::new(),
        )
        .await;

        assert!(!resolver.dependency_issues().is_empty());
        assert_eq!(
            resolver.dependency_issues()[0].kind,
            IssueKind::VersionConflict
        );
        // Best effort: exactly one of the two is still resolved.
        assert_eq!(resolver.dependencies().len(), 1);
    }

    #[tokio::test]
    async fn test_unsatisfiable_requirement_is_recorded_unknown() {
        let repo = MemoryRepository::new("main");
        repo.add_version("app", "1.0.0", &[("ghost", "^3.0")]);

        let resolver = DependencyResolver::resolve(
            &Installation::default(),
            &[spec("app", "^1.0")],
            &repos(repo),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(resolver.unknown_dependencies().len(), 1);
        assert_eq!(
            resolver.unknown_dependencies()[0].name.as_deref(),
            Some("ghost")
        );
    }

    #[tokio::test]
    async fn test_replacement_records_conflict_when_old_requirement_breaks() {
        let repo = MemoryRepository::new("main");
        // first pulls shared at ^1.0, second demands exactly 2.0.0.
        repo.add_version("first", "1.0.0", &[("shared", "^1.0")]);
        repo.add_version("second", "1.0.0", &[("shared", "2.0.0")]);
        repo.add_version("shared", "1.4.0", &[]);
        repo.add_version("shared", "2.0.0", &[]);

        let resolver = DependencyResolver::resolve(
            &Installation::default(),
            &[spec("first", "^1.0"), spec("second", "^1.0")],
            &repos(repo),
            &CancellationToken::new(),
        )
        .await;

        let shared = resolver.entry("shared").unwrap();
        assert_eq!(
            shared.package.version,
            Some(SemanticVersion::from_str("2.0.0").unwrap())
        );
        assert!(resolver
            .dependency_issues()
            .iter()
            .any(|issue| issue.kind == IssueKind::VersionConflict
                && issue.package_name == "shared"));
    }

    #[tokio::test]
    async fn test_highest_version_wins_and_exact_minor_is_preferred() {
        let repo = MemoryRepository::new("main");
        repo.add_version("lib", "1.2.1", &[]);
        repo.add_version("lib", "1.2.9", &[]);
        repo.add_version("lib", "1.6.0", &[]);

        let resolver = DependencyResolver::resolve(
            &Installation::default(),
            &[spec("lib", "^1.2")],
            &repos(repo),
            &CancellationToken::new(),
        )
        .await;

        // Minor 2 is named, so 1.2.9 beats the newer 1.6.0.
        assert_eq!(
            resolver.entry("lib").unwrap().package.version,
            Some(SemanticVersion::from_str("1.2.9").unwrap())
        );
    }

    #[tokio::test]
    async fn test_lower_priority_index_breaks_version_ties() {
        let first = MemoryRepository::new("first");
        let mut from_first = PackageDef::new("lib", SemanticVersion::new(1, 0, 0));
        from_first.description = "published by first".into();
        first.add_package(from_first);

        let second = MemoryRepository::new("second");
        let mut from_second = PackageDef::new("lib", SemanticVersion::new(1, 0, 0));
        from_second.description = "published by second".into();
        second.add_package(from_second);

        let repositories: Vec<Arc<dyn Repository>> =
            vec![Arc::new(first), Arc::new(second)];
        let resolver = DependencyResolver::resolve(
            &Installation::default(),
            &[spec("lib", "^1.0")],
            &repositories,
            &CancellationToken::new(),
        )
        .await;

        let entry = resolver.entry("lib").unwrap();
        assert_eq!(entry.package.description, "published by first");
    }

    #[tokio::test]
    async fn test_cancellation_returns_partial_state() {
        let repo = MemoryRepository::new("main");
        repo.add_version("lib", "1.0.0", &[]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let resolver = DependencyResolver::resolve(
            &Installation::default(),
            &[spec("lib", "^1.0")],
            &repos(repo),
            &cancel,
        )
        .await;

        assert!(resolver.was_cancelled());
        assert!(resolver.dependencies().is_empty());
    }
}
