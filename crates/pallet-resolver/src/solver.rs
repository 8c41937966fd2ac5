//! Strict backtracking resolution over a search tree.
//!
//! Where the incremental resolver is greedy and best-effort, the tree
//! solver guarantees that a returned set of packages is mutually
//! consistent: every dependency of every chosen package is satisfied by
//! another chosen package. It explores candidate versions depth-first,
//! most constrained requirement first, and on a dead end discards the
//! current node and tries the next candidate. Unsatisfiability is a
//! structural result, not a panic or an exception path.
//!
//! Nodes live in an arena indexed by integer id; a partial resolution is
//! the parent chain of a node. Backtracking abandons indices instead of
//! tearing down an object graph.

use crate::heuristics;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use pallet_core::{CpuArchitecture, PackageDef, PackageSpecifier};
use pallet_repository::error::AggregateError;
use pallet_repository::{Repository, query};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Why the solver could not produce a resolution.
#[derive(Debug, Error)]
pub enum SolveError {
    /// No mutually consistent assignment exists for the requirements.
    #[error("no consistent resolution exists for the given requirements")]
    Unsatisfiable,
    /// Every repository failed while enumerating candidates.
    #[error(transparent)]
    Repository(#[from] AggregateError),
    /// The search tree outgrew the configured node limit.
    #[error("search aborted after {nodes} nodes")]
    LimitExceeded {
        /// Nodes allocated when the limit was hit.
        nodes: usize,
    },
    /// The operation was cancelled before a resolution was found.
    #[error("resolution cancelled")]
    Cancelled,
}

/// Search bounds.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// Maximum number of tree nodes allocated over the whole search.
    pub max_nodes: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { max_nodes: 10_000 }
    }
}

/// One node of the search tree. The root carries no package.
#[derive(Debug)]
struct SolverNode {
    package: Option<PackageDef>,
    parent: Option<usize>,
}

/// Depth-first backtracking solver over an ordered repository list.
pub struct TreeSolver {
    repositories: Vec<Arc<dyn Repository>>,
    config: SolverConfig,
}

impl std::fmt::Debug for TreeSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSolver")
            .field("repositories", &self.repositories.len())
            .field("config", &self.config)
            .finish()
    }
}

impl TreeSolver {
    /// Solver with default bounds.
    #[must_use]
    pub fn new(repositories: Vec<Arc<dyn Repository>>) -> Self {
        Self::with_config(repositories, SolverConfig::default())
    }

    /// Solver with explicit bounds.
    #[must_use]
    pub fn with_config(repositories: Vec<Arc<dyn Repository>>, config: SolverConfig) -> Self {
        Self {
            repositories,
            config,
        }
    }

    /// Find one mutually consistent set of packages covering every
    /// requirement, or report that none exists.
    ///
    /// # Errors
    /// [`SolveError::Unsatisfiable`] when the search space is exhausted,
    /// [`SolveError::Repository`] when no repository could answer a
    /// candidate query, [`SolveError::LimitExceeded`] past the node bound,
    /// [`SolveError::Cancelled`] on cancellation.
    pub async fn solve(
        &self,
        requirements: &[PackageSpecifier],
        cancel: &CancellationToken,
    ) -> Result<Vec<PackageDef>, SolveError> {
        let named: Vec<PackageSpecifier> = requirements
            .iter()
            .filter(|req| req.name.is_some())
            .cloned()
            .collect();

        let mut arena: Vec<SolverNode> = vec![SolverNode {
            package: None,
            parent: None,
        }];
        match self.explore(&mut arena, 0, named, cancel).await? {
            Some(terminal) => {
                let solution = chain(&arena, terminal);
                debug!(packages = solution.len(), "resolution found");
                Ok(solution)
            }
            None => Err(SolveError::Unsatisfiable),
        }
    }

    /// Try to extend the partial resolution at `node` to cover all
    /// `requirements`. `Ok(None)` is a dead end the caller backtracks from.
    fn explore<'a>(
        &'a self,
        arena: &'a mut Vec<SolverNode>,
        node: usize,
        requirements: Vec<PackageSpecifier>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<usize>, SolveError>> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(SolveError::Cancelled);
            }

            let Some(merged) = merge_specs(requirements) else {
                return Ok(None);
            };
            let resolved = chain(arena, node);

            let mut remaining: Vec<PackageSpecifier> = merged
                .into_iter()
                .filter(|req| !resolved.iter().any(|def| req.matches(def)))
                .collect();
            if remaining.is_empty() {
                return Ok(Some(node));
            }

            // A remaining requirement naming an already-resolved package is
            // a conflict with a choice made above this node; committing a
            // second version of that name can never repair it.
            if remaining.iter().any(|req| {
                resolved
                    .iter()
                    .any(|def| req.name.as_deref() == Some(def.name.as_str()))
            }) {
                return Ok(None);
            }

            // Most constrained first: pinned requirements prune the tree
            // fastest, broad ones keep their freedom until the end.
            let pick = remaining
                .iter()
                .enumerate()
                .max_by_key(|(_, req)| heuristics::specificity(&req.version))
                .map(|(index, _)| index)
                .unwrap_or_default();
            let request = remaining.swap_remove(pick);
            let name = request.name.clone().unwrap_or_default();

            for candidate in self.candidates(&request, cancel).await? {
                if arena.len() >= self.config.max_nodes {
                    return Err(SolveError::LimitExceeded { nodes: arena.len() });
                }
                trace!(package = %name, version = ?candidate.version, "trying candidate");
                let child = arena.len();
                arena.push(SolverNode {
                    package: Some(candidate.clone()),
                    parent: Some(node),
                });

                let mut child_requirements = remaining.clone();
                child_requirements.push(request.clone());
                for dependency in &candidate.dependencies {
                    child_requirements.push(PackageSpecifier::from(dependency));
                }

                if let Some(terminal) = self
                    .explore(&mut *arena, child, child_requirements, cancel)
                    .await?
                {
                    return Ok(Some(terminal));
                }
                trace!(package = %name, version = ?candidate.version, "dead end, backtracking");
            }
            Ok(None)
        })
    }

    /// Candidate definitions for a requirement, ordered by descending
    /// fitness, then descending version, then repository priority.
    /// Duplicate versions from lower-priority repositories are dropped.
    /// The request's architecture and OS constraints filter candidates
    /// alongside its version range.
    async fn candidates(
        &self,
        request: &PackageSpecifier,
        cancel: &CancellationToken,
    ) -> Result<Vec<PackageDef>, SolveError> {
        let outcome =
            query::get_packages_from_all(&self.repositories, request, &[], cancel).await;
        if outcome.cancelled {
            return Err(SolveError::Cancelled);
        }
        let results = outcome.into_result()?;

        let mut candidates: Vec<(usize, PackageDef)> = results
            .into_iter()
            .filter(|(_, def)| def.version.is_some() && request.matches(def))
            .collect();
        let score = |def: &PackageDef| {
            def.version
                .as_ref()
                .map_or(0, |version| heuristics::fitness(version, &request.version))
        };
        candidates.sort_by(|(index_a, a), (index_b, b)| {
            score(b)
                .cmp(&score(a))
                .then_with(|| b.version.cmp(&a.version))
                .then_with(|| index_a.cmp(index_b))
        });
        candidates.dedup_by(|(_, a), (_, b)| a.version == b.version && a.name == b.name);
        Ok(candidates.into_iter().map(|(_, def)| def).collect())
    }
}

/// Fold duplicate requirements per name down to the most specific one.
/// `None` when two requirements on the same name exclude each other, in
/// version range or in platform.
fn merge_specs(requirements: Vec<PackageSpecifier>) -> Option<Vec<PackageSpecifier>> {
    let mut merged: IndexMap<String, PackageSpecifier> = IndexMap::new();
    for req in requirements {
        let Some(name) = req.name.clone() else {
            continue;
        };
        match merged.get_mut(&name) {
            None => {
                merged.insert(name, req);
            }
            Some(existing) => {
                if existing.version.is_satisfied_by(&req.version) {
                    existing.version = req.version.clone();
                } else if !req.version.is_satisfied_by(&existing.version) {
                    trace!(package = %name, a = %existing.version, b = %req.version, "mutually exclusive requirements");
                    return None;
                }
                if !merge_platform(existing, &req) {
                    trace!(package = %name, "mutually exclusive platform requirements");
                    return None;
                }
            }
        }
    }
    Some(merged.into_values().collect())
}

/// Narrow `existing` to the stricter of the two platform constraints.
/// `false` when the constraints cannot both hold.
fn merge_platform(existing: &mut PackageSpecifier, incoming: &PackageSpecifier) -> bool {
    existing.architecture = match (existing.architecture, incoming.architecture) {
        (a, b) if a == b => a,
        (CpuArchitecture::Unspecified | CpuArchitecture::AnyCpu, b) => b,
        (a, CpuArchitecture::Unspecified | CpuArchitecture::AnyCpu) => a,
        _ => return false,
    };
    existing.os = match (existing.os.take(), &incoming.os) {
        (Some(a), Some(b)) => {
            if a.eq_ignore_ascii_case(b) {
                Some(a)
            } else {
                return false;
            }
        }
        (Some(a), None) => Some(a),
        (None, b) => b.clone(),
    };
    true
}

/// Packages along the parent chain of `node`, root first.
fn chain(arena: &[SolverNode], node: usize) -> Vec<PackageDef> {
    let mut packages = Vec::new();
    let mut current = Some(node);
    while let Some(index) = current {
        if let Some(package) = &arena[index].package {
            packages.push(package.clone());
        }
        current = arena[index].parent;
    }
    packages.reverse();
    packages
}
