//! Consistency analysis of a fixed package set.
//!
//! The analyzer takes a complete, already-decided list of package
//! definitions (for example everything currently installed) and computes
//! which of them are broken: a package is broken when a direct dependency
//! is missing or incompatible, or when one of its dependencies is itself
//! broken. The closure is a fixed-point propagation over the reverse
//! dependency graph. There is no search and no I/O here.

use crate::issue::{DependencyIssue, IssueKind};
use ahash::{AHashMap, AHashSet};
use pallet_core::{PackageDef, VersionSpecifier};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

/// Broken-package report over a fixed set of definitions.
#[derive(Debug)]
pub struct DependencyAnalyzer {
    graph: DiGraph<PackageDef, ()>,
    by_name: AHashMap<String, NodeIndex>,
    broken: AHashSet<NodeIndex>,
    issues: AHashMap<NodeIndex, Vec<DependencyIssue>>,
}

impl DependencyAnalyzer {
    /// Analyze a package set. Dependencies on names absent from the list
    /// get a synthesized placeholder with no version, which reads as
    /// "missing".
    #[must_use]
    pub fn build(packages: &[PackageDef]) -> Self {
        let mut graph = DiGraph::new();
        let mut by_name: AHashMap<String, NodeIndex> = AHashMap::new();

        for package in packages {
            // First definition of a name wins.
            by_name
                .entry(package.name.clone())
                .or_insert_with(|| graph.add_node(package.clone()));
        }
        for package in packages {
            for dependency in &package.dependencies {
                if !by_name.contains_key(&dependency.name) {
                    let placeholder = PackageDef::placeholder(&dependency.name);
                    let index = graph.add_node(placeholder);
                    by_name.insert(dependency.name.clone(), index);
                }
            }
        }
        for package in packages {
            let from = by_name[&package.name];
            for dependency in &package.dependencies {
                graph.add_edge(from, by_name[&dependency.name], ());
            }
        }

        let mut analyzer = Self {
            graph,
            by_name,
            broken: AHashSet::new(),
            issues: AHashMap::new(),
        };
        analyzer.classify_direct(packages);
        analyzer.propagate();
        debug!(
            packages = packages.len(),
            broken = analyzer.broken.len(),
            "dependency analysis complete"
        );
        analyzer
    }

    /// Mark packages with a directly missing or incompatible dependency.
    fn classify_direct(&mut self, packages: &[PackageDef]) {
        let mut seen: AHashSet<&str> = AHashSet::new();
        for package in packages {
            if !seen.insert(&package.name) {
                continue;
            }
            let from = self.by_name[&package.name];
            for dependency in &package.dependencies {
                let target = &self.graph[self.by_name[&dependency.name]];
                let issue = if target.version.is_none() {
                    Some(DependencyIssue::missing(
                        &dependency.name,
                        dependency.version.clone(),
                    ))
                } else if !dependency.version.is_compatible(target.version.as_ref()) {
                    Some(DependencyIssue::incompatible(
                        &dependency.name,
                        dependency.version.clone(),
                        target.version.clone(),
                    ))
                } else {
                    None
                };
                if let Some(issue) = issue {
                    self.issues.entry(from).or_default().push(issue);
                    self.broken.insert(from);
                }
            }
        }
    }

    /// Fixed point: anything depending on a broken package is broken too.
    /// Each node is marked at most once, so the worklist drains.
    fn propagate(&mut self) {
        let mut worklist: Vec<NodeIndex> = self.broken.iter().copied().collect();
        while let Some(node) = worklist.pop() {
            let dependers: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .collect();
            for depender in dependers {
                if self.broken.insert(depender) {
                    let broken_name = self.graph[node].name.clone();
                    let expected = self.graph[depender]
                        .dependencies
                        .iter()
                        .find(|d| d.name == broken_name)
                        .map_or_else(VersionSpecifier::any, |d| d.version.clone());
                    self.issues
                        .entry(depender)
                        .or_default()
                        .push(DependencyIssue {
                            package_name: broken_name,
                            expected,
                            loaded: self.graph[node].version.clone(),
                            kind: IssueKind::DependencyMissing,
                        });
                    worklist.push(depender);
                }
            }
        }
    }

    /// All broken packages, sorted by name. Synthesized placeholders are
    /// not reported; only packages from the analyzed list appear.
    #[must_use]
    pub fn broken_packages(&self) -> Vec<&PackageDef> {
        let mut broken: Vec<&PackageDef> = self
            .broken
            .iter()
            .map(|&index| &self.graph[index])
            .filter(|def| def.version.is_some())
            .collect();
        broken.sort_by(|a, b| a.name.cmp(&b.name));
        broken
    }

    /// Whether the named package is broken. Unknown names are not broken.
    #[must_use]
    pub fn is_broken(&self, name: &str) -> bool {
        self.by_name
            .get(name)
            .is_some_and(|index| self.broken.contains(index))
    }

    /// Issues recorded against the named package. Unknown names yield an
    /// empty list.
    #[must_use]
    pub fn get_issues(&self, name: &str) -> &[DependencyIssue] {
        self.by_name
            .get(name)
            .and_then(|index| self.issues.get(index))
            .map_or(&[], Vec::as_slice)
    }

    /// Restrict the broken-package report to packages related to the seed
    /// set: reachable by following dependency edges downward or depender
    /// edges upward. Useful when only the packages about to change matter.
    #[must_use]
    pub fn filter_related(&self, seeds: &[&str]) -> Vec<&PackageDef> {
        let mut related: AHashSet<NodeIndex> = AHashSet::new();
        let mut frontier: Vec<NodeIndex> = seeds
            .iter()
            .filter_map(|name| self.by_name.get(*name).copied())
            .collect();
        while let Some(node) = frontier.pop() {
            if !related.insert(node) {
                continue;
            }
            frontier.extend(self.graph.neighbors_directed(node, Direction::Outgoing));
            frontier.extend(self.graph.neighbors_directed(node, Direction::Incoming));
        }
        self.broken_packages()
            .into_iter()
            .filter(|def| {
                self.by_name
                    .get(&def.name)
                    .is_some_and(|index| related.contains(index))
            })
            .collect()
    }

    /// Number of analyzed nodes, placeholders included.
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Edge list as `(depender, dependency)` name pairs.
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_references()
            .map(|edge| {
                (
                    self.graph[edge.source()].name.as_str(),
                    self.graph[edge.target()].name.as_str(),
                )
            })
            .collect()
    }
}
