//! Dependency analysis and resolution for the Pallet package engine.
//!
//! Three engines share the version and package model from `pallet-core`:
//!
//! - **[`DependencyAnalyzer`]** checks a fixed, already-decided package set
//!   for consistency. A package is broken when a direct dependency is
//!   missing or incompatible, or when something it depends on is broken.
//!   Pure graph fixed-point computation, no I/O.
//!
//! - **[`DependencyResolver`]** resolves requested packages incrementally
//!   and greedily: installation first, then repositories, one chosen
//!   package per name with in-place replacement. It never fails; missing,
//!   unknown, and conflicting dependencies come back as diagnostics the
//!   caller inspects.
//!
//! - **[`TreeSolver`]** is the strict alternative: depth-first backtracking
//!   search that either returns a single mutually consistent package set or
//!   reports unsatisfiability. Favor it when correctness matters more than
//!   speed.
//!
//! Inconsistency is data here, not an error. Only infrastructure problems
//! (all repositories failing, resource limits, malformed input) surface as
//! `Err`.
//!
//! ## Example
//!
//! ```
//! use pallet_core::PackageSpecifier;
//! use pallet_repository::{MemoryRepository, Repository};
//! use pallet_resolver::TreeSolver;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), pallet_resolver::SolveError> {
//! let repo = MemoryRepository::new("main");
//! repo.add_version("app", "1.0.0", &[("lib", "^1.0")]);
//! repo.add_version("lib", "1.4.0", &[]);
//!
//! let solver = TreeSolver::new(vec![Arc::new(repo) as Arc<dyn Repository>]);
//! let solution = solver
//!     .solve(&[PackageSpecifier::by_name("app")], &CancellationToken::new())
//!     .await?;
//! assert_eq!(solution.len(), 2);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod analyzer;
pub mod heuristics;
pub mod incremental;
pub mod issue;
pub mod solver;

pub use analyzer::DependencyAnalyzer;
pub use incremental::{DependencyResolver, ResolvedEntry};
pub use issue::{DependencyIssue, IssueKind};
pub use solver::{SolveError, SolverConfig, TreeSolver};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
