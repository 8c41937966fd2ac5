//! Repository access for the Pallet dependency engine.
//!
//! This crate provides:
//!
//! - **Repository trait**: An object-safe, async source of package
//!   definitions. Implementations answer three questions: which packages
//!   match a specifier, which versions of a named package exist, and which
//!   package names are available at all.
//!
//! - **Fan-out queries**: [`query`] asks every configured repository
//!   concurrently and aggregates answers. A single unreachable repository
//!   degrades the result instead of failing it; the batch errors only when
//!   no repository answered. Cancellation returns partial results.
//!
//! - **In-memory repository**: [`MemoryRepository`] backs tests and local
//!   fixtures with a thread-safe package table.
//!
//! - **Installation snapshot**: [`Installation`] describes what is already
//!   on the target system, which the resolver consults before reaching out
//!   to repositories.
//!
//! ## Example
//!
//! ```
//! use pallet_repository::{MemoryRepository, Repository, query};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let repo = MemoryRepository::new("local");
//! repo.add_version("serde", "1.0.0", &[]);
//!
//! let repositories: Vec<Arc<dyn Repository>> = vec![Arc::new(repo)];
//! let outcome = query::get_package_versions_from_all(
//!     &repositories,
//!     "serde",
//!     &[],
//!     &CancellationToken::new(),
//! )
//! .await;
//! assert_eq!(outcome.results.len(), 1);
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod installation;
pub mod memory;
pub mod query;
pub mod repository;
pub mod types;

pub use error::{AggregateError, RepositoryError, Result};
pub use installation::Installation;
pub use memory::MemoryRepository;
pub use query::QueryOutcome;
pub use repository::{RepoFuture, Repository};
pub use types::PackageVersion;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
