//! Repository error types.

use std::fmt;
use thiserror::Error;

/// Error from a single repository.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// Package does not exist in this repository.
    #[error("package '{name}' not found")]
    PackageNotFound {
        /// Package name.
        name: String,
    },

    /// The repository could not be reached or answered with a failure.
    #[error("repository '{repository}' unavailable: {message}")]
    Unavailable {
        /// Repository display name.
        repository: String,
        /// Underlying failure description.
        message: String,
    },

    /// A stored package definition could not be understood.
    #[error("invalid package definition: {0}")]
    InvalidDefinition(String),
}

/// Failures from several repositories, collected during a fan-out query.
///
/// Raised only when no repository produced an answer; a partial failure is
/// reported alongside the successful results instead.
#[derive(Debug, Clone)]
pub struct AggregateError {
    /// Per-repository failures as `(repository name, error)`.
    pub failures: Vec<(String, RepositoryError)>,
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all {} repositories failed", self.failures.len())?;
        for (name, error) in &self.failures {
            write!(f, "; {name}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
