//! Concurrent fan-out queries across repositories.
//!
//! Every configured repository is asked the same question at the same time,
//! one task per repository. Successes are concatenated, tagged with the
//! repository's priority index (its position in the list); failures are
//! collected instead of aborting the batch, so one unreachable repository
//! does not block resolution against the others. The batch as a whole fails
//! only when nobody answered.
//!
//! Cancellation is a normal early return with whatever arrived so far, never
//! an error.

use crate::error::{AggregateError, RepositoryError};
use crate::repository::Repository;
use crate::types::PackageVersion;
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use pallet_core::{PackageDef, PackageIdentifier, PackageSpecifier};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Outcome of a fan-out query: partial results plus per-repository failures.
#[derive(Debug)]
pub struct QueryOutcome<T> {
    /// Concatenated successful answers.
    pub results: Vec<T>,
    /// Failures as `(repository name, error)`.
    pub failures: Vec<(String, RepositoryError)>,
    /// Whether the batch was cut short by cancellation.
    pub cancelled: bool,
}

impl<T> Default for QueryOutcome<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            failures: Vec::new(),
            cancelled: false,
        }
    }
}

impl<T> QueryOutcome<T> {
    /// Treat the batch as fatal only when every repository failed.
    ///
    /// # Errors
    /// [`AggregateError`] when there are failures and no results at all.
    pub fn into_result(self) -> Result<Vec<T>, AggregateError> {
        if self.results.is_empty() && !self.failures.is_empty() {
            return Err(AggregateError {
                failures: self.failures,
            });
        }
        Ok(self.results)
    }
}

/// Ask every repository for packages matching `query`.
///
/// Results are `(priority index, definition)` pairs; lower index means
/// higher priority when breaking version ties.
pub async fn get_packages_from_all(
    repositories: &[Arc<dyn Repository>],
    query: &PackageSpecifier,
    compatible_with: &[PackageIdentifier],
    cancel: &CancellationToken,
) -> QueryOutcome<(usize, PackageDef)> {
    let mut stream: FuturesUnordered<_> = repositories
        .iter()
        .enumerate()
        .map(|(index, repo)| async move {
            (
                index,
                repo.name().to_string(),
                repo.get_packages(query, compatible_with).await,
            )
        })
        .collect();
    collect(&mut stream, cancel).await
}

/// Ask every repository for the known versions of a named package.
pub async fn get_package_versions_from_all(
    repositories: &[Arc<dyn Repository>],
    name: &str,
    compatible_with: &[PackageIdentifier],
    cancel: &CancellationToken,
) -> QueryOutcome<(usize, PackageVersion)> {
    let mut stream: FuturesUnordered<_> = repositories
        .iter()
        .enumerate()
        .map(|(index, repo)| async move {
            (
                index,
                repo.name().to_string(),
                repo.get_package_versions(name, compatible_with).await,
            )
        })
        .collect();
    collect(&mut stream, cancel).await
}

/// Ask every repository which package names it can provide. Names are
/// deduplicated and sorted.
pub async fn get_package_names_from_all(
    repositories: &[Arc<dyn Repository>],
    compatible_with: &[PackageIdentifier],
    cancel: &CancellationToken,
) -> QueryOutcome<String> {
    let mut stream: FuturesUnordered<_> = repositories
        .iter()
        .enumerate()
        .map(|(index, repo)| async move {
            (
                index,
                repo.name().to_string(),
                repo.get_package_names(compatible_with).await,
            )
        })
        .collect();
    let mut outcome = collect(&mut stream, cancel).await;
    let mut names: Vec<String> = outcome.results.drain(..).map(|(_, name)| name).collect();
    names.sort_unstable();
    names.dedup();
    QueryOutcome {
        results: names,
        failures: outcome.failures,
        cancelled: outcome.cancelled,
    }
}

async fn collect<S, R>(stream: &mut S, cancel: &CancellationToken) -> QueryOutcome<(usize, R)>
where
    S: Stream<Item = (usize, String, crate::error::Result<Vec<R>>)> + Unpin,
{
    let mut outcome = QueryOutcome::default();
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                outcome.cancelled = true;
                break;
            }
            next = stream.next() => match next {
                Some((index, _, Ok(rows))) => {
                    outcome.results.extend(rows.into_iter().map(|row| (index, row)));
                }
                Some((index, repository, Err(error))) => {
                    warn!(repository = %repository, priority = index, %error, "repository query failed");
                    outcome.failures.push((repository, error));
                }
                None => break,
            }
        }
    }
    outcome
}
