//! Error types for core value parsing.

use thiserror::Error;

/// Main error type for pallet-core.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed concrete version string.
    #[error(transparent)]
    Version(#[from] crate::version::VersionParseError),

    /// Malformed version specifier string.
    #[error(transparent)]
    Specifier(#[from] crate::specifier::SpecifierParseError),
}

/// Result type for pallet-core operations.
pub type Result<T> = std::result::Result<T, Error>;
