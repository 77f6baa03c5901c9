//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A provider error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The provider could not be reached or refused to answer. Retried at the
    /// next scheduled refresh, never inline.
    #[display("source unavailable: {_0}")]
    SourceUnavailable(#[error(not(source))] String),
    /// The provider did not answer within its time budget.
    #[display("source timed out: {_0}")]
    Timeout(#[error(not(source))] String),
    /// The provider does not implement the requested capability.
    #[display("unsupported capability: {_0}")]
    Unsupported(#[error(not(source))] &'static str),
    /// The provider answered with something that isn't a catalog.
    #[display("invalid catalog data: {_0}")]
    InvalidData(#[error(not(source))] String),
    /// The provider's call panicked or was aborted before answering.
    #[display("source crashed: {_0}")]
    Crashed(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::Timeout(_))
    }
}
