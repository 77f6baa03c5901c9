//! Aggregator Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Only construction can fail. Once an aggregator exists, provider failures
//! are absorbed by `refresh()` and lookups answer with `None` or an empty
//! list rather than an error.

use derive_more::{Display, Error};
use mediadex_identity::Kind;

/// An aggregator error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for aggregator construction.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The aggregator was given settings it cannot work with.
    #[display("invalid aggregator configuration: {_0}")]
    Configuration(#[error(not(source))] String),
    /// A provider was registered under a kind it does not serve.
    #[display("provider {provider} serves {actual}, not {expected}")]
    KindMismatch { provider: String, expected: Kind, actual: Kind },
    /// Two providers of the same aggregator share a name.
    #[display("duplicate provider: {_0}")]
    DuplicateProvider(#[error(not(source))] String),
    /// The declared search fields don't make a valid index schema.
    #[display("invalid search index configuration")]
    Index,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
