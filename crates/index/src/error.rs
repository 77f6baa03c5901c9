//! Index Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Index construction itself never fails; these are raised while validating
//! the schema and strategy, which happens once at startup.

use derive_more::{Display, Error};

/// An index configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for index configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The field name is empty or reserved.
    #[display("invalid search field: {_0:?}")]
    InvalidField(#[error(not(source))] String),
    /// Two providers declared the same field with different boosts.
    #[display("conflicting declarations for search field: {_0}")]
    DuplicateField(#[error(not(source))] String),
    /// The boost is outside of the allowed range.
    #[display("invalid boost for search field: {_0}")]
    InvalidBoost(#[error(not(source))] String),
    #[display("unknown index strategy: {_0}")]
    UnknownStrategy(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Configuration is either valid or it isn't.
        false
    }
}
