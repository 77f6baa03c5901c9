//! Identity Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An identity error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for identity operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// Only parsing can fail: building an identity from a title never does.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The content kind is not one of the supported kinds.
    #[display("unknown content kind: {_0}")]
    UnknownKind(#[error(not(source))] String),
    /// The string is not a `kind/key` pair with an already-normalized key.
    #[display("malformed identity: {_0}")]
    MalformedIdentity(#[error(not(source))] String),
    /// The string is not a hex-encoded addressable hash of the right length.
    #[display("malformed addressable hash: {_0}")]
    MalformedHash(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Parsing the same input again gives the same answer.
        false
    }
}
