//! CLI Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A CLI error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for CLI commands.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fix the configuration and try again.
    #[display("configuration error")]
    Config,
    /// The configuration is valid but aggregators could not be built from it.
    #[display("could not set up aggregators")]
    Setup,
    /// A command-line argument could not be understood.
    #[display("invalid argument: {_0}")]
    Argument(#[error(not(source))] String),
    /// The requested content is not known to any aggregator.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The process could not wait for a shutdown signal.
    #[display("signal handling failed")]
    Signal,
}
