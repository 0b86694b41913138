//! Error types for the aggregation engine
//!
//! Every engine operation is a pure computation over already-decoded records,
//! so there are only two ways to fail: the caller asked for something
//! meaningless, or the records themselves break an ordering invariant.

use thiserror::Error;

/// Errors returned by engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Empty input, non-positive size/duration/resolution, zero-width range,
    /// mismatched identities, or a unit conversion lacking intervals
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Snapshots out of order, inverted time span, or malformed region list
    #[error("Inconsistent records: {0}")]
    Inconsistent(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn inconsistent(msg: impl Into<String>) -> Self {
        Error::Inconsistent(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
