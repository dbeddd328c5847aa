//! Content Store Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.
//!
//! Fetch results are shared between every caller waiting on the same key, so
//! the kinds here are cheap to clone. The full error tree of a failed fetch is
//! logged once, where it happens.

use derive_more::{Display, Error};
use std::time::Duration;

/// A content store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for content store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Producing the bytes for a key failed (download, upstream key, ...).
    #[display("failed to fetch {_0}")]
    Fetch(#[error(not(source))] String),
    /// The bytes for a source key were fetched, but deriving from them failed.
    #[display("failed to transform {_0}")]
    Transform(#[error(not(source))] String),
    /// The fetch did not complete within the store's deadline.
    #[display("fetching {key} timed out after {}ms", after.as_millis())]
    Timeout { key: String, after: Duration },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Failed fetches are never cached. A failed transform is not retryable:
    /// it only succeeds once the source bytes change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Timeout { .. })
    }
}
