//! Catalog Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a catalog failure.
///
/// ### Operational Errors
/// - [`ErrorKind::Busy`]
/// - [`ErrorKind::NotFound`]
/// - [`ErrorKind::Empty`]
/// - [`ErrorKind::InvalidSize`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Source`]
/// - [`ErrorKind::Content`]
/// - [`ErrorKind::Metadata`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A synchronization is already running. Not a failure: the running one
    /// will publish whatever this one would have.
    #[display("synchronization already in progress")]
    Busy,
    /// Listing the remote folder failed.
    #[display("failed to list remote folder")]
    Source,
    /// Reading bytes through the content store failed.
    #[display("failed to read content")]
    Content,
    /// Embedded metadata could not be extracted.
    #[display("failed to read metadata")]
    Metadata,
    /// No item with this name is in the catalog.
    #[display("no photo with name: {_0}")]
    NotFound(#[error(not(source))] String),
    /// The catalog has no items at all.
    #[display("catalog is empty")]
    Empty,
    /// A requested thumbnail size is unusable.
    #[display("invalid thumbnail size: {_0}")]
    InvalidSize(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy | Self::Source | Self::Content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::NotFound("a.jpg".to_string()).to_string(), "no photo with name: a.jpg");
        assert_eq!(ErrorKind::Busy.to_string(), "synchronization already in progress");
        assert_eq!(ErrorKind::InvalidSize("0x20".to_string()).to_string(), "invalid thumbnail size: 0x20");
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Busy.is_retryable());
        assert!(ErrorKind::Source.is_retryable());
        assert!(!ErrorKind::NotFound("a.jpg".to_string()).is_retryable());
        assert!(!ErrorKind::Empty.is_retryable());
    }
}
