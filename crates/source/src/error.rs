//! Source Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A source error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File does not exist
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied (permissions or credentials)
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Network-related error talking to a remote service
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Path contains invalid characters or escapes root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// A configured root or folder exists but is not a directory. This is a
    /// configuration mistake, retrying will not help.
    #[display("not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misconfiguration_is_not_retryable() {
        assert!(!ErrorKind::NotADirectory(PathBuf::from("/photos")).is_retryable());
        assert!(!ErrorKind::InvalidPath(PathBuf::from("../escape")).is_retryable());
        assert!(ErrorKind::Network("connection reset".to_string()).is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::NotFound(PathBuf::from("a.jpg")).to_string(), "file not found: a.jpg");
        assert_eq!(ErrorKind::NotADirectory(PathBuf::from("/tmp/x")).to_string(), "not a directory: /tmp/x");
    }
}
