//! Media Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A media error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Nothing here is worth retrying with the same input.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input could not be decoded as an image.
    #[display("invalid or unsupported image data")]
    Decode,
    /// The resized image could not be encoded.
    #[display("failed to encode image")]
    Encode,
    /// The requested output size is unusable.
    #[display("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    /// The image carries no usable metadata for the requested field.
    #[display("metadata not found")]
    MissingMetadata,
    /// Metadata is present but malformed.
    #[display("invalid metadata: {_0}")]
    InvalidMetadata(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Decode.to_string(), "invalid or unsupported image data");
        assert_eq!(ErrorKind::InvalidDimensions { width: 0, height: 20 }.to_string(), "invalid dimensions: 0x20");
        assert_eq!(
            ErrorKind::InvalidMetadata("bad date".to_string()).to_string(),
            "invalid metadata: bad date"
        );
    }

    #[test]
    fn error_kind_retryable() {
        assert!(!ErrorKind::Decode.is_retryable());
        assert!(!ErrorKind::MissingMetadata.is_retryable());
    }
}
