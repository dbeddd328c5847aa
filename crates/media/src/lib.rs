//! Image operations used by the catalog.
//!
//! Both operations are synchronous and CPU-bound; async callers are expected
//! to run them on a blocking thread.

pub mod error;
mod metadata;
mod resize;

pub use crate::metadata::ExifExtractor;
pub use crate::resize::ImageResizer;
use crate::error::Result;
use time::OffsetDateTime;

/// Produces a derived image from the raw bytes of an original.
pub trait Transform: Send + Sync {
    /// Scale `data` to cover a `width` x `height` box, then center-crop to
    /// exactly that size. Never letterboxes.
    fn resize(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>>;
}

/// Reads metadata embedded in the raw bytes of an original.
pub trait MetadataExtractor: Send + Sync {
    /// When the photo was taken, according to the file itself.
    fn created_time(&self, data: &[u8]) -> Result<OffsetDateTime>;
}
