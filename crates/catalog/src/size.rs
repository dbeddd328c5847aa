use crate::error::{ErrorKind, Result};
use derive_more::Display;

/// Exact output dimensions of a thumbnail.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display("{width}x{height}")]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

/// How requested thumbnail dimensions are filled in and bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    /// Width used when none is requested.
    pub default_size: u32,
    /// Upper bound for both dimensions.
    pub max_size: u32,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self { default_size: 200, max_size: 1000 }
    }
}

impl SizeLimits {
    /// Resolve requested dimensions into a concrete size.
    ///
    /// Width defaults to `default_size`; height defaults to the (clamped)
    /// width, giving a square. Both are clamped to `max_size`. Zero is
    /// rejected.
    ///
    /// ```
    /// use gallery_catalog::{SizeLimits, ThumbnailSize};
    ///
    /// let limits = SizeLimits::default();
    /// assert_eq!(limits.resolve(None, None).unwrap(), ThumbnailSize { width: 200, height: 200 });
    /// assert_eq!(limits.resolve(Some(5000), None).unwrap(), ThumbnailSize { width: 1000, height: 1000 });
    /// assert!(limits.resolve(Some(0), None).is_err());
    /// ```
    pub fn resolve(&self, width: Option<u32>, height: Option<u32>) -> Result<ThumbnailSize> {
        let width = width.unwrap_or(self.default_size).min(self.max_size);
        let height = height.unwrap_or(width).min(self.max_size);
        if width == 0 || height == 0 {
            exn::bail!(ErrorKind::InvalidSize(format!("{width}x{height}")));
        }
        Ok(ThumbnailSize { width, height })
    }
}
