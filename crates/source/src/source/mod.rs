//! Remote source trait and implementations.
//!
//! This module defines the [`RemoteSource`] trait: the two things the gallery
//! needs from wherever the photos actually live. List a folder (cheaply, if
//! nothing changed) and download a file.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalSource;
#[cfg(feature = "mock")]
pub use self::mock::MockSource;
use crate::error::Result;
use crate::models::{Listing, Revision};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send + 'a>>;

/// Unified interface for remote photo sources.
///
/// All paths are relative to the source root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations should
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use gallery_source::{Listing, RemoteSource, error::Result};
///
/// async fn total_size(source: &dyn RemoteSource) -> Result<u64> {
///     match source.list(Path::new("photos"), None).await? {
///         Listing::Changed { items, .. } => Ok(items.iter().map(|i| i.size).sum()),
///         Listing::Unchanged => Ok(0),
///     }
/// }
/// ```
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Name of the configured source (used for logging only).
    fn name(&self) -> &str;

    /// List the files directly inside `folder`.
    ///
    /// When `since` is the revision returned by a previous listing and the
    /// folder has not changed, implementations return
    /// [`Listing::Unchanged`] without enumerating anything.
    ///
    /// Returns [`NotADirectory`](crate::error::ErrorKind::NotADirectory) if
    /// `folder` exists but is not a folder.
    async fn list(&self, folder: &Path, since: Option<&Revision>) -> Result<Listing>;

    /// Stream the contents of a file in chunks.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) (as the first
    /// stream item) if the file does not exist.
    fn download_stream<'a>(&'a self, path: &'a Path) -> ByteStream<'a>;

    /// Download the complete contents of a file.
    ///
    /// Default implementation of this method is to concatenate all the chunks
    /// from [`download_stream()`](Self::download_stream) before returning.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use gallery_source::{RemoteSource, error::Result};
    /// # async fn example(source: &dyn RemoteSource) -> Result<()> {
    /// let data = source.download(Path::new("photos/a.jpg")).await?;
    /// println!("Downloaded {} bytes", data.len());
    /// # Ok(())
    /// # }
    /// ```
    async fn download(&self, path: &Path) -> Result<Vec<u8>> {
        self.download_stream(path).try_concat().await
    }
}
