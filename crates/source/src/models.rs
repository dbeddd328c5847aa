//! Listing models.
//!
//! These types describe what a remote folder looked like at the moment it was
//! listed. They carry no content, only enough metadata to decide whether a
//! file changed since the last time it was seen.

use derive_more::Display;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Opaque token identifying one state of a remote folder.
///
/// Sources hand one out with every [`Listing::Changed`] and accept it back on
/// the next call to skip the work when nothing moved.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);
impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

/// File metadata returned by a remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    /// Path of the file, relative to the source root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Modification time as reported by whoever wrote the file
    pub modified_client: OffsetDateTime,
    /// Modification time as recorded by the remote service
    pub modified_server: OffsetDateTime,
    /// Content hash, for remotes that compute one natively
    pub content_hash: Option<String>,
}
impl RemoteItem {
    /// Create a new item without a native content hash.
    pub fn new(
        path: impl Into<PathBuf>,
        size: u64,
        modified_client: OffsetDateTime,
        modified_server: OffsetDateTime,
    ) -> Self {
        Self {
            path: path.into(),
            size,
            modified_client,
            modified_server,
            content_hash: None,
        }
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    /// Final component of the path, if it is valid UTF-8.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Result of listing a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// The folder is still at the revision the caller already knows about.
    Unchanged,
    /// The folder changed (or the caller had no revision yet).
    Changed { revision: Revision, items: Vec<RemoteItem> },
}
