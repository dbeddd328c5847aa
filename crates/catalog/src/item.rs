//! Catalog items.

use derive_more::Display;
use gallery_source::RemoteItem;
use serde::Serialize;
use std::fmt;
use time::OffsetDateTime;

/// Decides whether a remote file changed since it was last seen.
///
/// The remote's native content hash when there is one, otherwise a BLAKE3
/// digest of the size and both modification times.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(item: &RemoteItem) -> Self {
        if let Some(hash) = &item.content_hash {
            return Self(hash.clone());
        }
        let mut hasher = blake3::Hasher::new();
        hasher.update(&item.size.to_le_bytes());
        hasher.update(&item.modified_client.unix_timestamp_nanos().to_le_bytes());
        hasher.update(&item.modified_server.unix_timestamp_nanos().to_le_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One photo in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    /// File name, unique within the catalog.
    pub name: String,
    pub size: u64,
    #[serde(skip)]
    pub fingerprint: Fingerprint,
    /// Last modification according to the remote service.
    #[serde(with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,
    /// When the photo was taken, if the file says so; otherwise when the
    /// client last modified it.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}

impl CatalogItem {
    /// Build an item from a listing entry, with the fallback creation time.
    pub fn from_remote(name: impl Into<String>, item: &RemoteItem) -> Self {
        Self {
            name: name.into(),
            size: item.size,
            fingerprint: Fingerprint::of(item),
            modified: item.modified_server,
            created: item.modified_client,
        }
    }

    pub fn with_created(self, created: OffsetDateTime) -> Self {
        Self { created, ..self }
    }

    /// Whole days from `since` to when the photo was taken, rounded down.
    /// Negative for photos taken before `since`.
    pub fn days_since(&self, since: OffsetDateTime) -> i64 {
        let day = time::Duration::DAY.whole_nanoseconds();
        (self.created - since).whole_nanoseconds().div_euclid(day) as i64
    }
}

impl fmt::Display for CatalogItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.created)
    }
}
