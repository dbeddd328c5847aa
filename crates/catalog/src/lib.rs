//! A catalog of the photos in a remote folder, and their bytes.
//!
//! [`Gallery`] ties the pieces together: it lists the remote folder through a
//! [`SourceHandle`](gallery_source::SourceHandle), keeps an immutable
//! [`Catalog`] of what it found (newest photo first), and serves originals and
//! thumbnails through a [`ContentStore`](gallery_store::ContentStore) keyed by
//! [`PhotoKey`]. Thumbnails depend on their original, so whenever a photo
//! changes remotely every cached thumbnail of it goes too.

mod catalog;
pub mod error;
mod fetch;
mod gallery;
mod item;
mod key;
mod monitor;
mod size;
mod sync;
#[cfg(test)]
mod testing;

pub use crate::catalog::Catalog;
pub use crate::gallery::{Gallery, GalleryOptions};
pub use crate::item::{CatalogItem, Fingerprint};
pub use crate::key::PhotoKey;
pub use crate::monitor::{Backoff, monitor};
pub use crate::size::{SizeLimits, ThumbnailSize};
pub use crate::sync::SyncOutcome;
