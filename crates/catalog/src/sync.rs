//! Synchronizing the catalog with the remote folder.

use crate::catalog::Catalog;
use crate::error::{ErrorKind, Result};
use crate::gallery::Gallery;
use crate::item::{CatalogItem, Fingerprint};
use crate::key::PhotoKey;
use exn::ResultExt;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use gallery_source::Listing;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use time::OffsetDateTime;
use tracing::instrument;

/// What a successful [`Gallery::load`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote folder is still at the known revision; nothing was done.
    Unchanged,
    /// A new catalog was published.
    Updated {
        /// Items in the new catalog.
        total: usize,
        /// Items that were new or changed, and were re-enriched.
        dirty: usize,
    },
}

/// Holds the "load in progress" flag for as long as it lives, including when
/// the load future is dropped halfway.
struct LoadGuard<'a>(&'a AtomicBool);

impl<'a> LoadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            exn::bail!(ErrorKind::Busy);
        }
        Ok(Self(flag))
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Position in the new listing, and the item that goes there.
enum Slot {
    Ready(CatalogItem),
    Dirty(CatalogItem),
}

impl Gallery {
    /// Bring the catalog in line with the remote folder.
    ///
    /// Items whose fingerprint is new or changed have their cached bytes
    /// invalidated (thumbnails included) before anything is fetched again,
    /// then get their creation time read from the file itself. Unchanged
    /// items are carried over as they are. The new catalog only becomes
    /// visible once every item is done.
    ///
    /// Fails with [`ErrorKind::Busy`] if another load is still running.
    /// Items deleted remotely are dropped from the catalog, but whatever
    /// the cache holds for them is left alone.
    #[instrument(skip(self), fields(source = self.source.name(), folder = %self.options.folder.display()))]
    pub async fn load(&self) -> Result<SyncOutcome> {
        let _guard = LoadGuard::acquire(&self.loading)?;

        let since = self.revision();
        let listing = self.source.list(&self.options.folder, since.as_ref()).await.or_raise(|| ErrorKind::Source)?;
        let (revision, remote) = match listing {
            Listing::Unchanged => {
                tracing::debug!("Remote folder unchanged");
                return Ok(SyncOutcome::Unchanged);
            },
            Listing::Changed { revision, items } => (revision, items),
        };

        let previous = self.catalog();
        let mut slots = Vec::with_capacity(remote.len());
        for entry in &remote {
            let Some(name) = entry.file_name() else {
                tracing::warn!(path = %entry.path().display(), "Skipping item without a UTF-8 file name");
                continue;
            };
            match previous.get(name) {
                Some(known) if known.fingerprint == Fingerprint::of(entry) => slots.push(Slot::Ready(known.clone())),
                _ => {
                    // Must happen before any enrichment starts.
                    self.store.invalidate(&PhotoKey::original(name));
                    slots.push(Slot::Dirty(CatalogItem::from_remote(name, entry)));
                },
            }
        }

        let mut items: Vec<Option<CatalogItem>> = Vec::with_capacity(slots.len());
        let mut pending = VecDeque::new();
        for (position, slot) in slots.into_iter().enumerate() {
            match slot {
                Slot::Ready(item) => items.push(Some(item)),
                Slot::Dirty(item) => {
                    items.push(None);
                    pending.push_back(self.enrich(position, item));
                },
            }
        }
        let dirty = pending.len();
        match dirty {
            0 => tracing::info!("No new items"),
            _ => tracing::info!(dirty, "Waiting for new items to load"),
        }

        let mut processing = FuturesUnordered::new();
        while processing.len() < self.options.enrich_concurrency.max(1) {
            let Some(next) = pending.pop_front() else { break };
            processing.push(next);
        }
        while let Some((position, item)) = processing.next().await {
            items[position] = Some(item);
            if let Some(next) = pending.pop_front() {
                processing.push(next);
            }
        }

        let catalog = Catalog::new(items.into_iter().flatten().collect());
        let total = catalog.len();
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
        *self.revision.lock().unwrap_or_else(PoisonError::into_inner) = Some(revision);
        tracing::info!(total, dirty, resident_bytes = self.store.resident_bytes(), "Catalog updated");
        Ok(SyncOutcome::Updated { total, dirty })
    }

    /// Refine an item's creation time from its embedded metadata, keeping the
    /// fallback on any failure.
    async fn enrich(&self, position: usize, item: CatalogItem) -> (usize, CatalogItem) {
        match self.created_time(&item).await {
            Ok(created) => (position, item.with_created(created)),
            Err(err) => {
                tracing::warn!(%item, error = ?err, "Keeping fallback creation time");
                (position, item)
            },
        }
    }

    async fn created_time(&self, item: &CatalogItem) -> Result<OffsetDateTime> {
        let data = self.store.get(&PhotoKey::original(item.name.as_str())).await.or_raise(|| ErrorKind::Content)?;
        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || extractor.created_time(&data))
            .await
            .or_raise(|| ErrorKind::Metadata)?
            .or_raise(|| ErrorKind::Metadata)
    }
}
