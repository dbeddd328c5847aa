use crate::catalog::Catalog;
use crate::error::{ErrorKind, Result};
use crate::fetch::PhotoFetcher;
use crate::item::CatalogItem;
use crate::key::PhotoKey;
use crate::size::SizeLimits;
use exn::ResultExt;
use gallery_media::{MetadataExtractor, Transform};
use gallery_source::{Revision, SourceHandle};
use gallery_store::{Blob, ContentStore};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GalleryOptions {
    /// Folder of the remote source holding the photos.
    pub folder: PathBuf,
    /// Deadline for any single download or resize.
    pub fetch_timeout: Option<Duration>,
    /// Upper bound on items enriched at once during a synchronization.
    pub enrich_concurrency: usize,
    pub sizes: SizeLimits,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("."),
            fetch_timeout: Some(Duration::from_secs(60)),
            enrich_concurrency: 16,
            sizes: SizeLimits::default(),
        }
    }
}

/// A remote folder of photos, as a catalog plus a cache of their bytes.
///
/// Starts out empty; [`load`](Gallery::load) brings it in line with the
/// remote folder, and [`monitor`](crate::monitor) keeps it there.
pub struct Gallery {
    pub(crate) source: SourceHandle,
    pub(crate) extractor: Arc<dyn MetadataExtractor>,
    pub(crate) store: ContentStore<PhotoKey>,
    pub(crate) options: GalleryOptions,
    pub(crate) catalog: RwLock<Arc<Catalog>>,
    /// Revision of the remote folder the published catalog was built from.
    pub(crate) revision: Mutex<Option<Revision>>,
    pub(crate) loading: AtomicBool,
}

impl Gallery {
    pub fn new(
        source: SourceHandle,
        transform: Arc<dyn Transform>,
        extractor: Arc<dyn MetadataExtractor>,
        options: GalleryOptions,
    ) -> Self {
        let fetcher = PhotoFetcher { source: Arc::clone(&source), folder: options.folder.clone(), transform };
        let store = ContentStore::new(source.name(), fetcher, options.fetch_timeout);
        Self {
            source,
            extractor,
            store,
            options,
            catalog: RwLock::new(Arc::new(Catalog::default())),
            revision: Mutex::new(None),
            loading: AtomicBool::new(false),
        }
    }

    /// The currently published catalog. Later synchronizations never change
    /// a snapshot that has already been handed out.
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn revision(&self) -> Option<Revision> {
        self.revision.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn options(&self) -> &GalleryOptions {
        &self.options
    }

    pub fn store(&self) -> &ContentStore<PhotoKey> {
        &self.store
    }

    /// Every item, newest first.
    pub fn list_items(&self) -> Vec<CatalogItem> {
        self.catalog().items().to_vec()
    }

    /// The most recently created item.
    pub fn first_item(&self) -> Result<CatalogItem> {
        self.catalog().first().cloned().ok_or_else(|| exn::Exn::from(ErrorKind::Empty))
    }

    /// Metadata and original bytes of a photo.
    ///
    /// Unknown names fail with [`ErrorKind::NotFound`] without touching the
    /// remote source.
    pub async fn get_original(&self, name: &str) -> Result<(CatalogItem, Blob)> {
        let item = self.lookup(name)?;
        let data = self.store.get(&PhotoKey::original(name)).await.or_raise(|| ErrorKind::Content)?;
        Ok((item, data))
    }

    /// Metadata and a thumbnail of a photo.
    ///
    /// Missing dimensions are filled in and clamped according to
    /// [`GalleryOptions::sizes`].
    pub async fn get_derived(
        &self,
        name: &str,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<(CatalogItem, Blob)> {
        let size = self.options.sizes.resolve(width, height)?;
        let item = self.lookup(name)?;
        let data = self.store.get(&PhotoKey::thumbnail(name, size)).await.or_raise(|| ErrorKind::Content)?;
        Ok((item, data))
    }

    /// Bytes currently held by the content cache.
    pub fn resident_bytes(&self) -> u64 {
        self.store.resident_bytes()
    }

    fn lookup(&self, name: &str) -> Result<CatalogItem> {
        self.catalog().get(name).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(name.to_string())))
    }
}
