use crate::key::PhotoKey;
use async_trait::async_trait;
use exn::ResultExt;
use gallery_media::Transform;
use gallery_source::SourceHandle;
use gallery_store::error::{ErrorKind as StoreErrorKind, Result as StoreResult};
use gallery_store::{ContentStore, Fetcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

/// Produces the bytes for every [`PhotoKey`] variant.
pub(crate) struct PhotoFetcher {
    pub(crate) source: SourceHandle,
    /// Folder of the remote source that catalog names are relative to.
    pub(crate) folder: PathBuf,
    pub(crate) transform: Arc<dyn Transform>,
}

#[async_trait]
impl Fetcher<PhotoKey> for PhotoFetcher {
    #[instrument(skip_all, fields(source = self.source.name(), %key))]
    async fn fetch(&self, key: &PhotoKey, store: &ContentStore<PhotoKey>) -> StoreResult<Vec<u8>> {
        match key {
            PhotoKey::Original(name) => {
                let path = self.folder.join(name);
                tracing::info!(path = %path.display(), "Downloading original");
                self.source.download(&path).await.or_raise(|| StoreErrorKind::Fetch(key.to_string()))
            },
            PhotoKey::Thumbnail { name, size } => {
                let original = store
                    .get(&PhotoKey::original(name.as_str()))
                    .await
                    .or_raise(|| StoreErrorKind::Fetch(key.to_string()))?;
                tracing::debug!(%size, bytes = original.len(), "Resizing original");
                let transform = Arc::clone(&self.transform);
                let size = *size;
                tokio::task::spawn_blocking(move || transform.resize(&original, size.width, size.height))
                    .await
                    .or_raise(|| StoreErrorKind::Transform(key.to_string()))?
                    .or_raise(|| StoreErrorKind::Transform(key.to_string()))
            },
        }
    }
}
