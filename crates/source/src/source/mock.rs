//! In-memory source for testing.

use super::{ByteStream, RemoteSource};
use crate::error::{ErrorKind, Result};
use crate::models::{Listing, RemoteItem, Revision};
use crate::name::validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    /// Bumped on every mutation, so listings can be compared like a real remote.
    revision: u64,
    files: BTreeMap<PathBuf, (RemoteItem, Vec<u8>)>,
}

/// In-memory source for testing.
///
/// Files live in a map behind a [`RwLock`], so the source can be mutated
/// between synchronizations while being shared with the code under test.
/// Every mutation moves the folder to a new revision. Downloads are counted,
/// can be slowed down and can be made to fail.
///
/// # Examples
///
/// ```
/// use gallery_source::{Listing, RemoteSource, source::MockSource};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let source = MockSource::with_files([("a.jpg", b"jpeg bytes")]);
/// let Listing::Changed { items, .. } = source.list(Path::new(""), None).await.unwrap() else {
///     unreachable!()
/// };
/// assert_eq!(items.len(), 1);
/// assert_eq!(source.download(Path::new("a.jpg")).await.unwrap(), b"jpeg bytes");
/// assert_eq!(source.download_count(), 1);
/// # }
/// ```
pub struct MockSource {
    name: String,
    state: RwLock<State>,
    native_hashes: bool,
    downloads: AtomicUsize,
    failing: AtomicBool,
    delay: std::sync::Mutex<Option<Duration>>,
}

impl MockSource {
    /// Create a mock source pre-populated with files.
    ///
    /// Every file gets the Unix epoch as both modification times and a BLAKE3
    /// digest of its contents as native content hash.
    ///
    /// Panics if any path fails validation. If test setup is wrong, then the
    /// test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut state = State::default();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockSource::with_files: invalid path {}", path.display());
            };
            let data = data.into();
            let epoch = OffsetDateTime::UNIX_EPOCH;
            let item = RemoteItem::new(&validated, data.len() as u64, epoch, epoch)
                .with_content_hash(blake3::hash(&data).to_string());
            state.files.insert(validated, (item, data));
        }
        Self {
            name: "mock".to_string(),
            state: RwLock::new(state),
            native_hashes: true,
            downloads: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay: std::sync::Mutex::new(None),
        }
    }

    /// List items without content hashes, like a remote that has no native
    /// hashing (callers then fall back to size and timestamps).
    pub fn without_content_hashes(mut self) -> Self {
        self.native_hashes = false;
        self
    }

    /// Insert or replace a file with fully specified metadata.
    ///
    /// Panics if the item path fails validation.
    pub async fn put_item(&self, item: RemoteItem, data: impl Into<Vec<u8>>) {
        let Ok(validated) = validate_path(&item.path) else {
            panic!("MockSource::put_item: invalid path {}", item.path.display());
        };
        let item = RemoteItem { path: validated.clone(), ..item };
        let mut state = self.state.write().await;
        state.files.insert(validated, (item, data.into()));
        state.revision += 1;
    }

    /// Insert or replace a file's contents. An existing file keeps its
    /// modification times; size and content hash follow the new data.
    pub async fn put(&self, path: impl Into<PathBuf>, data: impl Into<Vec<u8>>) {
        let path = path.into();
        let data = data.into();
        let epoch = OffsetDateTime::UNIX_EPOCH;
        let item = match self.state.read().await.files.get(&path) {
            Some((existing, _)) => RemoteItem { size: data.len() as u64, ..existing.clone() },
            None => RemoteItem::new(&path, data.len() as u64, epoch, epoch),
        };
        let item = item.with_content_hash(blake3::hash(&data).to_string());
        self.put_item(item, data).await;
    }

    /// Remove a file. Returns whether it existed.
    pub async fn remove(&self, path: impl AsRef<Path>) -> bool {
        let mut state = self.state.write().await;
        let removed = state.files.remove(path.as_ref()).is_some();
        state.revision += 1;
        removed
    }

    /// Number of downloads started so far (including failed ones).
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    /// Make every following download fail with a network error (or succeed again).
    pub fn fail_downloads(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every following download before its first chunk.
    pub fn set_download_delay(&self, delay: Option<Duration>) {
        if let Ok(mut guard) = self.delay.lock() {
            *guard = delay;
        }
    }

    fn in_folder(folder: &Path, path: &Path) -> bool {
        let is_root = folder.components().all(|c| matches!(c, Component::CurDir | Component::RootDir));
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        match is_root {
            true => parent.as_os_str().is_empty(),
            false => validate_path(folder).is_ok_and(|f| f == parent),
        }
    }
}
impl Default for MockSource {
    fn default() -> Self {
        let files: [(&str, &[u8]); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl RemoteSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self, folder: &Path, since: Option<&Revision>) -> Result<Listing> {
        let state = self.state.read().await;
        let revision = Revision::new(format!("rev-{}", state.revision));
        if since == Some(&revision) {
            return Ok(Listing::Unchanged);
        }
        let items = state
            .files
            .values()
            .filter(|(item, _)| Self::in_folder(folder, &item.path))
            .map(|(item, _)| match self.native_hashes {
                true => item.clone(),
                false => RemoteItem { content_hash: None, ..item.clone() },
            })
            .collect();
        Ok(Listing::Changed { revision, items })
    }

    fn download_stream<'a>(&'a self, path: &'a Path) -> ByteStream<'a> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay.lock().ok().and_then(|guard| *guard);
        Box::pin(stream! {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                yield Err(exn::Exn::from(ErrorKind::Network(format!("injected failure: {}", path.display()))));
                return;
            }
            let data = match validate_path(path) {
                Ok(path) => self.state.read().await.files.get(&path).map(|(_, data)| data.clone()),
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            match data {
                Some(data) => {
                    yield Ok(data);
                },
                None => {
                    yield Err(exn::Exn::from(ErrorKind::NotFound(path.to_path_buf())));
                },
            }
        })
    }
}
