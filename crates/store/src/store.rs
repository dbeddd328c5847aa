use crate::error::{ErrorKind, Result};
use crate::fetch::Fetcher;
use crate::key::CacheKey;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Cached bytes. Cheap to clone, immutable once fetched.
pub type Blob = Arc<[u8]>;

type Outcome = std::result::Result<Blob, ErrorKind>;
type SharedFetch = Shared<BoxFuture<'static, Outcome>>;

struct Entry {
    /// Distinguishes this entry from a later one for the same key, so a fetch
    /// that completes after its entry was invalidated can't touch the newer one.
    generation: u64,
    fetch: SharedFetch,
    /// Set once the fetch has succeeded.
    size: Option<usize>,
}

struct Inner<K: CacheKey> {
    name: String,
    fetcher: Box<dyn Fetcher<K>>,
    deadline: Option<Duration>,
    entries: Mutex<HashMap<K, Entry>>,
    resident: AtomicU64,
    generations: AtomicU64,
}

/// Read-through, single-flight cache of byte blobs.
///
/// The map lock is only ever held for lookups, inserts and removals. Waiting
/// for a fetch happens on the entry's shared future, outside of the lock, so
/// a slow key never blocks unrelated lookups.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use gallery_store::{CacheKey, ContentStore, Fetcher, error::Result};
///
/// #[derive(Clone, Debug, PartialEq, Eq, Hash, derive_more::Display)]
/// struct Name(String);
/// impl CacheKey for Name {
///     fn dependencies(&self) -> Vec<Self> {
///         vec![]
///     }
/// }
///
/// struct Shout;
/// #[async_trait]
/// impl Fetcher<Name> for Shout {
///     async fn fetch(&self, key: &Name, _store: &ContentStore<Name>) -> Result<Vec<u8>> {
///         Ok(key.0.to_uppercase().into_bytes())
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = ContentStore::new("names", Shout, None);
/// let data = store.get(&Name("hello".to_string())).await.unwrap();
/// assert_eq!(&*data, b"HELLO");
/// assert_eq!(store.resident_bytes(), 5);
/// # }
/// ```
pub struct ContentStore<K: CacheKey> {
    inner: Arc<Inner<K>>,
}
impl<K: CacheKey> Clone for ContentStore<K> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<K: CacheKey> ContentStore<K> {
    /// Create an empty store.
    ///
    /// When a `deadline` is given, every fetch that takes longer fails with
    /// [`ErrorKind::Timeout`] (and, like any failure, is not cached).
    pub fn new(name: impl Into<String>, fetcher: impl Fetcher<K> + 'static, deadline: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                fetcher: Box::new(fetcher),
                deadline,
                entries: Mutex::new(HashMap::new()),
                resident: AtomicU64::new(0),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Name of the store (used for logging only).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the bytes for a key, fetching them if they haven't been yet.
    ///
    /// Concurrent calls for the same key share a single fetch and all receive
    /// its result. A failed fetch is returned to everyone waiting on it, then
    /// forgotten: the next call fetches again.
    pub async fn get(&self, key: &K) -> Result<Blob> {
        debug_assert!(!key.dependencies().contains(key), "cache key {key} depends on itself");
        let fetch = self.entry(key);
        Ok(fetch.await?)
    }

    /// Removes a key and, transitively, every key that depends on it.
    ///
    /// Dependents are removed even if `key` itself wasn't cached. Fetches that
    /// are in flight for removed keys still complete for whoever is waiting
    /// on them, but their result is not kept.
    ///
    /// Returns `true` if anything was removed.
    pub fn invalidate(&self, key: &K) -> bool {
        let mut entries = self.lock();
        let mut pending = vec![key.clone()];
        let mut removed = 0usize;
        while let Some(current) = pending.pop() {
            if let Some(entry) = entries.remove(&current) {
                self.release(&entry);
                removed += 1;
            }
            // Full scan per cascading key.
            pending.extend(entries.keys().filter(|k| k.dependencies().contains(&current)).cloned());
        }
        if removed > 0 {
            tracing::debug!(store = %self.inner.name, %key, removed, "Invalidated cache entries");
        }
        removed > 0
    }

    /// Whether the store holds an entry (complete or in flight) for a key.
    pub fn contains(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    /// Number of entries, complete or in flight.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total size of all successfully fetched blobs currently held.
    pub fn resident_bytes(&self) -> u64 {
        self.inner.resident.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry>> {
        // Nothing panics while holding the lock; if something ever does, the
        // map itself is still consistent.
        self.inner.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up the entry for a key, creating it (and becoming responsible for
    /// the fetch) on a miss. The placeholder is in the map before any I/O.
    fn entry(&self, key: &K) -> SharedFetch {
        let mut entries = self.lock();
        if let Some(entry) = entries.get(key) {
            tracing::trace!(store = %self.inner.name, %key, "Cache hit");
            return entry.fetch.clone();
        }
        tracing::debug!(store = %self.inner.name, %key, "Cache miss");
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed);
        // Bookkeeping lives inside the shared future: whichever caller ends up
        // polling it to completion also evicts or accounts for it, even if the
        // caller that created it has gone away.
        let fetch = self.clone().produce(key.clone(), generation).boxed().shared();
        entries.insert(key.clone(), Entry { generation, fetch: fetch.clone(), size: None });
        fetch
    }

    async fn produce(self, key: K, generation: u64) -> Outcome {
        let result = match self.inner.deadline {
            Some(after) => match tokio::time::timeout(after, self.inner.fetcher.fetch(&key, &self)).await {
                Ok(result) => result,
                Err(_elapsed) => Err(exn::Exn::from(ErrorKind::Timeout { key: key.to_string(), after })),
            },
            None => self.inner.fetcher.fetch(&key, &self).await,
        };
        self.complete(&key, generation, result)
    }

    fn complete(&self, key: &K, generation: u64, result: Result<Vec<u8>>) -> Outcome {
        let mut entries = self.lock();
        let current = entries.get_mut(key).filter(|entry| entry.generation == generation);
        match result {
            Ok(bytes) => {
                let blob: Blob = bytes.into();
                match current {
                    Some(entry) => {
                        entry.size = Some(blob.len());
                        self.inner.resident.fetch_add(blob.len() as u64, Ordering::Relaxed);
                    },
                    None => tracing::debug!(store = %self.inner.name, %key, "Entry invalidated while fetching"),
                }
                tracing::debug!(store = %self.inner.name, %key, bytes = blob.len(), "Fetched");
                Ok(blob)
            },
            Err(err) => {
                // Current waiters get the error; future callers retry.
                if current.is_some() {
                    entries.remove(key);
                }
                tracing::warn!(store = %self.inner.name, %key, error = ?err, "Fetch failed");
                Err((*err).clone())
            },
        }
    }

    fn release(&self, entry: &Entry) {
        if let Some(size) = entry.size {
            self.inner.resident.fetch_sub(size as u64, Ordering::Relaxed);
        }
    }
}
