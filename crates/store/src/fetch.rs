use crate::error::Result;
use crate::key::CacheKey;
use crate::store::ContentStore;
use async_trait::async_trait;

/// Produces the bytes for a key on a cache miss.
///
/// A store has exactly one fetcher, which is expected to `match` over every
/// variant of its key type. Fetchers for derived keys read their source
/// through `store` so that sources are cached and single-flighted as well.
///
/// The store guarantees that, per key, only one call is in flight at a time.
#[async_trait]
pub trait Fetcher<K: CacheKey>: Send + Sync {
    async fn fetch(&self, key: &K, store: &ContentStore<K>) -> Result<Vec<u8>>;
}
