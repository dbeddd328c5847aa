//! In-memory, read-through cache of byte blobs.
//!
//! Cache keys are plain values that describe the requested resource in as
//! much detail as needed (a file name, a file name plus thumbnail size, ...).
//! Keys declare which other keys they are derived from, so invalidating a
//! source also drops everything produced from it.
//!
//! # Architecture
//! - A [`ContentStore`] owns a map of key → entry. Each entry is a shared
//!   future: the first caller for a key creates it, every concurrent caller
//!   awaits the same future, so at most one fetch runs per key.
//! - A single [`Fetcher`] per store produces the bytes for any key. It gets
//!   the store back as an argument, so derived keys read their sources
//!   through the cache too.
//! - Failed fetches are handed to everyone waiting on them but never kept.
//!
//! There is no eviction: entries live until they are invalidated.

pub mod error;
mod fetch;
mod key;
mod store;

pub use crate::fetch::Fetcher;
pub use crate::key::CacheKey;
pub use crate::store::{Blob, ContentStore};
