//! Remote folder sources for the gallery.
//!
//! A [`RemoteSource`] knows how to list the files of a folder (with a
//! revision token so unchanged folders are cheap to poll) and how to download
//! the bytes of a single file. Everything else in the gallery treats the
//! source as the single source of truth: nothing is persisted locally.

pub mod error;
mod models;
mod name;
pub mod source;

pub use crate::models::{Listing, RemoteItem, Revision};
pub use crate::name::validate_path;
pub use crate::source::RemoteSource;
use std::sync::Arc;

pub type SourceHandle = Arc<dyn RemoteSource + Send + Sync>;
