//! Stand-ins for the media collaborators, so tests don't need real images.

use crate::gallery::{Gallery, GalleryOptions};
use gallery_media::error::{ErrorKind as MediaErrorKind, Result as MediaResult};
use gallery_media::{MetadataExtractor, Transform};
use gallery_source::SourceHandle;
use gallery_source::source::MockSource;
use std::sync::Arc;
use time::OffsetDateTime;

/// Prefixes the original with the requested size.
pub(crate) struct Labeler;
impl Transform for Labeler {
    fn resize(&self, data: &[u8], width: u32, height: u32) -> MediaResult<Vec<u8>> {
        Ok([format!("{width}x{height}:").as_bytes(), data].concat())
    }
}

/// Reads `ts:<unix seconds>` as the creation time.
pub(crate) struct Stamp;
impl MetadataExtractor for Stamp {
    fn created_time(&self, data: &[u8]) -> MediaResult<OffsetDateTime> {
        let seconds = std::str::from_utf8(data)
            .ok()
            .and_then(|text| text.strip_prefix("ts:"))
            .and_then(|seconds| seconds.parse().ok())
            .ok_or_else(|| exn::Exn::from(MediaErrorKind::MissingMetadata))?;
        OffsetDateTime::from_unix_timestamp(seconds)
            .map_err(|err| exn::Exn::from(MediaErrorKind::InvalidMetadata(err.to_string())))
    }
}

/// File contents that [`Stamp`] reads as created at `seconds`.
pub(crate) fn stamped(seconds: i64) -> Vec<u8> {
    format!("ts:{seconds}").into_bytes()
}

pub(crate) fn gallery_with(source: &Arc<MockSource>, options: GalleryOptions) -> Gallery {
    let handle: SourceHandle = source.clone();
    Gallery::new(handle, Arc::new(Labeler), Arc::new(Stamp), options)
}

pub(crate) fn gallery(source: &Arc<MockSource>) -> Gallery {
    gallery_with(source, GalleryOptions::default())
}
