use crate::size::ThumbnailSize;
use derive_more::Display;
use gallery_store::CacheKey;

/// Everything the gallery caches, addressed by catalog name.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
pub enum PhotoKey {
    /// The bytes of a photo exactly as stored remotely.
    #[display("{_0}")]
    Original(String),
    /// A resized copy of an original.
    #[display("{name}@{size}")]
    Thumbnail { name: String, size: ThumbnailSize },
}

impl PhotoKey {
    pub fn original(name: impl Into<String>) -> Self {
        Self::Original(name.into())
    }

    pub fn thumbnail(name: impl Into<String>, size: ThumbnailSize) -> Self {
        Self::Thumbnail { name: name.into(), size }
    }

    /// Catalog name of the photo this key belongs to.
    pub fn name(&self) -> &str {
        match self {
            Self::Original(name) | Self::Thumbnail { name, .. } => name,
        }
    }
}

impl CacheKey for PhotoKey {
    fn dependencies(&self) -> Vec<Self> {
        match self {
            Self::Original(_) => vec![],
            Self::Thumbnail { name, .. } => vec![Self::Original(name.clone())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(PhotoKey::original("a.jpg").to_string(), "a.jpg");
        let size = ThumbnailSize { width: 200, height: 100 };
        assert_eq!(PhotoKey::thumbnail("a.jpg", size).to_string(), "a.jpg@200x100");
    }

    #[test]
    fn dependencies() {
        let size = ThumbnailSize { width: 200, height: 200 };
        assert!(PhotoKey::original("a.jpg").dependencies().is_empty());
        assert_eq!(PhotoKey::thumbnail("a.jpg", size).dependencies(), vec![PhotoKey::original("a.jpg")]);
        assert_eq!(PhotoKey::thumbnail("a.jpg", size).name(), "a.jpg");
    }

    #[test]
    fn identity() {
        let size = ThumbnailSize { width: 200, height: 200 };
        assert_eq!(PhotoKey::thumbnail("a.jpg", size), PhotoKey::thumbnail("a.jpg".to_string(), size));
        assert_ne!(PhotoKey::thumbnail("a.jpg", size), PhotoKey::thumbnail("b.jpg", size));
        assert_ne!(PhotoKey::original("a.jpg"), PhotoKey::thumbnail("a.jpg", size));
    }
}
