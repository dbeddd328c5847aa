//! Local filesystem source.
//!
//! Serves a folder on the local filesystem as if it were a remote one. There
//! is no native content hash or revision, so the revision token is a BLAKE3
//! digest of the listing itself: cheap to compare, changes whenever any file
//! is added, removed, resized or touched.

use super::{ByteStream, RemoteSource};
use crate::error::{ErrorKind, Result};
use crate::models::{Listing, RemoteItem, Revision};
use crate::name::validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::fs::{Metadata, create_dir_all as sync_create_dir};
use std::path::{Component, Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Chunk size used by [`LocalSource::download_stream`].
const CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem source.
///
/// All paths are relative to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use gallery_source::source::LocalSource;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = LocalSource::new("local", "/srv/photos")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalSource {
    name: String,
    /// Root directory that all listed and downloaded paths are relative to
    root: PathBuf,
}
impl LocalSource {
    /// Create a new local filesystem source.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the root is not
    /// absolute and [`NotADirectory`](ErrorKind::NotADirectory) if it exists
    /// but is a file. A missing root is created.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::NotADirectory(root));
            }
        } else {
            // Only happens once at startup, not worth making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    /// Resolve a folder relative to the root. Unlike file paths, a folder may
    /// be the root itself (`""`, `"."` or `"/"`).
    fn relative_folder(folder: &Path) -> Result<PathBuf> {
        let is_root = folder.components().all(|c| matches!(c, Component::CurDir | Component::RootDir));
        match is_root {
            true => Ok(PathBuf::new()),
            false => validate_path(folder),
        }
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// A local folder has a single modification clock, so it is reported as
    /// both the client and the server modification time.
    fn item(relative: PathBuf, metadata: &Metadata) -> Result<RemoteItem> {
        let modified: OffsetDateTime = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(RemoteItem::new(relative, metadata.len(), modified, modified))
    }

    fn revision(items: &[RemoteItem]) -> Revision {
        let mut hasher = blake3::Hasher::new();
        for item in items {
            hasher.update(item.path.as_os_str().as_encoded_bytes());
            hasher.update(&item.size.to_le_bytes());
            hasher.update(&item.modified_client.unix_timestamp_nanos().to_le_bytes());
            hasher.update(&item.modified_server.unix_timestamp_nanos().to_le_bytes());
        }
        Revision::new(hasher.finalize().to_hex().to_string())
    }
}

#[async_trait]
impl RemoteSource for LocalSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list(&self, folder: &Path, since: Option<&Revision>) -> Result<Listing> {
        let relative = Self::relative_folder(folder)?;
        let absolute = self.root.join(&relative);
        let metadata = fs::metadata(&absolute).await.map_err(|e| Self::map_io_error(e, folder))?;
        if !metadata.is_dir() {
            exn::bail!(ErrorKind::NotADirectory(absolute));
        }

        let mut entries = fs::read_dir(&absolute).await.map_err(|e| Self::map_io_error(e, folder))?;
        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Self::map_io_error(e, folder))? {
            let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &entry.path()))?;
            // Folders are not descended into.
            if !metadata.is_file() {
                tracing::debug!(path = %entry.path().display(), "Skipping entry that is not a file");
                continue;
            }
            items.push(Self::item(relative.join(entry.file_name()), &metadata)?);
        }
        // Directory order is arbitrary; the revision must not be.
        items.sort_by(|a, b| a.path.cmp(&b.path));

        let revision = Self::revision(&items);
        if since == Some(&revision) {
            return Ok(Listing::Unchanged);
        }
        Ok(Listing::Changed { revision, items })
    }

    fn download_stream<'a>(&'a self, path: &'a Path) -> ByteStream<'a> {
        Box::pin(stream! {
            let absolute = match validate_path(path) {
                Ok(relative) => self.root.join(relative),
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            let mut file = match fs::File::open(&absolute).await {
                Ok(file) => file,
                Err(e) => {
                    yield Err(exn::Exn::from(Self::map_io_error(e, path)));
                    return;
                },
            };
            loop {
                let mut buffer = vec![0; CHUNK_SIZE];
                match file.read(&mut buffer).await {
                    Ok(0) => break,
                    Ok(read) => {
                        buffer.truncate(read);
                        yield Ok(buffer);
                    },
                    Err(e) => {
                        yield Err(exn::Exn::from(Self::map_io_error(e, path)));
                        return;
                    },
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> (tempfile::TempDir, LocalSource) {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = LocalSource::new("local", temp_dir.path()).unwrap();
        (temp_dir, source)
    }

    fn changed(listing: Listing) -> (Revision, Vec<RemoteItem>) {
        match listing {
            Listing::Changed { revision, items } => (revision, items),
            Listing::Unchanged => panic!("expected a changed listing"),
        }
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalSource::new("local", temp_dir.path()).is_ok());
        assert!(LocalSource::new("local", "relative/path").is_err());
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("file.jpg");
        std::fs::write(&file, b"data").unwrap();
        let err = LocalSource::new("local", &file).err().unwrap();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_list_folder() {
        let (temp_dir, source) = source();
        std::fs::create_dir_all(temp_dir.path().join("photos/nested")).unwrap();
        std::fs::write(temp_dir.path().join("photos/b.jpg"), b"bb").unwrap();
        std::fs::write(temp_dir.path().join("photos/a.jpg"), b"a").unwrap();
        std::fs::write(temp_dir.path().join("photos/nested/c.jpg"), b"ccc").unwrap();

        let (_, items) = changed(source.list(Path::new("photos"), None).await.unwrap());
        let paths: Vec<_> = items.iter().map(|i| i.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("photos/a.jpg"), PathBuf::from("photos/b.jpg")]);
        assert_eq!(items[1].size, 2);
        assert_eq!(items[0].file_name(), Some("a.jpg"));
        assert!(items.iter().all(|i| i.content_hash.is_none()));
    }

    #[tokio::test]
    async fn test_list_reports_file_modification_time() {
        let (temp_dir, source) = source();
        let path = temp_dir.path().join("old.jpg");
        std::fs::write(&path, b"old").unwrap();
        let mtime = std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        std::fs::File::options().write(true).open(&path).unwrap().set_modified(mtime).unwrap();

        let (_, items) = changed(source.list(Path::new(""), None).await.unwrap());
        let expected = OffsetDateTime::from(mtime);
        assert_eq!(items[0].modified_client, expected);
        assert_eq!(items[0].modified_server, expected);
    }

    #[tokio::test]
    async fn test_list_root_folder() {
        let (temp_dir, source) = source();
        std::fs::write(temp_dir.path().join("a.jpg"), b"a").unwrap();
        let (_, items) = changed(source.list(Path::new("."), None).await.unwrap());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path, PathBuf::from("a.jpg"));
    }

    #[tokio::test]
    async fn test_list_unchanged_revision() {
        let (temp_dir, source) = source();
        std::fs::write(temp_dir.path().join("a.jpg"), b"a").unwrap();
        let (revision, _) = changed(source.list(Path::new(""), None).await.unwrap());
        let again = source.list(Path::new(""), Some(&revision)).await.unwrap();
        assert_eq!(again, Listing::Unchanged);

        std::fs::write(temp_dir.path().join("b.jpg"), b"b").unwrap();
        let (next, items) = changed(source.list(Path::new(""), Some(&revision)).await.unwrap());
        assert_ne!(next, revision);
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_list_file_is_not_a_directory() {
        let (temp_dir, source) = source();
        std::fs::write(temp_dir.path().join("a.jpg"), b"a").unwrap();
        let err = source.list(Path::new("a.jpg"), None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_list_missing_folder() {
        let (_temp_dir, source) = source();
        let err = source.list(Path::new("missing"), None).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_download() {
        let (temp_dir, source) = source();
        let data: Vec<u8> = (0..(CHUNK_SIZE * 2 + 10)).map(|i| (i % 251) as u8).collect();
        std::fs::write(temp_dir.path().join("big.jpg"), &data).unwrap();
        assert_eq!(source.download(Path::new("big.jpg")).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_download_not_found() {
        let (_temp_dir, source) = source();
        let err = source.download(Path::new("missing.jpg")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_path_security() {
        let (_temp_dir, source) = source();
        assert!(source.download(Path::new("../etc/passwd")).await.is_err());
        assert!(source.list(Path::new("../"), None).await.is_err());
    }
}
