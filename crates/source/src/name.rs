//! Path validation.
//!
//! Sources address files by a path relative to their root, which must never
//! escape it.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a path relative to a source root.
///
/// `.` components and repeated separators are dropped, `..` is resolved as
/// long as it never climbs above the root. Null bytes, Windows prefixes and
/// paths that normalize to nothing are rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use gallery_source::validate_path;
///
/// assert_eq!(validate_path("photos/./2015//a.jpg").unwrap(), Path::new("photos/2015/a.jpg"));
/// assert!(validate_path("../a.jpg").is_err());
/// assert!(validate_path("photos/../../a.jpg").is_err());
/// ```
pub fn validate_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(path.to_path_buf());
    let mut normal = Vec::new();
    for component in path.components() {
        match component {
            // Null bytes survive Path::components() on Unix but truncate in syscalls.
            Component::Normal(part) if part.as_encoded_bytes().contains(&0) => exn::bail!(invalid()),
            Component::Normal(part) => normal.push(part),
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if normal.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if normal.is_empty() {
        exn::bail!(invalid());
    }
    Ok(normal.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        assert_eq!(validate_path("photos/a.jpg").unwrap(), Path::new("photos/a.jpg"));
        assert_eq!(validate_path("a.jpg").unwrap(), Path::new("a.jpg"));
        assert_eq!(validate_path("/photos/a.jpg").unwrap(), Path::new("photos/a.jpg"));
        assert_eq!(validate_path("photos/2015/..").unwrap(), Path::new("photos"));
    }

    #[test]
    fn test_traversal_attempts() {
        assert!(validate_path("../etc/passwd").is_err());
        assert!(validate_path("a/../../b").is_err());
        assert!(validate_path("..").is_err());
    }

    #[test]
    fn test_empty_paths() {
        assert!(validate_path("").is_err());
        assert!(validate_path(".").is_err());
        assert!(validate_path("//").is_err());
        assert!(validate_path("a\0b").is_err());
    }
}
