//! Filesystem helpers shared by the walker, the collision guard and the orchestrator.
//!
//! Every occupancy check here uses `symlink_metadata` rather than `exists`:
//! the merge tree is made of symbolic links, and a dangling link still
//! occupies its path.

use crate::error::{io_at, Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Returns `true` if anything (file, directory, or link, even a dangling one) sits at `path`.
pub fn path_occupied(path: &Utf8Path) -> bool {
    fs::symlink_metadata(path.as_std_path()).is_ok()
}

/// Returns `true` if `link` is a symbolic link whose target is exactly `target`.
pub fn link_points_to(link: &Utf8Path, target: &Utf8Path) -> bool {
    match fs::read_link(link.as_std_path()) {
        Ok(existing) => existing == target.as_std_path(),
        Err(_) => false,
    }
}

/// Create a symbolic link at `link` pointing to `target`.
///
/// `is_dir` only matters on Windows, where file and directory links differ.
pub fn make_symlink(target: &Utf8Path, link: &Utf8Path, is_dir: bool) -> Result<()> {
    #[cfg(unix)]
    {
        let _ = is_dir;
        std::os::unix::fs::symlink(target.as_std_path(), link.as_std_path()).map_err(io_at(link))
    }

    #[cfg(windows)]
    {
        if is_dir {
            std::os::windows::fs::symlink_dir(target.as_std_path(), link.as_std_path())
                .map_err(io_at(link))
        } else {
            std::os::windows::fs::symlink_file(target.as_std_path(), link.as_std_path())
                .map_err(io_at(link))
        }
    }
}

/// Create `path` (and parents) unless a directory already exists there.
///
/// Returns `true` if the directory was created by this call.
pub fn ensure_dir(path: &Utf8Path) -> Result<bool> {
    if path.as_std_path().is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path.as_std_path()).map_err(io_at(path))?;
    Ok(true)
}

/// Join the components of a relative path with `/`.
///
/// Used for report keys so they read the same on every platform.
pub fn normalize_rel_key(rel_path: &Utf8Path) -> String {
    rel_path
        .components()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

/// Make `path` absolute against the current directory without resolving links.
///
/// Link targets written into the output tree must be absolute, or they would
/// resolve relative to the link's own directory.
pub fn absolute_utf8(path: &Utf8Path) -> Result<Utf8PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let absolute = std::path::absolute(path.as_std_path()).map_err(io_at(path))?;
    Utf8PathBuf::from_path_buf(absolute).map_err(Error::NonUtf8Path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    #[test]
    fn test_normalize_rel_key() {
        let path = Utf8PathBuf::from("common").join("buildings").join("x.txt");
        assert_eq!(normalize_rel_key(&path), "common/buildings/x.txt");
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let dir = tempdir().unwrap();
        let target = utf8(dir.path()).join("a").join("b");

        assert!(ensure_dir(&target).unwrap());
        assert!(!ensure_dir(&target).unwrap());
        assert!(target.is_dir());
    }

    #[test]
    fn test_absolute_keeps_absolute_paths() {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        assert_eq!(absolute_utf8(&root).unwrap(), root);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_occupies_path() {
        let dir = tempdir().unwrap();
        let root = utf8(dir.path());
        let link = root.join("dangling");

        make_symlink(&root.join("missing.txt"), &link, false).unwrap();

        assert!(!link.exists());
        assert!(path_occupied(&link));
        assert!(link_points_to(&link, &root.join("missing.txt")));
        assert!(!link_points_to(&link, &root.join("other.txt")));
    }
}
