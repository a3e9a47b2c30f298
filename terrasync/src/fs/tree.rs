//! Local directory inspection and guarded removal.
//!
//! Listing is one level deep: the engine compares each local directory with
//! the manifest that declares it, so it never needs a recursive walk.

use crate::manifest::DIRINDEX;
use crate::utils::{Result, SyncError};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Kind of a local filesystem node, with symlinks resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalKind {
    File,
    Directory,
}

/// One child of a local directory.
#[derive(Debug, Clone)]
pub struct LocalEntry {
    /// File name (lossy UTF-8, used for comparisons and reporting)
    pub name: String,

    /// Full path, used for removal
    pub path: PathBuf,

    pub kind: LocalKind,
}

/// What currently sits at a local path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalNode {
    Absent,
    File,
    Directory,
}

/// Inspect `path`, following symlinks.
pub fn probe(path: &Path) -> io::Result<LocalNode> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(LocalNode::Directory),
        Ok(_) => Ok(LocalNode::File),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(LocalNode::Absent),
        Err(e) => Err(e),
    }
}

/// List the direct children of `dir`, sorted by name.
///
/// Symlinks are classified by their target; a broken symlink counts as a file.
pub fn list_directory(dir: &Path) -> io::Result<Vec<LocalEntry>> {
    let mut entries = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry?;
        let file_type = entry.file_type();

        let kind = if file_type.is_dir() {
            LocalKind::Directory
        } else if file_type.is_symlink() {
            match std::fs::metadata(entry.path()) {
                Ok(resolved) if resolved.is_dir() => LocalKind::Directory,
                _ => LocalKind::File,
            }
        } else {
            LocalKind::File
        };

        entries.push(LocalEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path().to_path_buf(),
            kind,
        });
    }

    Ok(entries)
}

/// Recursively delete `target`, which must live under `base`.
///
/// Refuses (with [`SyncError::User`]) when `target` is not strictly below
/// `base`, when it resolves to a well-known system location such as `/`,
/// `/home/<user>` or a drive root, or when it has no `.dirindex` file at its
/// top level (it was never populated by terrasync).
pub fn remove_directory_tree(base: &Path, target: &Path) -> Result<()> {
    if !base.is_dir() {
        return Err(SyncError::User(format!(
            "base directory '{}' does not exist",
            base.display()
        )));
    }

    match target.strip_prefix(base) {
        Ok(rest) if !rest.as_os_str().is_empty() => {}
        _ => {
            return Err(SyncError::User(format!(
                "refusing to recursively delete '{}': not inside '{}'",
                target.display(),
                base.display()
            )));
        }
    }

    let absolute = std::path::absolute(target)?;

    if is_dangerous(&absolute) {
        return Err(SyncError::User(format!(
            "in order to protect your data, refusing to recursively delete '{}'",
            absolute.display()
        )));
    }

    if !absolute.join(DIRINDEX).is_file() {
        return Err(SyncError::User(format!(
            "refusing to recursively delete '{}': it has no {} file",
            absolute.display(),
            DIRINDEX
        )));
    }

    std::fs::remove_dir_all(&absolute)?;
    Ok(())
}

/// True for `/`, `/home`, `/home/<user>`, the user's home directory and
/// Windows drive roots.
fn is_dangerous(path: &Path) -> bool {
    if let Some(home) = std::env::var_os("HOME") {
        if !home.is_empty() && path == Path::new(&home) {
            return true;
        }
    }

    let text = path.to_string_lossy();

    let unix = text.trim_end_matches('/');
    if unix.is_empty() || unix == "/home" {
        return true;
    }
    if let Some(user) = unix.strip_prefix("/home/") {
        if !user.contains('/') {
            return true;
        }
    }

    let bytes = text.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && bytes[2..].iter().all(|&b| b == b'/' || b == b'\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_list_directory_sorted_with_kinds() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("b.btg.gz"), b"x")?;
        fs::create_dir(temp_dir.path().join("a-dir"))?;
        fs::write(temp_dir.path().join(".dirindex"), b"path:")?;
        fs::write(temp_dir.path().join("a-dir/nested"), b"not listed")?;

        let entries = list_directory(temp_dir.path())?;
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![".dirindex", "a-dir", "b.btg.gz"]);
        assert_eq!(entries[1].kind, LocalKind::Directory);
        assert_eq!(entries[2].kind, LocalKind::File);
        Ok(())
    }

    #[test]
    fn test_list_missing_directory_fails() {
        assert!(list_directory(Path::new("/nonexistent/terrasync/dir")).is_err());
    }

    #[test]
    fn test_probe() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join("file"), b"x")?;
        assert_eq!(probe(&temp_dir.path().join("file"))?, LocalNode::File);
        assert_eq!(probe(temp_dir.path())?, LocalNode::Directory);
        assert_eq!(probe(&temp_dir.path().join("missing"))?, LocalNode::Absent);
        Ok(())
    }

    #[test]
    fn test_dangerous_paths() {
        assert!(is_dangerous(Path::new("/")));
        assert!(is_dangerous(Path::new("/home")));
        assert!(is_dangerous(Path::new("/home/")));
        assert!(is_dangerous(Path::new("/home/pilot")));
        assert!(is_dangerous(Path::new("C:\\")));
        assert!(is_dangerous(Path::new("d:")));
        assert!(!is_dangerous(Path::new("/home/pilot/scenery")));
        assert!(!is_dangerous(Path::new("/srv/terrasync/Objects")));
    }

    #[test]
    fn test_remove_tree_with_dirindex() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let target = temp_dir.path().join("Objects");
        fs::create_dir_all(target.join("w010n50"))?;
        fs::write(target.join(DIRINDEX), b"path:Objects")?;
        fs::write(target.join("w010n50/tile.stg"), b"x")?;

        remove_directory_tree(temp_dir.path(), &target)?;
        assert!(!target.exists());
        Ok(())
    }

    #[test]
    fn test_remove_tree_refuses_unpopulated_directory() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let target = temp_dir.path().join("precious");
        fs::create_dir(&target)?;
        fs::write(target.join("notes.txt"), b"keep me")?;

        let result = remove_directory_tree(temp_dir.path(), &target);
        assert!(matches!(result, Err(SyncError::User(_))));
        assert!(target.join("notes.txt").exists());
        Ok(())
    }

    #[test]
    fn test_remove_tree_refuses_outside_base() -> io::Result<()> {
        let base = TempDir::new()?;
        let other = TempDir::new()?;
        fs::write(other.path().join(DIRINDEX), b"path:")?;

        assert!(matches!(
            remove_directory_tree(base.path(), other.path()),
            Err(SyncError::User(_))
        ));
        assert!(matches!(
            remove_directory_tree(base.path(), base.path()),
            Err(SyncError::User(_))
        ));
        assert!(other.path().exists());
        Ok(())
    }
}
