//! Filesystem access used by the organizer.
//!
//! Planning and execution go through the [`FileSystem`] trait so tests can
//! substitute an in-memory listing and fake moves.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A directory entry as seen at organize time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// File name, lossily converted to UTF-8 for matching.
    pub name: String,
    /// Full path of the entry.
    pub path: PathBuf,
    /// Hidden by the platform convention.
    pub is_hidden: bool,
    /// A directory, or a symlink to one.
    pub is_dir: bool,
}

impl DirectoryEntry {
    /// Builds an entry for `path`, deriving the name and Unix hidden flag.
    pub fn new(path: PathBuf, is_dir: bool) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let is_hidden = name.starts_with('.');
        Self {
            name,
            path,
            is_hidden,
            is_dir,
        }
    }
}

/// The filesystem operations the organizer depends on.
pub trait FileSystem {
    /// Lists the entries directly inside `dir`.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirectoryEntry>>;

    /// Returns true if `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Creates `path` and any missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Moves a file from `from` to `to`.
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Resolves `path` to an absolute path without symlinks.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirectoryEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            let is_dir = if file_type.is_symlink() {
                path.is_dir()
            } else {
                file_type.is_dir()
            };

            let mut dir_entry = DirectoryEntry::new(path, is_dir);
            if !dir_entry.is_hidden {
                dir_entry.is_hidden = has_hidden_attribute(&entry);
            }
            entries.push(dir_entry);
        }
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        // symlink_metadata so a dangling symlink still counts as occupied
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                copy_then_remove(from, to, |path| fs::remove_file(path))
            }
            Err(e) => Err(e),
        }
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}

/// Moves a file by copying it and removing the source.
///
/// If the source cannot be removed, the copy is deleted again so the file
/// exists in exactly one place.
fn copy_then_remove<R>(from: &Path, to: &Path, remove_source: R) -> io::Result<()>
where
    R: FnOnce(&Path) -> io::Result<()>,
{
    fs::copy(from, to)?;
    if let Err(e) = remove_source(from) {
        if let Err(cleanup) = fs::remove_file(to) {
            tracing::error!(
                destination = %to.display(),
                error = %cleanup,
                "failed to remove copy after a failed move"
            );
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(windows)]
fn has_hidden_attribute(entry: &fs::DirEntry) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

    entry
        .metadata()
        .map(|m| m.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

#[cfg(not(windows))]
fn has_hidden_attribute(_entry: &fs::DirEntry) -> bool {
    false
}
