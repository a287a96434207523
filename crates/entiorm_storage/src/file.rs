//! Single-file snapshot store.

use crate::backend::SnapshotStore;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A snapshot store backed by one file.
///
/// The store holds an exclusive advisory lock on `<file>.lock` for as long
/// as it lives, so two open databases can never write the same snapshot.
/// Writes go to `<file>.tmp` first and are renamed into place, so a crash
/// mid-write leaves the previous snapshot readable.
///
/// # Example
///
/// ```no_run
/// use entiorm_storage::{FileStore, SnapshotStore};
/// use std::path::Path;
///
/// let mut store = FileStore::open(Path::new("data/app.ser"), true).unwrap();
/// store.store(b"persistent data").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    _lock_file: File,
}

impl FileStore {
    /// Opens the store at `path` and takes its lock.
    ///
    /// The snapshot file itself is not created until the first `store`.
    ///
    /// # Errors
    ///
    /// Returns `Locked` if another handle holds the lock, or an I/O error
    /// if the parent directory is missing and `create_dirs` is false.
    pub fn open(path: &Path, create_dirs: bool) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if create_dirs {
                fs::create_dir_all(parent)?;
            } else if !parent.is_dir() {
                return Err(StorageError::Io(std::io::Error::new(
                    ErrorKind::NotFound,
                    format!("directory does not exist: {}", parent.display()),
                )));
            }
        }

        let lock_path = Self::sibling(path, "lock");
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked { path: lock_path });
        }
        debug!(path = %path.display(), "acquired snapshot lock");

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }

    #[cfg(unix)]
    fn sync_parent(&self) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            File::open(parent)?.sync_all()?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_parent(&self) -> StorageResult<()> {
        Ok(())
    }
}

impl SnapshotStore for FileStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) if data.is_empty() => Ok(None),
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&mut self, data: &[u8]) -> StorageResult<()> {
        let temp_path = Self::sibling(&self.path, "tmp");

        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;
        self.sync_parent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_missing_snapshot_loads_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("app.ser"), false).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.ser");

        let mut store = FileStore::open(&path, false).unwrap();
        store.store(b"hello").unwrap();
        assert_eq!(store.load().unwrap().unwrap(), b"hello");
        assert!(path.exists());
        assert!(!FileStore::sibling(&path, "tmp").exists());
    }

    #[test]
    fn file_persists_across_handles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.ser");

        {
            let mut store = FileStore::open(&path, false).unwrap();
            store.store(b"durable").unwrap();
        }

        let store = FileStore::open(&path, false).unwrap();
        assert_eq!(store.load().unwrap().unwrap(), b"durable");
    }

    #[test]
    fn file_second_handle_is_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.ser");

        let _first = FileStore::open(&path, false).unwrap();
        let second = FileStore::open(&path, false);
        assert!(matches!(second, Err(StorageError::Locked { .. })));
    }

    #[test]
    fn file_creates_directories_on_request() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("app.ser");

        assert!(FileStore::open(&path, false).is_err());
        let mut store = FileStore::open(&path, true).unwrap();
        store.store(b"x").unwrap();
        assert!(path.exists());
    }
}
