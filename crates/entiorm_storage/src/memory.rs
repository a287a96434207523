//! In-memory snapshot stores.

use crate::backend::SnapshotStore;
use crate::error::{StorageError, StorageResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// An in-memory snapshot store.
///
/// Clones share the same slot, so a test can hand one clone to a database,
/// close it, and reopen another database on a second clone to observe the
/// persisted snapshot.
///
/// # Example
///
/// ```rust
/// use entiorm_storage::{InMemoryStore, SnapshotStore};
///
/// let mut store = InMemoryStore::new();
/// assert!(store.load().unwrap().is_none());
///
/// store.store(b"state").unwrap();
/// assert_eq!(store.load().unwrap().as_deref(), Some(&b"state"[..]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    slot: Arc<RwLock<Option<Vec<u8>>>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds a snapshot.
    ///
    /// Useful for testing recovery of malformed data.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(data))),
        }
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.slot.read().clone()
    }
}

impl SnapshotStore for InMemoryStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.slot.read().clone())
    }

    fn store(&mut self, data: &[u8]) -> StorageResult<()> {
        *self.slot.write() = Some(data.to_vec());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct VolumeEntry {
    store: InMemoryStore,
    leased: bool,
}

/// A set of in-memory snapshots keyed by path.
///
/// The in-memory counterpart of a snapshot directory: each path names its
/// own slot, and [`MemoryVolume::open`] hands out at most one
/// [`MemoryLease`] per path at a time. Clones share the same slots.
///
/// # Example
///
/// ```rust
/// use entiorm_storage::{MemoryVolume, SnapshotStore, StorageError};
/// use std::path::Path;
///
/// let volume = MemoryVolume::new();
/// let mut lease = volume.open(Path::new("app.ser")).unwrap();
/// lease.store(b"state").unwrap();
///
/// assert!(matches!(
///     volume.open(Path::new("app.ser")),
///     Err(StorageError::Locked { .. })
/// ));
/// drop(lease);
/// assert_eq!(volume.data(Path::new("app.ser")).unwrap(), b"state");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryVolume {
    entries: Arc<Mutex<HashMap<PathBuf, VolumeEntry>>>,
}

impl MemoryVolume {
    /// Creates an empty volume.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the slot at `path`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `Locked` while another lease on `path` is alive.
    pub fn open(&self, path: &Path) -> StorageResult<MemoryLease> {
        let mut entries = self.entries.lock();
        let entry = entries.entry(path.to_path_buf()).or_default();
        if entry.leased {
            return Err(StorageError::Locked {
                path: path.to_path_buf(),
            });
        }
        entry.leased = true;
        debug!(path = %path.display(), "leased memory snapshot");

        Ok(MemoryLease {
            volume: self.clone(),
            path: path.to_path_buf(),
            store: entry.store.clone(),
        })
    }

    /// Returns a copy of the snapshot at `path`.
    #[must_use]
    pub fn data(&self, path: &Path) -> Option<Vec<u8>> {
        self.entries.lock().get(path).and_then(|e| e.store.data())
    }

    /// Whether a lease on `path` is alive.
    #[must_use]
    pub fn is_leased(&self, path: &Path) -> bool {
        self.entries.lock().get(path).is_some_and(|e| e.leased)
    }
}

/// Exclusive access to one slot of a [`MemoryVolume`].
///
/// The slot is released when the lease is dropped.
#[derive(Debug)]
pub struct MemoryLease {
    volume: MemoryVolume,
    path: PathBuf,
    store: InMemoryStore,
}

impl MemoryLease {
    /// The slot's path within its volume.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for MemoryLease {
    fn location(&self) -> String {
        format!("memory:{}", self.path.display())
    }

    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        self.store.load()
    }

    fn store(&mut self, data: &[u8]) -> StorageResult<()> {
        self.store.store(data)
    }
}

impl Drop for MemoryLease {
    fn drop(&mut self) {
        if let Some(entry) = self.volume.entries.lock().get_mut(&self.path) {
            entry.leased = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.load().unwrap().is_none());
        assert!(store.data().is_none());
    }

    #[test]
    fn memory_store_replaces_snapshot() {
        let mut store = InMemoryStore::new();
        store.store(b"first").unwrap();
        store.store(b"second").unwrap();
        assert_eq!(store.load().unwrap().unwrap(), b"second");
    }

    #[test]
    fn memory_clones_share_slot() {
        let mut store = InMemoryStore::new();
        let observer = store.clone();
        store.store(b"shared").unwrap();
        assert_eq!(observer.data().unwrap(), b"shared");
    }

    #[test]
    fn memory_with_data() {
        let store = InMemoryStore::with_data(b"preloaded".to_vec());
        assert_eq!(store.load().unwrap().unwrap(), b"preloaded");
    }

    #[test]
    fn volume_paths_are_separate() {
        let volume = MemoryVolume::new();
        let mut alpha = volume.open(Path::new("alpha.ser")).unwrap();
        alpha.store(b"alpha").unwrap();

        let beta = volume.open(Path::new("beta.ser")).unwrap();
        assert!(beta.load().unwrap().is_none());
        assert_eq!(volume.data(Path::new("alpha.ser")).unwrap(), b"alpha");
        assert!(volume.data(Path::new("beta.ser")).is_none());
    }

    #[test]
    fn volume_second_lease_is_locked() {
        let volume = MemoryVolume::new();
        let path = Path::new("app.ser");

        let first = volume.open(path).unwrap();
        assert!(volume.is_leased(path));
        assert!(matches!(
            volume.clone().open(path),
            Err(StorageError::Locked { .. })
        ));

        drop(first);
        assert!(!volume.is_leased(path));
        volume.open(path).unwrap();
    }

    #[test]
    fn volume_keeps_snapshot_across_leases() {
        let volume = MemoryVolume::new();
        let path = Path::new("app.ser");

        {
            let mut lease = volume.open(path).unwrap();
            lease.store(b"kept").unwrap();
        }

        let lease = volume.open(path).unwrap();
        assert_eq!(lease.load().unwrap().unwrap(), b"kept");
        assert_eq!(lease.location(), "memory:app.ser");
    }
}
