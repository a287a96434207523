//! The serial backend extension.

use crate::config::{SerialConfig, StorageMode};
use crate::factory::SerialDaoFactory;
use crate::store::SerialStore;
use entiorm_core::{CoreError, CoreResult, DaoFactory, DatabaseSettings, Extension};
use entiorm_storage::{FileStore, SnapshotStore};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// Snapshot file extension.
pub const SNAPSHOT_EXTENSION: &str = "ser";

/// Keeps entity tables in memory and persists them as one snapshot,
/// `<directory>/<name>.ser`, when the database stops.
///
/// The snapshot is held exclusively for as long as the database is
/// started: in file mode through a lock on `<name>.ser.lock`, in memory
/// mode through a lease on the volume's `<name>.ser` slot.
#[derive(Debug)]
pub struct SerialExtension {
    config: SerialConfig,
    store: Arc<SerialStore>,
    factory: Mutex<Option<Arc<SerialDaoFactory>>>,
}

impl SerialExtension {
    /// Creates an extension with `config`.
    pub fn new(config: SerialConfig) -> Self {
        Self {
            config,
            store: Arc::new(SerialStore::new()),
            factory: Mutex::new(None),
        }
    }

    /// The extension's configuration.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Path of the snapshot file for `name`.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if `name` is empty or contains a path separator.
    pub fn snapshot_path(&self, name: &str) -> CoreResult<PathBuf> {
        if name.is_empty() {
            return Err(CoreError::invalid_operation("database name must not be empty"));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(CoreError::invalid_operation(format!(
                "database name {name:?} is not a plain file name"
            )));
        }
        Ok(self
            .config
            .directory
            .join(format!("{name}.{SNAPSHOT_EXTENSION}")))
    }

    fn open_snapshot(&self, name: &str) -> CoreResult<Box<dyn SnapshotStore>> {
        let path = self.snapshot_path(name)?;
        let snapshot: Box<dyn SnapshotStore> = match &self.config.storage {
            StorageMode::File => Box::new(FileStore::open(&path, self.config.create_dirs)?),
            StorageMode::Memory(volume) => Box::new(volume.open(&path)?),
        };
        Ok(snapshot)
    }
}

impl Default for SerialExtension {
    fn default() -> Self {
        Self::new(SerialConfig::default())
    }
}

impl Extension for SerialExtension {
    fn kind(&self) -> &str {
        "serial"
    }

    fn uri(&self, settings: &DatabaseSettings) -> CoreResult<String> {
        let path = self.snapshot_path(settings.name())?;
        Ok(match self.config.storage {
            StorageMode::File => path.display().to_string(),
            StorageMode::Memory(_) => format!("memory:{}", path.display()),
        })
    }

    fn dao_factory(&self) -> CoreResult<Arc<dyn DaoFactory>> {
        let mut slot = self.factory.lock();
        let factory =
            slot.get_or_insert_with(|| Arc::new(SerialDaoFactory::new(Arc::clone(&self.store))));
        Ok(Arc::clone(factory) as Arc<dyn DaoFactory>)
    }

    fn on_start(&self, settings: &DatabaseSettings) -> CoreResult<()> {
        let snapshot = self.open_snapshot(settings.name())?;
        self.store.open(snapshot)?;
        Ok(())
    }

    fn on_stop(&self, _settings: &DatabaseSettings) -> CoreResult<()> {
        self.store.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entiorm_storage::{MemoryVolume, StorageError};

    #[test]
    fn uri_names_snapshot_file() {
        let extension = SerialExtension::new(SerialConfig::new().directory("/data"));
        let uri = extension.uri(&DatabaseSettings::new("db1", 0)).unwrap();
        assert!(uri.ends_with("db1.ser"));
        assert!(uri.starts_with("/data"));
    }

    #[test]
    fn uri_rejects_bad_names() {
        let extension = SerialExtension::default();
        for name in ["", "a/b", "..", "c\\d"] {
            assert!(
                extension.uri(&DatabaseSettings::new(name, 0)).is_err(),
                "{name:?} accepted"
            );
        }
    }

    #[test]
    fn memory_uri() {
        let extension = SerialExtension::new(SerialConfig::in_memory());
        let uri = extension.uri(&DatabaseSettings::new("db1", 0)).unwrap();
        assert!(uri.starts_with("memory:"));
        assert!(uri.ends_with("db1.ser"));
    }

    #[test]
    fn factory_is_created_once() {
        let extension = SerialExtension::new(SerialConfig::in_memory());
        let first = extension.dao_factory().unwrap();
        let second = extension.dao_factory().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn start_and_stop_write_snapshot() {
        let volume = MemoryVolume::new();
        let extension =
            SerialExtension::new(SerialConfig::new().storage(StorageMode::Memory(volume.clone())));
        let settings = DatabaseSettings::new("db1", 0);
        let path = extension.snapshot_path("db1").unwrap();

        extension.on_start(&settings).unwrap();
        assert!(extension.store.is_open());
        assert!(volume.is_leased(&path));
        extension.on_stop(&settings).unwrap();
        assert!(!extension.store.is_open());
        assert!(!volume.is_leased(&path));
        assert!(volume.data(&path).is_some());
    }

    #[test]
    fn memory_mode_leases_snapshot() {
        let config = SerialConfig::in_memory();
        let settings = DatabaseSettings::new("db1", 0);

        let first = SerialExtension::new(config.clone());
        first.on_start(&settings).unwrap();

        let second = SerialExtension::new(config.clone());
        assert!(matches!(
            second.on_start(&settings),
            Err(CoreError::Storage(StorageError::Locked { .. }))
        ));
        let other = SerialExtension::new(config);
        other.on_start(&DatabaseSettings::new("db2", 0)).unwrap();

        first.on_stop(&settings).unwrap();
        second.on_start(&settings).unwrap();
        second.on_stop(&settings).unwrap();
    }

    #[test]
    fn file_mode_locks_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = SerialConfig::new().directory(dir.path());
        let settings = DatabaseSettings::new("db1", 0);

        let first = SerialExtension::new(config.clone());
        first.on_start(&settings).unwrap();

        let second = SerialExtension::new(config);
        assert!(matches!(
            second.on_start(&settings),
            Err(CoreError::Storage(StorageError::Locked { .. }))
        ));

        first.on_stop(&settings).unwrap();
        assert!(dir.path().join("db1.ser").exists());
        second.on_start(&settings).unwrap();
        second.on_stop(&settings).unwrap();
    }
}
