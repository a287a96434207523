//! Serial backend configuration.

use entiorm_storage::MemoryVolume;
use std::path::PathBuf;

/// Where snapshots are kept.
#[derive(Debug, Clone)]
pub enum StorageMode {
    /// A `<name>.ser` file under the configured directory.
    File,
    /// A `<name>.ser` slot in an in-memory volume. Clones of the volume
    /// see the same snapshots.
    Memory(MemoryVolume),
}

/// Configuration for the serial backend.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Directory holding snapshot files.
    pub directory: PathBuf,

    /// Snapshot location.
    pub storage: StorageMode,

    /// Whether to create `directory` if it doesn't exist.
    pub create_dirs: bool,

    /// Whether `build()` fails without credentials.
    pub require_credentials: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            storage: StorageMode::File,
            create_dirs: true,
            require_credentials: true,
        }
    }
}

impl SerialConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration keeping snapshots in a fresh in-memory volume.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default().storage(StorageMode::Memory(MemoryVolume::new()))
    }

    /// Sets the snapshot directory.
    #[must_use]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Sets the snapshot location.
    #[must_use]
    pub fn storage(mut self, storage: StorageMode) -> Self {
        self.storage = storage;
        self
    }

    /// Sets whether to create the snapshot directory.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    /// Sets whether credentials are mandatory.
    #[must_use]
    pub const fn require_credentials(mut self, value: bool) -> Self {
        self.require_credentials = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SerialConfig::default();
        assert_eq!(config.directory, PathBuf::from("."));
        assert!(matches!(config.storage, StorageMode::File));
        assert!(config.create_dirs);
        assert!(config.require_credentials);
    }

    #[test]
    fn builder_pattern() {
        let config = SerialConfig::new()
            .directory("/var/lib/app")
            .create_dirs(false)
            .require_credentials(false);

        assert_eq!(config.directory, PathBuf::from("/var/lib/app"));
        assert!(!config.create_dirs);
        assert!(!config.require_credentials);
        assert!(matches!(
            SerialConfig::in_memory().storage,
            StorageMode::Memory(_)
        ));
    }
}
