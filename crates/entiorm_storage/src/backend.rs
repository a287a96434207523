//! Snapshot store trait definition.

use crate::error::StorageResult;

/// A store holding one opaque snapshot blob.
///
/// Snapshot stores do not interpret the bytes they keep. A backend encodes
/// its whole state into a blob on shutdown and hands it back on startup.
///
/// # Invariants
///
/// - `load` returns exactly the bytes of the last successful `store`
/// - `load` returns `None` until something has been stored
/// - a failed `store` leaves the previous snapshot intact
/// - stores must be `Send + Sync` so an extension can be shared
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - A single shared slot, for tests
/// - [`super::MemoryLease`] - An exclusively held slot of a [`super::MemoryVolume`]
/// - [`super::FileStore`] - For persistent storage in a single file
pub trait SnapshotStore: Send + Sync {
    /// Human-readable location of the snapshot, used in logs.
    fn location(&self) -> String;

    /// Reads the current snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot exists but cannot be read.
    fn load(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the snapshot with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data could not be made durable.
    fn store(&mut self, data: &[u8]) -> StorageResult<()>;
}
