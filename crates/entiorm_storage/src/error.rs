//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by storage backends.
///
/// These cover both the byte-level snapshot stores in this crate and the
/// record-level failures a backend reports from its Dao operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored data could not be interpreted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The store has been closed.
    #[error("storage is closed")]
    Closed,

    /// The store is already open.
    #[error("storage is already open")]
    AlreadyOpen,

    /// Another handle holds the exclusive lock on the store.
    #[error("storage locked: {}", path.display())]
    Locked {
        /// Path of the lock file.
        path: PathBuf,
    },

    /// A record with this key already exists.
    #[error("duplicate key {key} in {entity}")]
    DuplicateKey {
        /// Entity storage name.
        entity: String,
        /// Rendered key value.
        key: String,
    },

    /// No record exists for this key.
    #[error("no record with key {key} in {entity}")]
    KeyNotFound {
        /// Entity storage name.
        entity: String,
        /// Rendered key value.
        key: String,
    },

    /// A record did not carry its primary-key attribute.
    #[error("record for {entity} has no value for key attribute {attribute}")]
    MissingKey {
        /// Entity storage name.
        entity: String,
        /// Name of the primary-key attribute.
        attribute: String,
    },

    /// Encoding or decoding a record failed.
    #[error("codec error: {0}")]
    Codec(#[from] entiorm_codec::CodecError),
}

impl StorageError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Creates a duplicate key error.
    pub fn duplicate_key(entity: impl Into<String>, key: impl ToString) -> Self {
        Self::DuplicateKey {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    /// Creates a key not found error.
    pub fn key_not_found(entity: impl Into<String>, key: impl ToString) -> Self {
        Self::KeyNotFound {
            entity: entity.into(),
            key: key.to_string(),
        }
    }
}
