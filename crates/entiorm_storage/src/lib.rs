//! # entiorm Storage
//!
//! Snapshot stores for entiorm backends.
//!
//! A snapshot store keeps a single **opaque blob**. Backends that hold
//! their tables in memory encode them into one blob when a database
//! closes and read it back when it opens again.
//!
//! ## Design Principles
//!
//! - Stores never interpret the bytes they keep
//! - Replacing a snapshot is atomic from the reader's point of view
//! - Must be `Send + Sync` so an extension can be shared across threads
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - A single shared slot, for testing
//! - [`MemoryVolume`] - Named in-memory slots with one lease per name
//! - [`FileStore`] - For persistent storage in a single locked file
//!
//! [`StorageError`] also carries the record-level failures backends report
//! from Dao operations (duplicate keys, missing records).
//!
//! ## Example
//!
//! ```rust
//! use entiorm_storage::{InMemoryStore, SnapshotStore};
//!
//! let mut store = InMemoryStore::new();
//! store.store(b"hello world").unwrap();
//! assert_eq!(store.load().unwrap().unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::SnapshotStore;
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::{InMemoryStore, MemoryLease, MemoryVolume};
