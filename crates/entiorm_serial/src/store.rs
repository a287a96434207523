//! Table state shared by the extension and its access objects.
//!
//! Rows live in memory, one table per entity, ordered by primary key. The whole state is written as one snapshot when
//! the database stops:
//!
//! ```text
//! Snapshot {
//!     format: u32,
//!     tables: { entity_name: [ Row { key: Value, record: Record } ] },
//! }
//! ```

use entiorm_codec::{from_cbor, to_cbor, Value};
use entiorm_core::Record;
use entiorm_storage::{SnapshotStore, StorageError, StorageResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Snapshot layout version written by this crate.
pub(crate) const SNAPSHOT_FORMAT: u32 = 1;

/// Rows of one entity, ordered by key.
pub(crate) type Table = BTreeMap<Value, Row>;

/// One stored row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Row {
    pub key: Value,
    pub record: Record,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    format: u32,
    tables: BTreeMap<String, Vec<Row>>,
}

#[derive(Default)]
struct State {
    snapshot: Option<Box<dyn SnapshotStore>>,
    tables: BTreeMap<String, Table>,
}

/// In-memory tables plus the snapshot store they are saved to.
///
/// The store is open between [`SerialStore::open`] and
/// [`SerialStore::close`]; every table access outside that window fails
/// with [`StorageError::Closed`].
#[derive(Default)]
pub(crate) struct SerialStore {
    state: RwLock<State>,
}

impl SerialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.state.read().snapshot.is_some()
    }

    /// Loads the snapshot held by `snapshot` and starts serving tables.
    pub fn open(&self, snapshot: Box<dyn SnapshotStore>) -> StorageResult<()> {
        let mut state = self.state.write();
        if state.snapshot.is_some() {
            return Err(StorageError::AlreadyOpen);
        }

        let tables = match snapshot.load()? {
            Some(bytes) => decode(&bytes)?,
            None => BTreeMap::new(),
        };
        info!(
            location = %snapshot.location(),
            tables = tables.len(),
            rows = tables.values().map(BTreeMap::len).sum::<usize>(),
            "loaded snapshot"
        );

        state.tables = tables;
        state.snapshot = Some(snapshot);
        Ok(())
    }

    /// Writes all tables to the snapshot and stops serving them.
    ///
    /// The store is closed and its snapshot handle released even when the
    /// write fails.
    pub fn close(&self) -> StorageResult<()> {
        let mut state = self.state.write();
        let Some(mut snapshot) = state.snapshot.take() else {
            return Ok(());
        };
        let tables = std::mem::take(&mut state.tables);
        drop(state);

        let bytes = encode(&tables)?;
        snapshot.store(&bytes)?;
        info!(
            location = %snapshot.location(),
            tables = tables.len(),
            bytes = bytes.len(),
            "saved snapshot"
        );
        Ok(())
    }

    /// Runs `f` against the named table.
    pub fn read<R>(&self, entity: &str, f: impl FnOnce(Option<&Table>) -> R) -> StorageResult<R> {
        let state = self.state.read();
        if state.snapshot.is_none() {
            return Err(StorageError::Closed);
        }
        Ok(f(state.tables.get(entity)))
    }

    /// Runs `f` against the named table, creating it if needed.
    pub fn write<R>(
        &self,
        entity: &str,
        f: impl FnOnce(&mut Table) -> StorageResult<R>,
    ) -> StorageResult<R> {
        let mut state = self.state.write();
        if state.snapshot.is_none() {
            return Err(StorageError::Closed);
        }
        let table = state.tables.entry(entity.to_string()).or_default();
        f(table)
    }
}

impl std::fmt::Debug for SerialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("SerialStore")
            .field("open", &state.snapshot.is_some())
            .field("tables", &state.tables.len())
            .finish()
    }
}

fn encode(tables: &BTreeMap<String, Table>) -> StorageResult<Vec<u8>> {
    let snapshot = Snapshot {
        format: SNAPSHOT_FORMAT,
        tables: tables
            .iter()
            .map(|(name, table)| (name.clone(), table.values().cloned().collect()))
            .collect(),
    };
    Ok(to_cbor(&snapshot)?)
}

fn decode(bytes: &[u8]) -> StorageResult<BTreeMap<String, Table>> {
    let snapshot: Snapshot =
        from_cbor(bytes).map_err(|e| StorageError::corrupted(format!("unreadable snapshot: {e}")))?;
    if snapshot.format != SNAPSHOT_FORMAT {
        return Err(StorageError::corrupted(format!(
            "unsupported snapshot format {}",
            snapshot.format
        )));
    }

    let mut tables = BTreeMap::new();
    for (name, rows) in snapshot.tables {
        let mut table = Table::new();
        for row in rows {
            let key = row.key.as_key()?.clone();
            if table.insert(key, row).is_some() {
                return Err(StorageError::corrupted(format!(
                    "snapshot repeats a key in {name}"
                )));
            }
        }
        debug!(entity = %name, rows = table.len(), "restored table");
        tables.insert(name, table);
    }
    Ok(tables)
}
