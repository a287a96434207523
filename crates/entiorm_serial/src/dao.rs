//! Record-level access to one serial table.

use crate::store::{Row, SerialStore, Table};
use entiorm_codec::Value;
use entiorm_core::{CoreError, CoreResult, EntityMetadata, Record, RecordDao};
use entiorm_storage::{StorageError, StorageResult};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Access object over one entity's table.
///
/// Batches are checked in full before the table is touched, so a failing
/// batch leaves it unchanged. [`RecordDao::retrieve_all`] returns rows in
/// ascending key order; integer keys sort numerically.
#[derive(Debug)]
pub struct SerialDao {
    metadata: Arc<EntityMetadata>,
    key_attribute: String,
    store: Arc<SerialStore>,
}

impl SerialDao {
    pub(crate) fn new(
        metadata: Arc<EntityMetadata>,
        key_attribute: String,
        store: Arc<SerialStore>,
    ) -> Self {
        Self {
            metadata,
            key_attribute,
            store,
        }
    }

    fn entity(&self) -> &str {
        self.metadata.entity_name()
    }

    /// Pairs each record with its key value.
    fn keyed(&self, records: Vec<Record>) -> StorageResult<Vec<(Value, Row)>> {
        records
            .into_iter()
            .map(|record| {
                let key = match record.get(&self.key_attribute) {
                    Some(value) if !value.is_null() => value.clone(),
                    _ => {
                        return Err(StorageError::MissingKey {
                            entity: self.entity().to_string(),
                            attribute: self.key_attribute.clone(),
                        })
                    }
                };
                Ok((key.clone(), Row { key, record }))
            })
            .collect()
    }

    fn require_present(&self, table: &Table, rows: &[(Value, Row)]) -> StorageResult<()> {
        match rows.iter().find(|(key, _)| !table.contains_key(key)) {
            Some((_, row)) => Err(StorageError::key_not_found(self.entity(), &row.key)),
            None => Ok(()),
        }
    }
}

impl RecordDao for SerialDao {
    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn create_all(&self, records: Vec<Record>) -> CoreResult<()> {
        let rows = self.keyed(records)?;
        self.store.write(self.entity(), |table| {
            let mut seen = BTreeSet::new();
            let duplicate = rows
                .iter()
                .find(|(key, _)| table.contains_key(key) || !seen.insert(key));
            if let Some((_, row)) = duplicate {
                return Err(StorageError::duplicate_key(self.entity(), &row.key));
            }
            table.extend(rows);
            Ok(())
        })?;
        Ok(())
    }

    fn retrieve(&self, key: &Value) -> CoreResult<Option<Record>> {
        let key = key.as_key()?;
        let record = self.store.read(self.entity(), |table| {
            table
                .and_then(|t| t.get(key))
                .map(|row| row.record.clone())
        })?;
        Ok(record)
    }

    fn retrieve_matching(&self, constraints: &Record) -> CoreResult<Option<Record>> {
        if let Some(name) = constraints
            .keys()
            .find(|name| !self.metadata.persistent_attributes().any(|a| a.name() == *name))
        {
            return Err(CoreError::invalid_operation(format!(
                "{} has no persistent attribute {name}",
                self.entity()
            )));
        }
        let record = self.store.read(self.entity(), |table| {
            table.into_iter().flat_map(Table::values).find_map(|row| {
                constraints
                    .iter()
                    .all(|(name, value)| row.record.get(name).unwrap_or(&Value::Null) == value)
                    .then(|| row.record.clone())
            })
        })?;
        Ok(record)
    }

    fn retrieve_all(&self) -> CoreResult<Vec<Record>> {
        let records: Vec<Record> = self.store.read(self.entity(), |table| {
            table
                .into_iter()
                .flat_map(Table::values)
                .map(|row| row.record.clone())
                .collect()
        })?;
        Ok(records)
    }

    fn update_all(&self, records: Vec<Record>) -> CoreResult<()> {
        let rows = self.keyed(records)?;
        self.store.write(self.entity(), |table| {
            self.require_present(table, &rows)?;
            table.extend(rows);
            Ok(())
        })?;
        Ok(())
    }

    fn delete_all(&self, records: Vec<Record>) -> CoreResult<()> {
        let rows = self.keyed(records)?;
        self.store.write(self.entity(), |table| {
            self.require_present(table, &rows)?;
            for (key, _) in &rows {
                table.remove(key);
            }
            Ok(())
        })?;
        Ok(())
    }
}
