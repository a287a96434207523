//! Data access objects.

use crate::error::{CoreError, CoreResult};
use crate::reflect::{Entity, EntityMetadata, EntityReflector, Record};
use entiorm_codec::{AttributeValue, Value};
use std::fmt;
use std::marker::PhantomData;
use tracing::trace;

/// Record-level CRUD for one entity type, implemented by backends.
///
/// Batch writes are all-or-nothing: a backend validates the whole batch
/// before mutating anything. Updates and deletes locate rows by the
/// primary-key attribute of each record.
pub trait RecordDao: Send + Sync {
    /// Metadata of the entity this object serves.
    fn metadata(&self) -> &EntityMetadata;

    /// Inserts new rows.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if any key already exists or repeats in the batch.
    fn create_all(&self, records: Vec<Record>) -> CoreResult<()>;

    /// Looks a row up by primary key; `None` when absent.
    ///
    /// # Errors
    ///
    /// Backend failures only.
    fn retrieve(&self, key: &Value) -> CoreResult<Option<Record>>;

    /// The first row whose attributes equal every constraint.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if a constraint names no persistent attribute.
    fn retrieve_matching(&self, constraints: &Record) -> CoreResult<Option<Record>>;

    /// Every row.
    ///
    /// # Errors
    ///
    /// Backend failures only.
    fn retrieve_all(&self) -> CoreResult<Vec<Record>>;

    /// Replaces existing rows.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if any key is absent.
    fn update_all(&self, records: Vec<Record>) -> CoreResult<()>;

    /// Removes existing rows.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if any key is absent.
    fn delete_all(&self, records: Vec<Record>) -> CoreResult<()>;
}

/// Typed access object for entity `E` keyed by `K`.
///
/// Converts entities to records and back through the reflector and
/// forwards to the backend's [`RecordDao`].
pub struct Dao<E, K> {
    inner: Box<dyn RecordDao>,
    _marker: PhantomData<fn(K) -> E>,
}

impl<E: Entity, K: AttributeValue> Dao<E, K> {
    /// Wraps a record-level access object.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if `K` does not match the kind of the entity's
    /// primary key.
    pub fn new(inner: Box<dyn RecordDao>) -> CoreResult<Self> {
        if let Some(key) = inner.metadata().primary_key() {
            let expected = key.value_type().kind;
            let given = K::value_type().kind;
            if expected != given {
                return Err(CoreError::invalid_operation(format!(
                    "{} is keyed by {}, not {}",
                    inner.metadata().entity_name(),
                    expected.name(),
                    given.name()
                )));
            }
        }
        Ok(Self {
            inner,
            _marker: PhantomData,
        })
    }

    /// Metadata of the served entity.
    pub fn metadata(&self) -> &EntityMetadata {
        self.inner.metadata()
    }

    /// Persists one new entity.
    ///
    /// # Errors
    ///
    /// See [`Dao::create_all`].
    pub fn create(&self, entity: &E) -> CoreResult<()> {
        self.create_all(std::slice::from_ref(entity))
    }

    /// Persists new entities as one batch.
    ///
    /// # Errors
    ///
    /// Extraction failures, or the backend's `DuplicateKey`; on error
    /// nothing is stored.
    pub fn create_all(&self, entities: &[E]) -> CoreResult<()> {
        let records = self.records(entities)?;
        trace!(entity = %self.metadata().entity_name(), count = records.len(), "create");
        self.inner.create_all(records)
    }

    /// Fetches the entity with primary key `key`.
    ///
    /// # Errors
    ///
    /// Backend or construction failures; an absent key is `Ok(None)`.
    pub fn retrieve(&self, key: &K) -> CoreResult<Option<E>> {
        self.inner
            .retrieve(&key.to_value())?
            .map(|record| self.entity(&record))
            .transpose()
    }

    /// Fetches the first entity whose attributes equal every given value.
    ///
    /// # Errors
    ///
    /// Backend or construction failures.
    pub fn retrieve_matching<I, S>(&self, constraints: I) -> CoreResult<Option<E>>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let constraints: Record = constraints
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();
        self.inner
            .retrieve_matching(&constraints)?
            .map(|record| self.entity(&record))
            .transpose()
    }

    /// Fetches every stored entity in the backend's order.
    ///
    /// # Errors
    ///
    /// Backend or construction failures.
    pub fn retrieve_all(&self) -> CoreResult<Vec<E>> {
        self.inner
            .retrieve_all()?
            .iter()
            .map(|record| self.entity(record))
            .collect()
    }

    /// Replaces one stored entity.
    ///
    /// # Errors
    ///
    /// See [`Dao::update_all`].
    pub fn update(&self, entity: &E) -> CoreResult<()> {
        self.update_all(std::slice::from_ref(entity))
    }

    /// Replaces stored entities, matched by primary key.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` from the backend if any entity is not stored; on error
    /// nothing changes.
    pub fn update_all(&self, entities: &[E]) -> CoreResult<()> {
        let records = self.records(entities)?;
        trace!(entity = %self.metadata().entity_name(), count = records.len(), "update");
        self.inner.update_all(records)
    }

    /// Removes one stored entity.
    ///
    /// # Errors
    ///
    /// See [`Dao::delete_all`].
    pub fn delete(&self, entity: &E) -> CoreResult<()> {
        self.delete_all(std::slice::from_ref(entity))
    }

    /// Removes stored entities, matched by primary key.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` from the backend if any entity is not stored; on error
    /// nothing changes.
    pub fn delete_all(&self, entities: &[E]) -> CoreResult<()> {
        let records = self.records(entities)?;
        trace!(entity = %self.metadata().entity_name(), count = records.len(), "delete");
        self.inner.delete_all(records)
    }

    fn records(&self, entities: &[E]) -> CoreResult<Vec<Record>> {
        let reflector = EntityReflector::default();
        entities
            .iter()
            .map(|entity| reflector.extract(entity, self.metadata()))
            .collect()
    }

    fn entity(&self, record: &Record) -> CoreResult<E> {
        EntityReflector::default().construct(self.metadata(), record)
    }
}

impl<E, K> fmt::Debug for Dao<E, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dao")
            .field("entity", &self.inner.metadata().entity_name())
            .finish()
    }
}
