//! Access-object factories.

use crate::backend::RecordDao;
use crate::error::CoreResult;
use crate::reflect::EntityMetadata;
use std::sync::Arc;

/// Produces access objects for entity types on one backend.
pub trait DaoFactory: Send + Sync {
    /// Creates a record-level access object for the entity described by
    /// `metadata`.
    ///
    /// # Errors
    ///
    /// `UnsupportedEntity` if the backend cannot host the entity's
    /// attribute shape.
    fn create_dao(&self, metadata: Arc<EntityMetadata>) -> CoreResult<Box<dyn RecordDao>>;
}
