//! Access-object factory for the serial backend.

use crate::dao::SerialDao;
use crate::store::SerialStore;
use entiorm_codec::ValueKind;
use entiorm_core::{CoreError, CoreResult, DaoFactory, EntityMetadata, RecordDao};
use std::sync::Arc;
use tracing::debug;

/// Creates [`SerialDao`]s over one extension's tables.
///
/// Entities must have a non-nullable primary key, and no attribute may be
/// a float, since keys and snapshots use canonical CBOR.
#[derive(Debug)]
pub struct SerialDaoFactory {
    store: Arc<SerialStore>,
}

impl SerialDaoFactory {
    pub(crate) fn new(store: Arc<SerialStore>) -> Self {
        Self { store }
    }

    fn key_attribute(metadata: &EntityMetadata) -> CoreResult<String> {
        let entity = metadata.entity_name();
        let key = metadata
            .primary_key()
            .ok_or_else(|| CoreError::unsupported_entity(entity, "no primary key attribute"))?;

        if key.value_type().nullable {
            return Err(CoreError::unsupported_entity(
                entity,
                format!("primary key {} is nullable", key.name()),
            ));
        }

        if let Some(float) = metadata
            .persistent_attributes()
            .find(|a| a.value_type().kind == ValueKind::Float)
        {
            return Err(CoreError::unsupported_entity(
                entity,
                format!("attribute {} is a float", float.name()),
            ));
        }

        Ok(key.name().to_string())
    }
}

impl DaoFactory for SerialDaoFactory {
    fn create_dao(&self, metadata: Arc<EntityMetadata>) -> CoreResult<Box<dyn RecordDao>> {
        let key = Self::key_attribute(&metadata)?;
        debug!(entity = %metadata.entity_name(), key = %key, "created serial dao");
        Ok(Box::new(SerialDao::new(metadata, key, Arc::clone(&self.store))))
    }
}
