//! Metadata derivation and entity construction.

use crate::error::{CoreError, CoreResult};
use crate::reflect::descriptor::{ConstructorDescriptor, FieldDescriptor, Modifier, TypeDescriptor};
use crate::reflect::metadata::{AttributeModel, ConstructorModel, EntityMetadata};
use crate::reflect::{Entity, Record, Reflect};
use entiorm_codec::{Value, ValueType};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Per-backend rules for what counts as persistable.
///
/// Both predicates have default implementations; a backend overrides them
/// to widen or narrow what its reflector accepts.
pub trait ViabilityRules: Send + Sync {
    /// Whether a declared field is persisted.
    ///
    /// Default: not ignored and none of the static, final, transient or
    /// abstract modifiers.
    fn is_viable_field(&self, field: &FieldDescriptor) -> bool {
        !field.ignored
            && ![
                Modifier::Static,
                Modifier::Final,
                Modifier::Transient,
                Modifier::Abstract,
            ]
            .iter()
            .any(|m| field.has_modifier(*m))
    }

    /// Whether a constructor supports instantiate-then-populate.
    ///
    /// Default: zero parameters, declared, accessible.
    fn is_viable_constructor(&self, constructor: &ConstructorDescriptor) -> bool {
        constructor.params.is_empty() && !constructor.synthetic && constructor.accessible
    }
}

/// The default viability rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRules;

impl ViabilityRules for DefaultRules {}

/// Turns type descriptors into [`EntityMetadata`] and rebuilds entities
/// from stored records.
///
/// Derivation consults the backend's [`ViabilityRules`]; construction and
/// extraction only read the metadata they are given.
#[derive(Clone, Copy)]
pub struct EntityReflector<'r> {
    rules: &'r dyn ViabilityRules,
}

impl std::fmt::Debug for EntityReflector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityReflector").finish_non_exhaustive()
    }
}

impl Default for EntityReflector<'static> {
    fn default() -> Self {
        Self::new(&DefaultRules)
    }
}

impl<'r> EntityReflector<'r> {
    /// Creates a reflector applying `rules`.
    pub fn new(rules: &'r dyn ViabilityRules) -> Self {
        Self { rules }
    }

    /// Derives metadata for `T`.
    ///
    /// # Errors
    ///
    /// `NotAnEntity` if `T` has no entity tag, `AmbiguousPrimaryKey` if more
    /// than one persistable field is tagged as primary key.
    pub fn derive<T: Reflect>(&self) -> CoreResult<EntityMetadata> {
        self.derive_descriptor(&T::type_descriptor())
    }

    /// Derives metadata from an explicit descriptor.
    ///
    /// # Errors
    ///
    /// Same as [`EntityReflector::derive`].
    pub fn derive_descriptor(&self, descriptor: &TypeDescriptor) -> CoreResult<EntityMetadata> {
        let tag = descriptor
            .entity
            .ok_or_else(|| CoreError::not_an_entity(descriptor.type_name))?;

        let entity_name = tag
            .name
            .map_or_else(|| descriptor.type_name.to_lowercase(), str::to_string);

        let mut attributes = Vec::with_capacity(descriptor.fields.len());
        for field in &descriptor.fields {
            let viable = self.rules.is_viable_field(field);
            if viable || field.ignored {
                attributes.push(AttributeModel::new(
                    field.name,
                    field.value_type,
                    field.primary_key,
                    !viable,
                    field.is_required(),
                ));
            }
        }

        let keys: Vec<String> = attributes
            .iter()
            .filter(|a| a.is_primary_key() && !a.is_ignored())
            .map(|a| a.name().to_string())
            .collect();
        if keys.len() > 1 {
            return Err(CoreError::AmbiguousPrimaryKey {
                entity: descriptor.type_name.to_string(),
                attributes: keys,
            });
        }

        let default_constructor = descriptor
            .constructors
            .iter()
            .position(|c| self.rules.is_viable_constructor(c));

        let parameterized = descriptor
            .constructors
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.params.is_empty() && !c.synthetic && c.accessible)
            .map(|(index, c)| ConstructorModel::new(index, c.params.clone()))
            .collect();

        let metadata = EntityMetadata {
            type_name: descriptor.type_name.to_string(),
            entity_name,
            attributes,
            default_constructor,
            parameterized,
            serializable: descriptor.serializable,
        };

        debug!(
            entity = %metadata.entity_name,
            attributes = metadata.attributes.len(),
            viable = metadata.is_viable(),
            "derived entity metadata"
        );
        Ok(metadata)
    }

    /// Builds an entity from a record of attribute values.
    ///
    /// Field injection is used when the type has a viable zero-argument
    /// constructor and either has viable fields or declares no
    /// parameterized constructor. Otherwise the first parameterized
    /// constructor whose required parameters are all present is invoked.
    /// Keys that match no attribute or parameter are ignored.
    ///
    /// # Errors
    ///
    /// `MissingAttribute` when injection lacks a required attribute,
    /// `EntityConstruction` when no strategy applies or a value has the
    /// wrong type.
    pub fn construct<E: Entity>(&self, metadata: &EntityMetadata, values: &Record) -> CoreResult<E> {
        let inject = metadata.default_constructor().is_some()
            && (metadata.has_viable_fields() || metadata.parameterized_constructors().is_empty());

        match metadata.default_constructor() {
            Some(index) if inject => Self::inject(metadata, index, values),
            _ if !metadata.parameterized_constructors().is_empty() => {
                Self::invoke_parameterized(metadata, values)
            }
            _ => Err(CoreError::entity_construction(
                metadata.type_name(),
                "must declare a usable constructor",
            )),
        }
    }

    /// Reads every persistent attribute of `entity` into a record.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if the entity does not expose an attribute, and a
    /// codec type mismatch if it exposes a value of the wrong type.
    pub fn extract<E: Entity>(&self, entity: &E, metadata: &EntityMetadata) -> CoreResult<Record> {
        let mut record = Record::new();
        for attribute in metadata.persistent_attributes() {
            let value = entity.read(attribute.name()).ok_or_else(|| {
                CoreError::invalid_operation(format!(
                    "{} does not expose attribute {}",
                    metadata.type_name(),
                    attribute.name()
                ))
            })?;
            if !value.conforms_to(attribute.value_type()) {
                return Err(entiorm_codec::CodecError::type_mismatch(
                    attribute.value_type(),
                    value.type_name(),
                )
                .into());
            }
            record.insert(attribute.name().to_string(), value);
        }
        Ok(record)
    }

    fn inject<E: Entity>(metadata: &EntityMetadata, index: usize, values: &Record) -> CoreResult<E> {
        let mut entity = E::invoke(index, Vec::new())
            .map_err(|e| Self::construction_failure(metadata, e))?;

        for attribute in metadata.persistent_attributes() {
            match values.get(attribute.name()) {
                Some(value) => {
                    let value = Self::checked(metadata, attribute.name(), attribute.value_type(), value)?;
                    entity.assign(attribute.name(), value).map_err(|e| {
                        CoreError::entity_construction(
                            metadata.type_name(),
                            format!("attribute {}: {e}", attribute.name()),
                        )
                    })?;
                }
                None if attribute.is_required() => {
                    return Err(CoreError::missing_attribute(
                        metadata.type_name(),
                        attribute.name(),
                    ));
                }
                None => {}
            }
        }
        Ok(entity)
    }

    fn invoke_parameterized<E: Entity>(metadata: &EntityMetadata, values: &Record) -> CoreResult<E> {
        let mut first_missing: Option<Vec<&str>> = None;

        for constructor in metadata.parameterized_constructors() {
            let missing: Vec<&str> = constructor
                .params()
                .iter()
                .filter(|p| p.is_required() && !values.contains_key(p.name))
                .map(|p| p.name)
                .collect();

            if !missing.is_empty() {
                if first_missing.is_none() {
                    first_missing = Some(missing);
                }
                continue;
            }

            let args = constructor
                .params()
                .iter()
                .map(|p| match values.get(p.name) {
                    Some(value) => Self::checked(metadata, p.name, p.value_type, value),
                    None => Ok(Value::Null),
                })
                .collect::<CoreResult<Vec<_>>>()?;

            return E::invoke(constructor.index(), args)
                .map_err(|e| Self::construction_failure(metadata, e));
        }

        Err(CoreError::entity_construction(
            metadata.type_name(),
            format!(
                "missing constructor parameters: {}",
                first_missing.unwrap_or_default().join(", ")
            ),
        ))
    }

    fn checked(
        metadata: &EntityMetadata,
        name: &str,
        value_type: ValueType,
        value: &Value,
    ) -> CoreResult<Value> {
        if value.conforms_to(value_type) {
            Ok(value.clone())
        } else {
            Err(CoreError::entity_construction(
                metadata.type_name(),
                format!(
                    "attribute {name} expects {value_type}, got {}",
                    value.type_name()
                ),
            ))
        }
    }

    fn construction_failure(metadata: &EntityMetadata, error: CoreError) -> CoreError {
        if error.is_construction_error() {
            error
        } else {
            CoreError::entity_construction(metadata.type_name(), error.to_string())
        }
    }
}

/// Memoized metadata keyed by type identity.
///
/// Concurrent first lookups may both derive; the first insert wins and
/// every caller receives that same `Arc`.
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<TypeId, Arc<EntityMetadata>>>,
}

impl MetadataCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns cached metadata for `T`, deriving it on first use.
    ///
    /// # Errors
    ///
    /// Propagates derivation errors; failures are not cached.
    pub fn get_or_derive<T: Reflect>(
        &self,
        reflector: &EntityReflector<'_>,
    ) -> CoreResult<Arc<EntityMetadata>> {
        let id = TypeId::of::<T>();
        if let Some(metadata) = self.entries.read().get(&id) {
            return Ok(Arc::clone(metadata));
        }

        let derived = Arc::new(reflector.derive::<T>()?);
        let mut entries = self.entries.write();
        Ok(Arc::clone(entries.entry(id).or_insert(derived)))
    }

    /// Number of cached types.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops all cached metadata.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
