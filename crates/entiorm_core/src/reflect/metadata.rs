//! Reflected persistence metadata.

use crate::reflect::descriptor::ParamDescriptor;
use entiorm_codec::ValueType;

/// One field of an entity as the persistence layer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeModel {
    name: String,
    value_type: ValueType,
    primary_key: bool,
    ignored: bool,
    required: bool,
}

impl AttributeModel {
    /// Creates an attribute model.
    pub fn new(
        name: impl Into<String>,
        value_type: ValueType,
        primary_key: bool,
        ignored: bool,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            value_type,
            primary_key,
            ignored,
            required,
        }
    }

    /// Storage-visible name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Whether this is the entity's primary key.
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Whether the attribute is excluded from persistence.
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Whether construction needs a value for this attribute.
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// A viable parameterized constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorModel {
    index: usize,
    params: Vec<ParamDescriptor>,
}

impl ConstructorModel {
    pub(crate) fn new(index: usize, params: Vec<ParamDescriptor>) -> Self {
        Self { index, params }
    }

    /// Position in the type's declared constructor list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Parameters in declared order.
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }
}

/// The reflected description of one entity type.
///
/// Built by [`crate::EntityReflector::derive`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    pub(crate) type_name: String,
    pub(crate) entity_name: String,
    pub(crate) attributes: Vec<AttributeModel>,
    pub(crate) default_constructor: Option<usize>,
    pub(crate) parameterized: Vec<ConstructorModel>,
    pub(crate) serializable: bool,
}

impl EntityMetadata {
    /// Declared simple name of the type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Canonical storage identifier.
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// All attribute models, ignored ones included, in declared order.
    pub fn attributes(&self) -> &[AttributeModel] {
        &self.attributes
    }

    /// Attributes that are read, written and stored.
    pub fn persistent_attributes(&self) -> impl Iterator<Item = &AttributeModel> {
        self.attributes.iter().filter(|a| !a.is_ignored())
    }

    /// Looks up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeModel> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// The primary-key attribute, if one is tagged.
    pub fn primary_key(&self) -> Option<&AttributeModel> {
        self.persistent_attributes().find(|a| a.is_primary_key())
    }

    /// Index of the viable zero-argument constructor.
    pub fn default_constructor(&self) -> Option<usize> {
        self.default_constructor
    }

    /// Viable parameterized constructors in declared order.
    pub fn parameterized_constructors(&self) -> &[ConstructorModel] {
        &self.parameterized
    }

    /// Whether the instantiate-then-populate strategy is available.
    pub fn has_viable_constructor(&self) -> bool {
        self.default_constructor.is_some()
    }

    /// Whether at least one attribute is persistable.
    pub fn has_viable_fields(&self) -> bool {
        self.persistent_attributes().next().is_some()
    }

    /// Whether the type carries the blob-capable marker.
    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    /// Viable constructor and viable fields.
    pub fn is_viable(&self) -> bool {
        self.has_viable_constructor() && self.has_viable_fields()
    }
}
