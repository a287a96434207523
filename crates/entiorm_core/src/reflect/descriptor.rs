//! Static type descriptions.
//!
//! A [`TypeDescriptor`] is what a type says about itself: its declared
//! name, whether it is tagged as an entity, its fields and its
//! constructors. Descriptors are produced by the `entity!` macro or written
//! by hand; the reflector turns them into validated metadata.

use entiorm_codec::{AttributeValue, ValueType};

/// The entity tag on a type, with its optional storage name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityTag {
    /// Explicit storage name; derived from the type name when `None`.
    pub name: Option<&'static str>,
}

/// Declaration modifiers that make a field non-persistable by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Shared by all instances rather than stored per instance.
    Static,
    /// Cannot be reassigned after construction.
    Final,
    /// Explicitly excluded from serialization.
    Transient,
    /// Declared without storage.
    Abstract,
}

/// Field tags accepted by the declaration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldTag {
    /// The field is the entity's primary key.
    PrimaryKey,
    /// The field is excluded from persistence.
    Ignored,
    /// The field carries the [`Modifier::Transient`] modifier.
    Transient,
    /// The field has a default, so it may be absent when constructing.
    Optional,
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name as stored.
    pub name: &'static str,
    /// Declared value type.
    pub value_type: ValueType,
    /// Declaration modifiers.
    pub modifiers: Vec<Modifier>,
    /// Tagged as primary key.
    pub primary_key: bool,
    /// Tagged as ignored.
    pub ignored: bool,
    /// Has a default value.
    pub optional: bool,
}

impl FieldDescriptor {
    /// Creates an untagged field.
    pub fn new(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            value_type,
            modifiers: Vec::new(),
            primary_key: false,
            ignored: false,
            optional: false,
        }
    }

    /// Creates an untagged field typed after the Rust type `T`.
    pub fn of<T: AttributeValue>(name: &'static str) -> Self {
        Self::new(name, T::value_type())
    }

    /// Tags the field as primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Tags the field as ignored.
    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Marks the field as having a default.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Adds a declaration modifier.
    #[must_use]
    pub fn modifier(mut self, modifier: Modifier) -> Self {
        if !self.modifiers.contains(&modifier) {
            self.modifiers.push(modifier);
        }
        self
    }

    /// Applies a list of tags.
    #[must_use]
    pub fn tagged(self, tags: &[FieldTag]) -> Self {
        tags.iter().fold(self, |field, tag| match tag {
            FieldTag::PrimaryKey => field.primary_key(),
            FieldTag::Ignored => field.ignored(),
            FieldTag::Transient => field.modifier(Modifier::Transient),
            FieldTag::Optional => field.optional(),
        })
    }

    /// Checks for a modifier.
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Whether a value must be supplied when constructing.
    pub fn is_required(&self) -> bool {
        !self.optional && !self.value_type.nullable
    }
}

/// One constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDescriptor {
    /// Parameter name; matched against attribute names.
    pub name: &'static str,
    /// Declared value type.
    pub value_type: ValueType,
}

impl ParamDescriptor {
    /// Whether a value must be supplied for this parameter.
    pub fn is_required(&self) -> bool {
        !self.value_type.nullable
    }
}

/// One declared constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDescriptor {
    /// Parameters in declared order.
    pub params: Vec<ParamDescriptor>,
    /// Generated by the toolchain rather than declared.
    pub synthetic: bool,
    /// Callable from outside the type.
    pub accessible: bool,
}

impl Default for ConstructorDescriptor {
    fn default() -> Self {
        Self::zero_arg()
    }
}

impl ConstructorDescriptor {
    /// A public constructor; chain [`ConstructorDescriptor::param`] to
    /// declare its parameters.
    pub fn new() -> Self {
        Self::zero_arg()
    }

    /// A public zero-argument constructor.
    pub fn zero_arg() -> Self {
        Self {
            params: Vec::new(),
            synthetic: false,
            accessible: true,
        }
    }

    /// Adds a parameter typed after the Rust type `T`.
    #[must_use]
    pub fn param<T: AttributeValue>(mut self, name: &'static str) -> Self {
        self.params.push(ParamDescriptor {
            name,
            value_type: T::value_type(),
        });
        self
    }

    /// Marks the constructor as synthetic.
    #[must_use]
    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    /// Marks the constructor as not callable from outside.
    #[must_use]
    pub fn inaccessible(mut self) -> Self {
        self.accessible = false;
        self
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Everything a type declares about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Simple declared name of the type.
    pub type_name: &'static str,
    /// Entity tag, if the type is tagged.
    pub entity: Option<EntityTag>,
    /// Declared fields in order.
    pub fields: Vec<FieldDescriptor>,
    /// Declared constructors in order.
    pub constructors: Vec<ConstructorDescriptor>,
    /// Carries the blob-capable marker.
    pub serializable: bool,
}

impl TypeDescriptor {
    /// Describes a type without an entity tag.
    pub fn plain(type_name: &'static str) -> Self {
        Self {
            type_name,
            entity: None,
            fields: Vec::new(),
            constructors: Vec::new(),
            serializable: false,
        }
    }

    /// Describes an entity-tagged type.
    pub fn entity(type_name: &'static str, name: Option<&'static str>) -> Self {
        Self {
            entity: Some(EntityTag { name }),
            ..Self::plain(type_name)
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a constructor.
    #[must_use]
    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Sets the blob-capable marker.
    #[must_use]
    pub fn serializable(mut self) -> Self {
        self.serializable = true;
        self
    }

    /// Applies marker names emitted by the `entity!` macro.
    #[must_use]
    pub fn markers(self, markers: &[&str]) -> Self {
        if markers.contains(&"Serializable") {
            self.serializable()
        } else {
            self
        }
    }

    /// Whether the type carries an entity tag.
    pub fn is_entity(&self) -> bool {
        self.entity.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entiorm_codec::ValueKind;

    #[test]
    fn tags_apply_in_order() {
        let field = FieldDescriptor::of::<i64>("id").tagged(&[
            FieldTag::PrimaryKey,
            FieldTag::Transient,
            FieldTag::Transient,
        ]);

        assert!(field.primary_key);
        assert!(!field.ignored);
        assert_eq!(field.modifiers, vec![Modifier::Transient]);
    }

    #[test]
    fn nullable_fields_are_not_required() {
        assert!(FieldDescriptor::of::<String>("name").is_required());
        assert!(!FieldDescriptor::of::<Option<String>>("nick").is_required());
        assert!(!FieldDescriptor::of::<String>("bio").optional().is_required());
    }

    #[test]
    fn constructor_params_keep_order() {
        let ctor = ConstructorDescriptor::new()
            .param::<i64>("id")
            .param::<Option<String>>("label");

        assert_eq!(ctor.arity(), 2);
        assert_eq!(ctor.params[0].name, "id");
        assert!(ctor.params[0].is_required());
        assert_eq!(ctor.params[1].value_type, ValueType::nullable(ValueKind::Text));
        assert!(!ctor.params[1].is_required());
    }

    #[test]
    fn entity_descriptor_defaults() {
        let plain = TypeDescriptor::plain("i64");
        assert!(!plain.is_entity());

        let tagged = TypeDescriptor::entity("User", Some("users")).markers(&["Serializable"]);
        assert!(tagged.is_entity());
        assert_eq!(tagged.entity.unwrap().name, Some("users"));
        assert!(tagged.serializable);
    }
}
