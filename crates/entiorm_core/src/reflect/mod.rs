//! Entity reflection.
//!
//! Rust has no runtime introspection, so types describe themselves through
//! [`Reflect`], and entities additionally expose the small instance surface
//! in [`Entity`] that construction and extraction need. The
//! [`crate::entity!`] macro implements both for plain structs.

mod descriptor;
mod metadata;
mod reflector;

pub use descriptor::{
    ConstructorDescriptor, EntityTag, FieldDescriptor, FieldTag, Modifier, ParamDescriptor,
    TypeDescriptor,
};
pub use metadata::{AttributeModel, ConstructorModel, EntityMetadata};
pub use reflector::{DefaultRules, EntityReflector, MetadataCache, ViabilityRules};

use crate::error::CoreResult;
use entiorm_codec::Value;
use std::collections::BTreeMap;

/// A flat map of attribute name to stored value.
pub type Record = BTreeMap<String, Value>;

/// A type that can describe itself.
pub trait Reflect: 'static {
    /// Returns the type's static description.
    fn type_descriptor() -> TypeDescriptor;
}

/// The instance surface of an entity type.
pub trait Entity: Reflect + Sized + Send + Sync {
    /// Calls the constructor at `index` in the descriptor's constructor
    /// list with positional `args`.
    ///
    /// # Errors
    ///
    /// Fails if no such constructor exists or it rejects the arguments.
    fn invoke(index: usize, args: Vec<Value>) -> CoreResult<Self>;

    /// Writes `value` into the field named `field`.
    ///
    /// # Errors
    ///
    /// Fails for unknown fields or values of the wrong type.
    fn assign(&mut self, field: &str, value: Value) -> CoreResult<()>;

    /// Reads the field named `field`.
    fn read(&self, field: &str) -> Option<Value>;
}

/// Marker for entities a backend may store as an opaque blob.
pub trait Serializable: Entity {}

macro_rules! builtin_reflect {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::plain(stringify!($ty))
                }
            }
        )*
    };
}

builtin_reflect!(bool, i64, i32, u32, i16, u16, u8, String, Vec<u8>);
