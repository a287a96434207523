//! # entiorm Core
//!
//! Entity reflection and the backend abstraction for entiorm.
//!
//! This crate provides:
//! - The type-descriptor protocol ([`Reflect`], [`Entity`]) and the
//!   [`entity!`] macro that implements it for plain structs
//! - [`EntityReflector`], which derives validated [`EntityMetadata`] and
//!   builds entities from stored records
//! - The backend contract: [`Extension`], [`DaoFactory`], [`RecordDao`]
//!   and the typed [`Dao`]
//! - [`Database`] and its lifecycle, the [`DatabaseBuilder`] protocol and
//!   the [`PersistenceFacade`]
//!
//! ## Example
//!
//! ```
//! use entiorm_core::{entity, EntityReflector, Value};
//!
//! entity! {
//!     #[derive(Debug, Default, PartialEq)]
//!     struct Book as "books" {
//!         #[key]
//!         isbn: String,
//!         pages: i64,
//!     }
//! }
//!
//! let reflector = EntityReflector::default();
//! let metadata = reflector.derive::<Book>().unwrap();
//! assert!(metadata.is_viable());
//!
//! let record = [
//!     ("isbn".to_string(), Value::from("978-0")),
//!     ("pages".to_string(), Value::Integer(320)),
//! ]
//! .into_iter()
//! .collect();
//! let book: Book = reflector.construct(&metadata, &record).unwrap();
//! assert_eq!(book.pages, 320);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

mod backend;
mod builder;
mod database;
mod error;
mod facade;
mod reflect;

#[cfg(test)]
mod testing;

pub use backend::{Dao, DaoFactory, Extension, RecordDao};
pub use builder::{BuilderState, DatabaseBuilder};
pub use database::{Credentials, Database, DatabaseSettings, LifecycleState};
pub use error::{BoxError, CoreError, CoreResult};
pub use facade::PersistenceFacade;
pub use reflect::{
    AttributeModel, ConstructorDescriptor, ConstructorModel, DefaultRules, Entity, EntityMetadata,
    EntityReflector, EntityTag, FieldDescriptor, FieldTag, MetadataCache, Modifier,
    ParamDescriptor, Record, Reflect, Serializable, TypeDescriptor, ViabilityRules,
};

pub use entiorm_codec::{AttributeValue, CodecError, Value, ValueKind, ValueType};
pub use entiorm_storage::StorageError;
