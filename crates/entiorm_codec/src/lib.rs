//! # entiorm Codec
//!
//! Attribute values and their encoding for entiorm.
//!
//! This crate provides:
//! - [`Value`], the flat dynamic value stored for one entity attribute
//! - [`ValueKind`] / [`ValueType`], the declared type of an attribute
//! - [`AttributeValue`], conversions between Rust field types and values
//! - CBOR encoding used by backends for snapshots
//!
//! ## Usage
//!
//! ```
//! use entiorm_codec::{from_cbor, to_cbor, AttributeValue, Value};
//!
//! let value = 42i64.to_value();
//! let bytes = to_cbor(&value).unwrap();
//!
//! let decoded: Value = from_cbor(&bytes).unwrap();
//! assert_eq!(i64::from_value(decoded).unwrap(), 42);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod error;
mod types;
mod value;

pub use cbor::{from_cbor, to_cbor};
pub use error::{CodecError, CodecResult};
pub use types::{AttributeValue, ValueKind, ValueType};
pub use value::Value;
