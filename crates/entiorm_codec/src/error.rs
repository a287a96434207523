//! Error types for the codec crate.

use crate::types::ValueType;
use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding, decoding or value conversion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a value to CBOR.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode CBOR bytes.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// A value did not have the type the target field expects.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The type the conversion required.
        expected: ValueType,
        /// Name of the value variant that was supplied.
        found: &'static str,
    },

    /// An integer did not fit the target field type.
    #[error("integer {value} does not fit in {target}")]
    IntegerOverflow {
        /// The stored integer.
        value: i64,
        /// Name of the target Rust type.
        target: &'static str,
    },

    /// Null cannot be used as a storage key.
    #[error("null cannot be encoded as a key")]
    NullKey,
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(expected: ValueType, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }
}
