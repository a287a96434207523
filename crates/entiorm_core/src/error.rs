//! Error types for entiorm core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Boxed cause carried by wrapping errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in entiorm core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The type carries no entity tag.
    #[error("{type_name} is not an entity")]
    NotAnEntity {
        /// Declared name of the rejected type.
        type_name: String,
    },

    /// Metadata exists but an instance could not be built from values.
    #[error("cannot construct {entity}: {reason}")]
    EntityConstruction {
        /// Declared name of the entity type.
        entity: String,
        /// Why construction failed.
        reason: String,
    },

    /// A required attribute had no value during field injection.
    #[error("cannot construct {entity}: missing required attribute {attribute}")]
    MissingAttribute {
        /// Declared name of the entity type.
        entity: String,
        /// The attribute with no value.
        attribute: String,
    },

    /// More than one field is tagged as primary key.
    #[error("{entity} declares more than one primary key: {}", attributes.join(", "))]
    AmbiguousPrimaryKey {
        /// Declared name of the entity type.
        entity: String,
        /// All attributes tagged as primary key.
        attributes: Vec<String>,
    },

    /// Builder instantiation or `build()` failed.
    #[error("database builder failed: {message}")]
    DatabaseBuilder {
        /// What the builder was doing.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The backend cannot host this entity's attribute shape.
    #[error("unsupported entity {entity}: {reason}")]
    UnsupportedEntity {
        /// Storage name of the entity.
        entity: String,
        /// What the backend could not represent.
        reason: String,
    },

    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(#[from] entiorm_storage::StorageError),

    /// Value conversion or encoding error.
    #[error("codec error: {0}")]
    Codec(#[from] entiorm_codec::CodecError),

    /// An extension lifecycle hook failed.
    #[error("extension {hook} failed: {source}")]
    Lifecycle {
        /// Name of the hook (`on_start` or `on_stop`).
        hook: &'static str,
        /// The hook's error.
        #[source]
        source: Box<CoreError>,
    },

    /// The database has been closed.
    #[error("database is closed")]
    DatabaseClosed,

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a not-an-entity error.
    pub fn not_an_entity(type_name: impl Into<String>) -> Self {
        Self::NotAnEntity {
            type_name: type_name.into(),
        }
    }

    /// Creates an entity construction error.
    pub fn entity_construction(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EntityConstruction {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing attribute error.
    pub fn missing_attribute(entity: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            entity: entity.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates a builder error with no underlying cause.
    pub fn builder_failed(message: impl Into<String>) -> Self {
        Self::DatabaseBuilder {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a builder error wrapping `source`.
    pub fn builder_failed_with(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::DatabaseBuilder {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an unsupported entity error.
    pub fn unsupported_entity(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedEntity {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Creates a lifecycle hook error.
    pub fn lifecycle(hook: &'static str, source: CoreError) -> Self {
        Self::Lifecycle {
            hook,
            source: Box::new(source),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Whether this error reports a failed entity construction.
    ///
    /// `MissingAttribute` is the field-injection flavour of the same failure.
    #[must_use]
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::EntityConstruction { .. } | Self::MissingAttribute { .. }
        )
    }

    /// Whether this error originated in a backend's storage layer.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn builder_error_keeps_cause() {
        let cause = CoreError::invalid_operation("boom");
        let err = CoreError::builder_failed_with("start failed", cause);

        assert_eq!(err.to_string(), "database builder failed: start failed");
        let source = err.source().expect("cause");
        assert_eq!(source.to_string(), "invalid operation: boom");
    }

    #[test]
    fn construction_classification() {
        assert!(CoreError::missing_attribute("User", "id").is_construction_error());
        assert!(CoreError::entity_construction("User", "x").is_construction_error());
        assert!(!CoreError::DatabaseClosed.is_construction_error());
    }

    #[test]
    fn storage_errors_are_distinguishable() {
        let err: CoreError = entiorm_storage::StorageError::Closed.into();
        assert!(err.is_storage_error());
        assert!(!CoreError::not_an_entity("i64").is_storage_error());
    }

    #[test]
    fn ambiguous_key_lists_attributes() {
        let err = CoreError::AmbiguousPrimaryKey {
            entity: "Pair".into(),
            attributes: vec!["left".into(), "right".into()],
        };
        assert_eq!(
            err.to_string(),
            "Pair declares more than one primary key: left, right"
        );
    }
}
