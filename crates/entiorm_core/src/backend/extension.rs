//! The backend plug-in contract.

use crate::backend::DaoFactory;
use crate::database::{Database, DatabaseSettings};
use crate::error::CoreResult;
use crate::reflect::{ConstructorDescriptor, DefaultRules, FieldDescriptor, ViabilityRules};
use std::sync::Arc;

/// A storage backend bound to one [`Database`].
///
/// The database owns its extension exclusively and drives it through
/// `on_start` and `on_stop`. Between those hooks it asks the extension for
/// its connection descriptor and its DAO factory.
pub trait Extension: Send + Sync {
    /// Short backend name, used in logs.
    fn kind(&self) -> &str;

    /// Connection descriptor for the database described by `settings`.
    ///
    /// # Errors
    ///
    /// Fails if the backend cannot derive a descriptor, for example from an
    /// unusable database name.
    fn uri(&self, settings: &DatabaseSettings) -> CoreResult<String>;

    /// Returns the backend's DAO factory.
    ///
    /// Called at most once per database; the database caches the result.
    ///
    /// # Errors
    ///
    /// Fails if the backend cannot produce a factory in its current state.
    fn dao_factory(&self) -> CoreResult<Arc<dyn DaoFactory>>;

    /// Acquires backend resources.
    ///
    /// # Errors
    ///
    /// Any failure aborts the build; no database is returned.
    fn on_start(&self, settings: &DatabaseSettings) -> CoreResult<()>;

    /// Releases backend resources.
    ///
    /// # Errors
    ///
    /// Reported from [`Database::close`]; the database is closed regardless.
    fn on_stop(&self, settings: &DatabaseSettings) -> CoreResult<()>;

    /// Base rules behind the two predicates below.
    fn viability(&self) -> &dyn ViabilityRules {
        &DefaultRules
    }

    /// Whether `field` is persisted by this backend.
    ///
    /// The database's reflector calls this predicate, so overriding it
    /// changes the metadata derived for every entity.
    fn is_viable_field(&self, field: &FieldDescriptor) -> bool {
        self.viability().is_viable_field(field)
    }

    /// Whether `constructor` supports instantiate-then-populate on this
    /// backend.
    fn is_viable_constructor(&self, constructor: &ConstructorDescriptor) -> bool {
        self.viability().is_viable_constructor(constructor)
    }

    /// Starts a database backed by this extension.
    ///
    /// # Errors
    ///
    /// `DatabaseBuilder` wrapping the `on_start` failure.
    fn build(self, settings: DatabaseSettings) -> CoreResult<Database>
    where
        Self: Sized + 'static,
    {
        Database::start(settings, Box::new(self))
    }
}

/// Reflection rules backed by an extension's own predicates.
#[derive(Clone)]
pub(crate) struct ExtensionRules {
    extension: Arc<dyn Extension>,
}

impl ExtensionRules {
    pub(crate) fn new(extension: Arc<dyn Extension>) -> Self {
        Self { extension }
    }
}

impl ViabilityRules for ExtensionRules {
    fn is_viable_field(&self, field: &FieldDescriptor) -> bool {
        self.extension.is_viable_field(field)
    }

    fn is_viable_constructor(&self, constructor: &ConstructorDescriptor) -> bool {
        self.extension.is_viable_constructor(constructor)
    }
}
