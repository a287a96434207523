//! Database handle and lifecycle.

use crate::backend::{Dao, DaoFactory, Extension, ExtensionRules};
use crate::error::{CoreError, CoreResult};
use crate::reflect::{Entity, EntityMetadata, EntityReflector, MetadataCache, Reflect};
use entiorm_codec::AttributeValue;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A user name and password pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// The user name.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity of a database: name, schema version and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    name: String,
    version: u32,
    credentials: Option<Credentials>,
}

impl DatabaseSettings {
    /// Creates settings without credentials.
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            credentials: None,
        }
    }

    /// Attaches credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Credentials, if any were supplied.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

/// Where a database is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created, `on_start` not yet successful.
    Unstarted,
    /// Serving requests.
    Started,
    /// `on_stop` has run. Terminal.
    Closed,
}

/// A started database bound to one backend [`Extension`].
///
/// Obtained from a [`crate::DatabaseBuilder`] or [`Extension::build`].
/// The database owns its extension and closes it exactly once, either
/// through [`Database::close`] or on drop.
///
/// ```
/// # use entiorm_core::{entity, Database};
/// # fn run(db: Database) -> entiorm_core::CoreResult<()> {
/// entity! {
///     #[derive(Debug, Default)]
///     struct Note {
///         #[key]
///         id: i64,
///         body: String,
///     }
/// }
///
/// let notes = db.dao::<Note, i64>()?;
/// notes.create(&Note { id: 1, body: "hello".into() })?;
/// assert!(notes.retrieve(&1)?.is_some());
/// db.close()?;
/// # Ok(())
/// # }
/// ```
pub struct Database {
    settings: DatabaseSettings,
    extension: Arc<dyn Extension>,
    rules: ExtensionRules,
    dao_factory: RwLock<Option<Arc<dyn DaoFactory>>>,
    metadata: MetadataCache,
    state: RwLock<LifecycleState>,
}

impl Database {
    /// Runs the extension's `on_start` hook and returns the started
    /// database.
    ///
    /// # Errors
    ///
    /// `DatabaseBuilder` wrapping the hook's error. The extension is not
    /// stopped in that case.
    pub fn start(settings: DatabaseSettings, extension: Box<dyn Extension>) -> CoreResult<Self> {
        let extension: Arc<dyn Extension> = Arc::from(extension);
        let database = Self {
            settings,
            rules: ExtensionRules::new(Arc::clone(&extension)),
            extension,
            dao_factory: RwLock::new(None),
            metadata: MetadataCache::new(),
            state: RwLock::new(LifecycleState::Unstarted),
        };

        if let Err(error) = database.extension.on_start(&database.settings) {
            warn!(
                backend = database.extension.kind(),
                database = %database.settings.name,
                %error,
                "database failed to start"
            );
            return Err(CoreError::builder_failed_with(
                format!(
                    "cannot start {} database {}",
                    database.extension.kind(),
                    database.settings.name
                ),
                error,
            ));
        }

        *database.state.write() = LifecycleState::Started;
        info!(
            backend = database.extension.kind(),
            database = %database.settings.name,
            version = database.settings.version,
            "database started"
        );
        Ok(database)
    }

    /// Database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Schema version.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.settings.version
    }

    /// User name, if credentials were supplied.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.settings.credentials().map(Credentials::user)
    }

    /// Password, if credentials were supplied.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.settings.credentials().map(Credentials::password)
    }

    /// Name, version and credentials.
    #[must_use]
    pub fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }

    /// The backend's connection descriptor.
    ///
    /// # Errors
    ///
    /// `DatabaseClosed` after close, or the extension's own failure.
    pub fn uri(&self) -> CoreResult<String> {
        self.ensure_open()?;
        self.extension.uri(&self.settings)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    /// Checks if the database is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == LifecycleState::Started
    }

    /// The bound extension.
    #[must_use]
    pub fn extension(&self) -> &dyn Extension {
        self.extension.as_ref()
    }

    /// The backend's DAO factory, resolved on first use and cached.
    ///
    /// # Errors
    ///
    /// `DatabaseClosed` after close, or the extension's failure to produce
    /// a factory.
    pub fn dao_factory(&self) -> CoreResult<Arc<dyn DaoFactory>> {
        self.ensure_open()?;
        if let Some(factory) = self.dao_factory.read().as_ref() {
            return Ok(Arc::clone(factory));
        }

        let mut slot = self.dao_factory.write();
        if let Some(factory) = slot.as_ref() {
            return Ok(Arc::clone(factory));
        }
        let factory = self.extension.dao_factory()?;
        debug!(backend = self.extension.kind(), "resolved dao factory");
        *slot = Some(Arc::clone(&factory));
        Ok(factory)
    }

    /// A reflector applying the extension's viability predicates.
    #[must_use]
    pub fn reflector(&self) -> EntityReflector<'_> {
        EntityReflector::new(&self.rules)
    }

    /// Metadata for `T`, derived on first use and cached.
    ///
    /// # Errors
    ///
    /// `DatabaseClosed` after close, or the derivation error.
    pub fn metadata<T: Reflect>(&self) -> CoreResult<Arc<EntityMetadata>> {
        self.ensure_open()?;
        self.metadata.get_or_derive::<T>(&self.reflector())
    }

    /// A typed access object for entity `E` keyed by `K`.
    ///
    /// # Errors
    ///
    /// `DatabaseClosed` after close, derivation errors, the backend's
    /// `UnsupportedEntity`, or `InvalidOperation` when `K` does not match
    /// the primary key.
    pub fn dao<E: Entity, K: AttributeValue>(&self) -> CoreResult<Dao<E, K>> {
        let metadata = self.metadata::<E>()?;
        let dao = self.dao_factory()?.create_dao(metadata)?;
        Dao::new(dao)
    }

    /// Runs `f` against the database, then closes it.
    ///
    /// The database is closed on every exit path. The error from `f` takes
    /// precedence over a close failure.
    ///
    /// # Errors
    ///
    /// The error from `f`, else the error from [`Database::close`].
    pub fn scope<R>(self, f: impl FnOnce(&Self) -> CoreResult<R>) -> CoreResult<R> {
        let result = f(&self);
        let closed = self.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    /// Stops the extension and closes the database.
    ///
    /// Closing an already closed database is a no-op. The database is
    /// closed even when the extension's `on_stop` fails.
    ///
    /// # Errors
    ///
    /// `Lifecycle` wrapping the `on_stop` failure.
    pub fn close(&self) -> CoreResult<()> {
        let mut state = self.state.write();
        let previous = std::mem::replace(&mut *state, LifecycleState::Closed);
        if previous != LifecycleState::Started {
            return Ok(());
        }

        self.dao_factory.write().take();
        self.metadata.clear();

        self.extension
            .on_stop(&self.settings)
            .map_err(|error| CoreError::lifecycle("on_stop", error))?;

        info!(
            backend = self.extension.kind(),
            database = %self.settings.name,
            "database closed"
        );
        Ok(())
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CoreError::DatabaseClosed)
        }
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.settings.name)
            .field("version", &self.settings.version)
            .field("backend", &self.extension.kind())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            warn!(database = %self.settings.name, %error, "failed to close database on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ProbeExtension;

    crate::entity! {
        #[derive(Debug, Default)]
        struct Gadget {
            #[key]
            id: i64,
            label: String,
            #[transient]
            scratch: i64,
        }
    }

    fn settings() -> DatabaseSettings {
        DatabaseSettings::new("db1", 0).with_credentials(Credentials::new("user", "password"))
    }

    #[test]
    fn start_runs_on_start() {
        let (extension, calls) = ProbeExtension::new();
        let db = extension.build(settings()).unwrap();

        assert_eq!(calls.starts(), 1);
        assert_eq!(db.state(), LifecycleState::Started);
        assert!(db.is_open());
        assert_eq!(db.name(), "db1");
        assert_eq!(db.version(), 0);
        assert_eq!(db.user(), Some("user"));
        assert_eq!(db.password(), Some("password"));
        assert_eq!(db.uri().unwrap(), "probe://db1/0");
    }

    #[test]
    fn start_failure_is_builder_error() {
        let (mut extension, calls) = ProbeExtension::new();
        extension.fail_start = true;

        let err = extension.build(settings()).unwrap_err();
        match &err {
            CoreError::DatabaseBuilder { source, .. } => {
                let source = source.as_ref().unwrap();
                assert!(source.to_string().contains("refused to start"));
            }
            other => panic!("expected builder error, got {other}"),
        }
        assert_eq!(calls.stops(), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let (extension, calls) = ProbeExtension::new();
        let db = extension.build(settings()).unwrap();

        db.close().unwrap();
        db.close().unwrap();
        drop(db);

        assert_eq!(calls.stops(), 1);
    }

    #[test]
    fn close_failure_still_closes() {
        let (mut extension, calls) = ProbeExtension::new();
        extension.fail_stop = true;
        let db = extension.build(settings()).unwrap();

        let err = db.close().unwrap_err();
        assert!(matches!(err, CoreError::Lifecycle { hook: "on_stop", .. }));
        assert_eq!(db.state(), LifecycleState::Closed);

        db.close().unwrap();
        assert_eq!(calls.stops(), 1);
    }

    #[test]
    fn drop_closes() {
        let (extension, calls) = ProbeExtension::new();
        {
            let _db = extension.build(settings()).unwrap();
        }
        assert_eq!(calls.stops(), 1);
    }

    #[test]
    fn scope_closes_on_error() {
        let (extension, calls) = ProbeExtension::new();
        let db = extension.build(settings()).unwrap();

        let result: CoreResult<()> =
            db.scope(|_| Err(CoreError::invalid_operation("inside scope")));
        assert!(matches!(result, Err(CoreError::InvalidOperation { .. })));
        assert_eq!(calls.stops(), 1);
    }

    #[test]
    fn factory_is_cached() {
        let (extension, calls) = ProbeExtension::new();
        let db = extension.build(settings()).unwrap();

        let first = db.dao_factory().unwrap();
        let second = db.dao_factory().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.factories(), 1);
    }

    #[test]
    fn metadata_is_cached() {
        let (extension, _) = ProbeExtension::new();
        let db = extension.build(settings()).unwrap();

        let first = db.metadata::<Gadget>().unwrap();
        let second = db.metadata::<Gadget>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(matches!(
            db.metadata::<i64>(),
            Err(CoreError::NotAnEntity { .. })
        ));
    }

    #[test]
    fn metadata_follows_extension_predicates() {
        let (extension, _) = ProbeExtension::new();
        let db = extension.build(settings()).unwrap();
        assert!(db.metadata::<Gadget>().unwrap().attribute("scratch").is_none());

        let (mut extension, _) = ProbeExtension::new();
        extension.accept_transient = true;
        let db = extension.build(settings()).unwrap();
        let metadata = db.metadata::<Gadget>().unwrap();
        assert!(metadata.attribute("scratch").is_some());
        assert!(metadata.attribute("label").is_some());
    }

    #[test]
    fn dao_surfaces_backend_rejection() {
        let (extension, _) = ProbeExtension::new();
        let db = extension.build(settings()).unwrap();

        let err = db.dao::<Gadget, i64>().unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedEntity { .. }));
    }

    #[test]
    fn closed_database_rejects_requests() {
        let (extension, _) = ProbeExtension::new();
        let db = extension.build(settings()).unwrap();
        db.close().unwrap();

        assert!(matches!(db.uri(), Err(CoreError::DatabaseClosed)));
        assert!(matches!(db.dao_factory(), Err(CoreError::DatabaseClosed)));
        assert!(matches!(db.metadata::<Gadget>(), Err(CoreError::DatabaseClosed)));
        assert!(matches!(db.dao::<Gadget, i64>(), Err(CoreError::DatabaseClosed)));
        assert_eq!(db.name(), "db1");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let debug = format!("{:?}", Credentials::new("user", "hunter2"));
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }
}
