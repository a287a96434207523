//! Backend-independent entry point for obtaining builders.

use crate::builder::DatabaseBuilder;
use crate::error::{CoreError, CoreResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

type BuilderConstructor = fn(&str, u32) -> CoreResult<Box<dyn DatabaseBuilder>>;

/// Instantiates database builders, by type or by registered backend name.
///
/// The facade is an ordinary value; applications create one and register
/// the backends they link.
#[derive(Default)]
pub struct PersistenceFacade {
    constructors: RwLock<HashMap<String, BuilderConstructor>>,
}

impl PersistenceFacade {
    /// Creates a facade with no registered backends.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates builder `B` for database `name` at `version`.
    ///
    /// # Errors
    ///
    /// `DatabaseBuilder`; failures of other kinds are wrapped.
    pub fn database_builder<B: DatabaseBuilder>(name: &str, version: u32) -> CoreResult<B> {
        B::create(name, version).map_err(|error| match error {
            CoreError::DatabaseBuilder { .. } => error,
            other => CoreError::builder_failed_with(
                format!("cannot instantiate {}", std::any::type_name::<B>()),
                other,
            ),
        })
    }

    /// Registers builder `B` under `kind`, replacing any earlier entry.
    pub fn register<B: DatabaseBuilder + 'static>(&self, kind: impl Into<String>) {
        let kind = kind.into();
        debug!(%kind, builder = std::any::type_name::<B>(), "registered database builder");
        self.constructors.write().insert(kind, boxed::<B>);
    }

    /// Chained form of [`PersistenceFacade::register`].
    #[must_use]
    pub fn with<B: DatabaseBuilder + 'static>(self, kind: impl Into<String>) -> Self {
        self.register::<B>(kind);
        self
    }

    /// Whether a builder is registered under `kind`.
    pub fn is_registered(&self, kind: &str) -> bool {
        self.constructors.read().contains_key(kind)
    }

    /// Registered backend names, sorted.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.constructors.read().keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Instantiates the builder registered under `kind`.
    ///
    /// # Errors
    ///
    /// `DatabaseBuilder` if `kind` is unknown or instantiation fails.
    pub fn builder(&self, kind: &str, name: &str, version: u32) -> CoreResult<Box<dyn DatabaseBuilder>> {
        let constructor = self
            .constructors
            .read()
            .get(kind)
            .copied()
            .ok_or_else(|| CoreError::builder_failed(format!("no backend registered as {kind}")))?;
        constructor(name, version)
    }
}

impl std::fmt::Debug for PersistenceFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceFacade")
            .field("kinds", &self.kinds())
            .finish()
    }
}

fn boxed<B: DatabaseBuilder + 'static>(name: &str, version: u32) -> CoreResult<Box<dyn DatabaseBuilder>> {
    let builder = PersistenceFacade::database_builder::<B>(name, version)?;
    Ok(Box::new(builder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ProbeBuilder;

    #[test]
    fn instantiates_by_type() {
        let builder = PersistenceFacade::database_builder::<ProbeBuilder>("db1", 3).unwrap();
        assert_eq!(builder.name(), "db1");
        assert_eq!(builder.version(), 3);
    }

    #[test]
    fn wraps_instantiation_failures() {
        let err = PersistenceFacade::database_builder::<ProbeBuilder>("explode", 0).unwrap_err();
        match err {
            CoreError::DatabaseBuilder { message, source } => {
                assert!(message.contains("ProbeBuilder"));
                assert!(source.is_some());
            }
            other => panic!("expected builder error, got {other}"),
        }

        assert!(matches!(
            PersistenceFacade::database_builder::<ProbeBuilder>("", 0),
            Err(CoreError::DatabaseBuilder { source: None, .. })
        ));
    }

    #[test]
    fn instantiates_by_kind() {
        let facade = PersistenceFacade::new().with::<ProbeBuilder>("probe");
        assert!(facade.is_registered("probe"));
        assert_eq!(facade.kinds(), vec!["probe".to_string()]);

        let mut builder = facade.builder("probe", "db1", 0).unwrap();
        builder.set_credentials("user", "password");
        let db = builder.build().unwrap();
        assert_eq!(db.extension().kind(), "probe");
    }

    #[test]
    fn unknown_kind_fails() {
        let facade = PersistenceFacade::new();
        assert!(matches!(
            facade.builder("sql", "db1", 0),
            Err(CoreError::DatabaseBuilder { .. })
        ));
    }
}
