//! Builder for serial databases.

use crate::config::SerialConfig;
use crate::extension::SerialExtension;
use entiorm_core::{BuilderState, CoreResult, Database, DatabaseBuilder, Extension};

/// Builds a [`Database`] backed by a [`SerialExtension`].
///
/// ```
/// use entiorm_core::DatabaseBuilder;
/// use entiorm_serial::{SerialConfig, SerialDatabaseBuilder};
///
/// let mut builder = SerialDatabaseBuilder::create("db1", 0)
///     .unwrap()
///     .with_config(SerialConfig::in_memory())
///     .with_credentials("user", "password");
///
/// let db = builder.build().unwrap();
/// assert!(db.uri().unwrap().ends_with("db1.ser"));
/// db.close().unwrap();
/// ```
#[derive(Debug)]
pub struct SerialDatabaseBuilder {
    state: BuilderState,
    config: SerialConfig,
}

impl SerialDatabaseBuilder {
    /// Replaces the backend configuration.
    #[must_use]
    pub fn with_config(mut self, config: SerialConfig) -> Self {
        self.config = config;
        self
    }

    /// The backend configuration.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl DatabaseBuilder for SerialDatabaseBuilder {
    fn create(name: &str, version: u32) -> CoreResult<Self> {
        Ok(Self {
            state: BuilderState::new(name, version)?,
            config: SerialConfig::default(),
        })
    }

    fn name(&self) -> &str {
        self.state.name()
    }

    fn version(&self) -> u32 {
        self.state.version()
    }

    fn set_credentials(&mut self, user: &str, password: &str) {
        self.state.set_credentials(user, password);
    }

    fn build(&mut self) -> CoreResult<Database> {
        let settings = self.state.settings(self.config.require_credentials)?;
        let database = SerialExtension::new(self.config.clone()).build(settings)?;
        self.state.mark_built();
        Ok(database)
    }
}
