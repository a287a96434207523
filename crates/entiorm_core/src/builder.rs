//! The database builder protocol.

use crate::database::{Credentials, Database, DatabaseSettings};
use crate::error::{CoreError, CoreResult};
use tracing::warn;

/// Constructs a started [`Database`] for one backend.
///
/// Name and version are fixed at creation; credentials are supplied
/// before [`DatabaseBuilder::build`]. A builder builds at most once.
pub trait DatabaseBuilder: Send {
    /// Creates a builder for database `name` at schema `version`.
    ///
    /// # Errors
    ///
    /// Backend-specific; an empty name is always rejected.
    fn create(name: &str, version: u32) -> CoreResult<Self>
    where
        Self: Sized;

    /// Database name.
    fn name(&self) -> &str;

    /// Schema version.
    fn version(&self) -> u32;

    /// Supplies credentials. Has no effect after a successful build.
    fn set_credentials(&mut self, user: &str, password: &str);

    /// Chained form of [`DatabaseBuilder::set_credentials`].
    #[must_use]
    fn with_credentials(mut self, user: &str, password: &str) -> Self
    where
        Self: Sized,
    {
        self.set_credentials(user, password);
        self
    }

    /// Starts the database.
    ///
    /// # Errors
    ///
    /// `DatabaseBuilder` when credentials are missing, the builder was
    /// already built, or the backend fails to start.
    fn build(&mut self) -> CoreResult<Database>;
}

/// Name, version and credential bookkeeping shared by builder
/// implementations.
#[derive(Debug, Clone)]
pub struct BuilderState {
    name: String,
    version: u32,
    credentials: Option<Credentials>,
    built: bool,
}

impl BuilderState {
    /// Creates state for `name` at `version`.
    ///
    /// # Errors
    ///
    /// `DatabaseBuilder` if `name` is empty.
    pub fn new(name: &str, version: u32) -> CoreResult<Self> {
        if name.is_empty() {
            return Err(CoreError::builder_failed("database name must not be empty"));
        }
        Ok(Self {
            name: name.to_string(),
            version,
            credentials: None,
            built: false,
        })
    }

    /// Database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Credentials supplied so far.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Whether a database has been built.
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Records credentials unless already built.
    pub fn set_credentials(&mut self, user: &str, password: &str) {
        if self.built {
            warn!(database = %self.name, "credentials set after build are ignored");
            return;
        }
        self.credentials = Some(Credentials::new(user, password));
    }

    /// Settings for the build about to happen.
    ///
    /// # Errors
    ///
    /// `DatabaseBuilder` if already built, or if `require_credentials` is
    /// set and none were supplied.
    pub fn settings(&self, require_credentials: bool) -> CoreResult<DatabaseSettings> {
        if self.built {
            return Err(CoreError::builder_failed(format!(
                "database {} already built",
                self.name
            )));
        }

        let settings = DatabaseSettings::new(self.name.clone(), self.version);
        match &self.credentials {
            Some(credentials) => Ok(settings.with_credentials(credentials.clone())),
            None if require_credentials => Err(CoreError::builder_failed(format!(
                "no credentials supplied for database {}",
                self.name
            ))),
            None => Ok(settings),
        }
    }

    /// Records a successful build.
    pub fn mark_built(&mut self) {
        self.built = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ProbeBuilder;

    #[test]
    fn empty_name_rejected() {
        assert!(matches!(
            BuilderState::new("", 1),
            Err(CoreError::DatabaseBuilder { .. })
        ));
    }

    #[test]
    fn settings_require_credentials() {
        let mut state = BuilderState::new("db1", 0).unwrap();
        assert!(matches!(
            state.settings(true),
            Err(CoreError::DatabaseBuilder { .. })
        ));
        assert!(state.settings(false).unwrap().credentials().is_none());

        state.set_credentials("user", "password");
        let settings = state.settings(true).unwrap();
        assert_eq!(settings.credentials().unwrap().user(), "user");
    }

    #[test]
    fn builds_once() {
        let mut builder = ProbeBuilder::create("db1", 0)
            .unwrap()
            .with_credentials("user", "password");

        let db = builder.build().unwrap();
        assert_eq!(db.user(), Some("user"));

        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("already built"));
    }

    #[test]
    fn late_credentials_ignored() {
        let mut state = BuilderState::new("db1", 0).unwrap();
        state.set_credentials("user", "password");
        state.mark_built();
        state.set_credentials("intruder", "secret");
        assert_eq!(state.credentials().unwrap().user(), "user");
    }

    #[test]
    fn build_without_credentials_fails() {
        let mut builder = ProbeBuilder::create("db1", 0).unwrap();
        assert!(matches!(
            builder.build(),
            Err(CoreError::DatabaseBuilder { .. })
        ));
    }
}
