//! Test doubles shared by the unit tests.

use crate::backend::{DaoFactory, Extension, RecordDao};
use crate::builder::{BuilderState, DatabaseBuilder};
use crate::database::{Database, DatabaseSettings};
use crate::error::{CoreError, CoreResult};
use crate::reflect::{EntityMetadata, FieldDescriptor, Modifier};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Hook call counts observed by a [`ProbeExtension`].
#[derive(Debug, Default)]
pub(crate) struct Calls {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub factories: AtomicUsize,
}

impl Calls {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn factories(&self) -> usize {
        self.factories.load(Ordering::SeqCst)
    }
}

/// Extension that records hook calls and can be told to fail them.
#[derive(Debug, Default)]
pub(crate) struct ProbeExtension {
    pub calls: Arc<Calls>,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub accept_transient: bool,
}

impl ProbeExtension {
    pub fn new() -> (Self, Arc<Calls>) {
        let extension = Self::default();
        let calls = Arc::clone(&extension.calls);
        (extension, calls)
    }
}

impl Extension for ProbeExtension {
    fn kind(&self) -> &str {
        "probe"
    }

    fn uri(&self, settings: &DatabaseSettings) -> CoreResult<String> {
        Ok(format!("probe://{}/{}", settings.name(), settings.version()))
    }

    fn dao_factory(&self) -> CoreResult<Arc<dyn DaoFactory>> {
        self.calls.factories.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(RejectingFactory))
    }

    fn on_start(&self, _settings: &DatabaseSettings) -> CoreResult<()> {
        self.calls.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(CoreError::invalid_operation("probe refused to start"));
        }
        Ok(())
    }

    fn on_stop(&self, _settings: &DatabaseSettings) -> CoreResult<()> {
        self.calls.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(CoreError::invalid_operation("probe refused to stop"));
        }
        Ok(())
    }

    fn is_viable_field(&self, field: &FieldDescriptor) -> bool {
        if self.accept_transient && field.has_modifier(Modifier::Transient) {
            return !field.ignored;
        }
        self.viability().is_viable_field(field)
    }
}

/// Factory that hosts nothing.
#[derive(Debug)]
pub(crate) struct RejectingFactory;

impl DaoFactory for RejectingFactory {
    fn create_dao(&self, metadata: Arc<EntityMetadata>) -> CoreResult<Box<dyn RecordDao>> {
        Err(CoreError::unsupported_entity(
            metadata.entity_name(),
            "probe backend stores nothing",
        ))
    }
}

/// Builder over [`ProbeExtension`].
#[derive(Debug)]
pub(crate) struct ProbeBuilder {
    state: BuilderState,
}

impl DatabaseBuilder for ProbeBuilder {
    fn create(name: &str, version: u32) -> CoreResult<Self> {
        if name == "explode" {
            return Err(CoreError::invalid_operation("probe cannot host explode"));
        }
        Ok(Self {
            state: BuilderState::new(name, version)?,
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
        let settings = self.state.settings(true)?;
        let database = ProbeExtension::default().build(settings)?;
        self.state.mark_built();
        Ok(database)
    }
}
