//! Engine configuration
//!
//! Diagnostic defaults and the enum collaborator are carried by an explicit
//! [`EngineConfig`] value attached to every schema at construction time.
//! A process-wide default may be installed once at startup; schemas defined
//! with [`Schema::define`](crate::Schema::define) pick it up, schemas defined
//! with [`Schema::define_in`](crate::Schema::define_in) use the config given.

use crate::enums::EnumFactory;
use crate::error::{Diagnostics, Error, Result};
use std::fmt;
use std::sync::{Arc, OnceLock};

static GLOBAL_CONFIG: OnceLock<Arc<EngineConfig>> = OnceLock::new();

/// Engine-wide defaults
#[derive(Clone, Default)]
pub struct EngineConfig {
    /// Warn on type mismatches
    pub debug: bool,
    /// Fail on type mismatches
    pub strict: bool,
    pub enum_factory: Option<Arc<dyn EnumFactory>>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    pub fn with_enum_factory(mut self, factory: impl EnumFactory + 'static) -> Self {
        self.enum_factory = Some(Arc::new(factory));
        self
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::from_flags(self.debug, self.strict)
    }

    /// Install this config as the process-wide default. Only the first call succeeds.
    pub fn install(self) -> Result<Arc<EngineConfig>> {
        let config = Arc::new(self);
        GLOBAL_CONFIG
            .set(Arc::clone(&config))
            .map_err(|_| Error::configuration("engine configuration is already installed"))?;
        Ok(config)
    }

    /// The installed process-wide config, or the default when none was installed
    pub fn global() -> Arc<EngineConfig> {
        GLOBAL_CONFIG
            .get()
            .cloned()
            .unwrap_or_else(|| Arc::new(EngineConfig::default()))
    }

    pub fn into_shared(self) -> Arc<EngineConfig> {
        Arc::new(self)
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("debug", &self.debug)
            .field("strict", &self.strict)
            .field("enum_factory", &self.enum_factory.is_some())
            .finish()
    }
}
