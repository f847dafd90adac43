//! Explicit backend-to-dialect registry
//!
//! The registry maps a [`BackendKind`] to a dialect constructor. It is
//! populated at startup; resolution is a map lookup, never reflection or
//! runtime type discovery. Hosting systems can register replacements for
//! the built-in dialects (e.g. a SQL Server dialect with amended error
//! codes) before any connection is constructed.

use crate::codes::ErrorCodeConfig;
use crate::{Dialect, MySqlDialect, OracleDialect, SqlServerDialect};
use once_cell::sync::Lazy;
use relica_core::config::BackendKind;
use relica_core::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Constructor for a dialect, taking the error-code sets to classify with.
pub type DialectFactory = fn(ErrorCodeConfig) -> Arc<dyn Dialect>;

static BUILTIN: Lazy<BackendRegistry> = Lazy::new(BackendRegistry::with_builtin);

/// Registry of dialect constructors keyed by backend kind.
pub struct BackendRegistry {
    factories: HashMap<BackendKind, DialectFactory>,
}

impl BackendRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        BackendRegistry {
            factories: HashMap::new(),
        }
    }

    /// A registry with the three built-in dialects registered.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(BackendKind::SqlServer, |codes| {
            Arc::new(SqlServerDialect::with_codes(codes))
        });
        registry.register(BackendKind::Oracle, |codes| {
            Arc::new(OracleDialect::with_codes(codes))
        });
        registry.register(BackendKind::MySql, |codes| {
            Arc::new(MySqlDialect::with_codes(codes))
        });
        registry
    }

    /// The shared built-in registry.
    pub fn builtin() -> &'static BackendRegistry {
        &BUILTIN
    }

    /// Register (or replace) the factory for a backend kind.
    pub fn register(&mut self, kind: BackendKind, factory: DialectFactory) {
        self.factories.insert(kind, factory);
    }

    /// Resolve a dialect with explicit error-code sets.
    pub fn resolve(&self, kind: BackendKind, codes: ErrorCodeConfig) -> Result<Arc<dyn Dialect>> {
        let factory = self
            .factories
            .get(&kind)
            .ok_or_else(|| Error::Config(format!("no dialect registered for backend {}", kind)))?;
        Ok(factory(codes))
    }

    /// Resolve a dialect with the shipped error-code defaults for its kind.
    pub fn resolve_default(&self, kind: BackendKind) -> Result<Arc<dyn Dialect>> {
        let codes = match kind {
            BackendKind::SqlServer => ErrorCodeConfig::sql_server(),
            BackendKind::Oracle => ErrorCodeConfig::oracle(),
            BackendKind::MySql => ErrorCodeConfig::mysql(),
        };
        self.resolve(kind, codes)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
