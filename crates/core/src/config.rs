//! Connection configuration
//!
//! Profiles are plain serde structs so hosting systems can load them from
//! whatever configuration source they already use. The dialect turns a
//! profile into a vendor connection string.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of supported backend families.
///
/// Backend selection is explicit enum dispatch: a profile names its kind,
/// the registry resolves the dialect at startup. There is no runtime type
/// inspection or reflection-based provider loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// SQL-Server-like backends (snapshot isolation, `SAVE TRANSACTION`).
    SqlServer,
    /// Oracle-like backends (sequences via `NEXTVAL`, `:name` parameters).
    Oracle,
    /// MySQL-like backends (MariaDB-style sequences, `?` parameters).
    MySql,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::SqlServer => write!(f, "SqlServer"),
            BackendKind::Oracle => write!(f, "Oracle"),
            BackendKind::MySql => write!(f, "MySql"),
        }
    }
}

/// Isolation level requested when a real transaction starts.
///
/// The dialect picks the level: snapshot-style optimistic isolation where
/// the backend supports it, read-committed otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IsolationLevel {
    /// Read committed.
    ReadCommitted,
    /// Snapshot / optimistic isolation.
    Snapshot,
    /// Serializable.
    Serializable,
}

/// Everything needed to open one physical connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Backend family.
    pub backend: BackendKind,
    /// Server host or instance name.
    pub server: String,
    /// Database (or schema) name; also used in error diagnostics.
    pub database: String,
    /// Login user; `None` means integrated/ambient authentication.
    pub user: Option<String>,
    /// Login password.
    pub password: Option<String>,
    /// Command timeout in seconds; `None` means the driver default.
    /// Statements marked long-running bypass this entirely.
    pub command_timeout_secs: Option<u32>,
    /// Application name reported to the server, for diagnostics.
    pub application_name: Option<String>,
}

impl ConnectionProfile {
    /// A minimal profile for the given backend, server, and database.
    pub fn new(backend: BackendKind, server: impl Into<String>, database: impl Into<String>) -> Self {
        ConnectionProfile {
            backend,
            server: server.into(),
            database: database.into(),
            user: None,
            password: None,
            command_timeout_secs: None,
            application_name: None,
        }
    }

    /// Set login credentials.
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }
}
