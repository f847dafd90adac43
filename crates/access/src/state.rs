//! Data-Access State
//!
//! `AccessState` bundles everything one logical unit of data access needs:
//! the primary connection, named secondary connections, and a typed cache
//! for state that is expensive to recompute (resolved descriptors,
//! prepared lookups). A state belongs to one unit of work at a time; it is
//! never shared between concurrent workers.
//!
//! State is normally passed explicitly. For call paths that cannot thread
//! a parameter through (UI callbacks, legacy entry points) a per-thread
//! override stack exists: [`push_override`] installs a state for the
//! current thread and returns a guard that uninstalls it on drop, and
//! [`current`] reads the innermost installed state. The override stack is
//! the only mutable global in the crate, and it is thread-local, so
//! overrides on one thread are invisible to every other.

use parking_lot::Mutex;
use relica_conn::Connection;
use relica_core::error::{Error, Result};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared handle to an [`AccessState`], as the override stack carries it.
pub type SharedState = Arc<Mutex<AccessState>>;

/// Connections and cached state for one unit of data access.
pub struct AccessState {
    primary: Connection,
    secondary: HashMap<String, Connection>,
    cache: HashMap<String, Box<dyn Any + Send>>,
}

impl AccessState {
    /// State over a primary connection and no secondaries.
    pub fn new(primary: Connection) -> Self {
        AccessState {
            primary,
            secondary: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    /// The primary connection.
    pub fn primary(&mut self) -> &mut Connection {
        &mut self.primary
    }

    /// Register a named secondary connection, replacing any previous one
    /// under the same name.
    pub fn add_secondary(&mut self, name: impl Into<String>, conn: Connection) {
        self.secondary.insert(name.into(), conn);
    }

    /// A named secondary connection.
    pub fn secondary(&mut self, name: &str) -> Result<&mut Connection> {
        self.secondary
            .get_mut(name)
            .ok_or_else(|| Error::Config(format!("no secondary database named '{}'", name)))
    }

    /// Store a typed value under a key, replacing any previous value.
    pub fn cache_put<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.cache.insert(key.into(), Box::new(value));
    }

    /// Read a cached value; `None` when the key is absent or holds a
    /// different type.
    pub fn cache_get<T: Any + Send>(&self, key: &str) -> Option<&T> {
        self.cache.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Remove a cached value, returning it when the type matches.
    pub fn cache_remove<T: Any + Send>(&mut self, key: &str) -> Option<T> {
        let boxed = self.cache.remove(key)?;
        match boxed.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(boxed) => {
                self.cache.insert(key.to_string(), boxed);
                None
            }
        }
    }

    /// Drop every cached value.
    pub fn cache_clear(&mut self) {
        self.cache.clear();
    }
}

thread_local! {
    static OVERRIDES: RefCell<Vec<SharedState>> = const { RefCell::new(Vec::new()) };
}

/// Install `state` as the current thread's access state until the
/// returned guard drops. Overrides nest; the innermost wins.
pub fn push_override(state: SharedState) -> OverrideGuard {
    OVERRIDES.with(|stack| stack.borrow_mut().push(state));
    OverrideGuard {
        _not_send: std::marker::PhantomData,
    }
}

/// The innermost access state installed on this thread, if any.
pub fn current() -> Option<SharedState> {
    OVERRIDES.with(|stack| stack.borrow().last().cloned())
}

/// Uninstalls the override pushed with it. Not `Send`; the override is
/// pinned to the thread that installed it.
pub struct OverrideGuard {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        OVERRIDES.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
