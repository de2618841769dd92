//! Atomically-swapped active rule set.
//!
//! A rebuild populates a complete [`CompiledRoutes`] and only then replaces
//! the published one, so in-flight rule evaluation always observes one
//! consistent set. A failed rebuild leaves the prior set active — the swap
//! step simply never happens.

use std::sync::{Arc, Mutex, RwLock};

use crate::compile::CompiledRoutes;
use crate::error::CompileError;

/// Holder for the currently-active compiled rule set.
///
/// The compiler itself holds no mutable state; this is the one place a
/// completed pass is published. `current()` is a cheap `Arc` clone; reads
/// never block behind a rebuild.
pub struct ActiveRules {
    /// Published snapshot, swapped wholesale.
    current: RwLock<Arc<CompiledRoutes>>,
    /// Serializes rebuilds; readers are unaffected.
    rebuild_lock: Mutex<()>,
}

impl ActiveRules {
    /// Publish an initial rule set.
    #[must_use]
    pub fn new(initial: CompiledRoutes) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            rebuild_lock: Mutex::new(()),
        }
    }

    /// The currently-published rule set.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn current(&self) -> Arc<CompiledRoutes> {
        self.current.read().unwrap().clone()
    }

    /// Run a full compilation pass and publish the result.
    ///
    /// The closure builds a complete rule set; only on success is it
    /// swapped in. On error the previously-active set stays published and
    /// the error is returned to the caller.
    ///
    /// # Errors
    ///
    /// Propagates the closure's [`CompileError`].
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub fn rebuild<F>(&self, build: F) -> Result<Arc<CompiledRoutes>, CompileError>
    where
        F: FnOnce() -> Result<CompiledRoutes, CompileError>,
    {
        let _guard = self.rebuild_lock.lock().unwrap();

        let routes = Arc::new(build()?);
        *self.current.write().unwrap() = Arc::clone(&routes);
        Ok(routes)
    }
}
