//! Serialise environment mutations across tests.
//!
//! The `EnvLock` guard ensures that changes to global state like `KUMIKI_BUILD_TOOL` are
//! synchronised, preventing interference between concurrently running tests.

use std::sync::{Mutex, MutexGuard};
use std::{fmt, fmt::Formatter};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// RAII guard that holds the global environment lock.
pub struct EnvLock {
    _guard: MutexGuard<'static, ()>,
}

impl fmt::Debug for EnvLock {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvLock").finish_non_exhaustive()
    }
}

impl EnvLock {
    /// Acquire the global lock serialising environment mutations.
    pub fn acquire() -> Self {
        let guard = ENV_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Self { _guard: guard }
    }
}
