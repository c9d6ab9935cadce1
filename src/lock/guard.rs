use std::fmt::Debug;

use super::KeyLock;
use crate::error::LockError;
use crate::store::CounterStore;

/// Scoped acquisition of one key.
///
/// Created only by a successful acquire. Dropping the guard releases the key,
/// which covers early returns, `?`, panics, and dropped futures alike. Use
/// [`release`](LockGuard::release) on the normal path to see store errors;
/// a failed release during drop can only be logged.
#[must_use = "dropping the guard releases the lock immediately"]
pub struct LockGuard<'a, K: Debug, S: CounterStore<K>> {
    lock: &'a KeyLock<K, S>,
    key: K,
    released: bool,
}

impl<'a, K: Debug, S: CounterStore<K>> LockGuard<'a, K, S> {
    pub(crate) fn new(lock: &'a KeyLock<K, S>, key: K) -> Self {
        LockGuard {
            lock,
            key,
            released: false,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    /// Release the key now and report whether the store accepted it.
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        if !self.lock.release(&self.key)? {
            tracing::warn!(key = ?self.key, "release left the counter above free");
        }
        Ok(())
    }
}

impl<K: Debug, S: CounterStore<K>> Drop for LockGuard<'_, K, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.lock.release(&self.key) {
            tracing::error!(key = ?self.key, error = %e, "failed to release lock on drop");
        }
    }
}
