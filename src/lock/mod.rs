//! Per-key lock primitive built on a counter store's bounded increment.
//!
//! A key's counter is a three-state value:
//!
//! - `0`: free
//! - `1`: held by exactly one owner
//! - `2`: held, and at least one other acquire attempt happened meanwhile
//!
//! Acquire increments with a ceiling of 2; the single caller that sees the
//! counter land on 1 owns the lock. Release increments with a ceiling of 0,
//! which forces any positive value back to free. Neither side reads before
//! writing, so there is no check-then-act window to race on.

mod guard;

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{LockError, Phase};
use crate::store::{CounterStore, InMemoryCounterStore};

pub use guard::LockGuard;

pub const FREE: i64 = 0;
pub const HELD: i64 = 1;
pub const CONTENDED: i64 = 2;

/// Acquire/release for arbitrary keys against a shared `CounterStore`.
///
/// `KeyLock` itself holds no state besides the store handle; clones share
/// the same store and therefore the same locks.
pub struct KeyLock<K, S = InMemoryCounterStore<K>> {
    store: Arc<S>,
    _key: PhantomData<fn(&K)>,
}

impl<K, S> Clone for KeyLock<K, S> {
    fn clone(&self) -> Self {
        KeyLock {
            store: Arc::clone(&self.store),
            _key: PhantomData,
        }
    }
}

impl<K, S> KeyLock<K, S>
where
    K: Debug,
    S: CounterStore<K>,
{
    pub fn new(store: Arc<S>) -> Self {
        KeyLock {
            store,
            _key: PhantomData,
        }
    }

    /// The store this lock synchronizes through.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Make one attempt to take the lock for `key`.
    ///
    /// Returns `Ok(true)` if this call moved the counter from free to held.
    /// `Ok(false)` means somebody else holds it; the caller must not enter the
    /// critical section and must not release.
    pub fn acquire(&self, key: &K) -> Result<bool, LockError> {
        let value = self
            .store
            .bounded_increment(key, 1, CONTENDED, FREE)
            .map_err(|e| LockError::store(key, Phase::Acquire, e))?;
        let acquired = value == HELD;
        tracing::trace!(key = ?key, value, acquired, "acquire attempt");
        Ok(acquired)
    }

    /// Reset the counter for `key` to free.
    ///
    /// Must be called exactly once per successful `acquire`. Returns whether
    /// the counter ended up free, which is always the case for a counter in
    /// one of the three lock states.
    pub fn release(&self, key: &K) -> Result<bool, LockError> {
        let value = self
            .store
            .bounded_increment(key, 1, FREE, FREE)
            .map_err(|e| LockError::store(key, Phase::Release, e))?;
        let released = value == FREE;
        tracing::trace!(key = ?key, value, released, "release");
        Ok(released)
    }

    /// Make one acquire attempt and, on success, wrap it in a guard that
    /// releases the key when dropped.
    pub fn try_guard(&self, key: K) -> Result<Option<LockGuard<'_, K, S>>, LockError> {
        if self.acquire(&key)? {
            Ok(Some(LockGuard::new(self, key)))
        } else {
            Ok(None)
        }
    }
}
