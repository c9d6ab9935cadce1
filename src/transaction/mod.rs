//! Acquire, run, release: the public transaction entry points.
//!
//! ## Example
//!
//! ```ignore
//! use keyed_lock::Transactor;
//!
//! let transactor = Transactor::new();
//!
//! // key + zero-argument closure
//! let n = transactor.transaction("account:1", || 41 + 1)?;
//!
//! // key + closure + argument tuple
//! let sum = transactor.transaction_with("account:1", |a: i64, b: i64| a + b, (1, 2))?;
//!
//! // key + registered module/function + argument list
//! let balance = transactor.call_named("account:1", "accounts", "balance", json!(["account:1"]))?;
//! ```

#[cfg(feature = "tokio")]
mod asynchronous;
mod dynamic;
mod invoke;
mod registry;

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use serde_json::Value;

use crate::backoff::{Backoff, BackoffConfig};
use crate::error::{LockError, TransactionError};
use crate::lock::{KeyLock, LockGuard};
use crate::store::{CounterStore, InMemoryCounterStore};

pub use dynamic::{DynFn, FunctionRef, Target};
pub use invoke::Invoke;
pub use registry::FunctionRegistry;

/// Runs work under a per-key lock, retrying with jitter while the key is
/// held elsewhere.
///
/// There is no coordinator: every caller acquires and releases through the
/// shared counter store on its own thread (or task). Clones share the store,
/// the backoff config, and the function registry.
pub struct Transactor<K, S = InMemoryCounterStore<K>> {
    lock: KeyLock<K, S>,
    config: BackoffConfig,
    registry: Arc<FunctionRegistry>,
}

impl<K, S> Clone for Transactor<K, S> {
    fn clone(&self) -> Self {
        Transactor {
            lock: self.lock.clone(),
            config: self.config,
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<K> Transactor<K>
where
    K: Eq + Hash + Clone + Send + Sync + Debug,
{
    /// A transactor over a fresh in-memory counter store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryCounterStore::new()))
    }
}

impl<K> Default for Transactor<K>
where
    K: Eq + Hash + Clone + Send + Sync + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> Transactor<K, S>
where
    K: Debug,
    S: CounterStore<K>,
{
    pub fn with_store(store: Arc<S>) -> Self {
        Transactor {
            lock: KeyLock::new(store),
            config: BackoffConfig::default(),
            registry: Arc::new(FunctionRegistry::new()),
        }
    }

    pub fn with_config(mut self, config: BackoffConfig) -> Result<Self, LockError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn lock(&self) -> &KeyLock<K, S> {
        &self.lock
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Block until `key` is acquired and return a guard releasing it on drop.
    ///
    /// Retries forever; a caller that needs a deadline has to enforce it from
    /// outside.
    pub fn guard(&self, key: K) -> Result<LockGuard<'_, K, S>, LockError> {
        let mut backoff = Backoff::new(self.config)?;
        loop {
            if self.lock.acquire(&key)? {
                if backoff.attempts() > 0 {
                    tracing::debug!(
                        key = ?key,
                        retries = backoff.attempts(),
                        "acquired after contention"
                    );
                }
                return Ok(LockGuard::new(&self.lock, key));
            }
            backoff.wait();
        }
    }

    /// Run `f` while holding `key` and return its result.
    ///
    /// The key is released on every exit path. If `f` panics, the panic
    /// continues to unwind after the release.
    pub fn transaction<F, T>(&self, key: K, f: F) -> Result<T, LockError>
    where
        F: FnOnce() -> T,
    {
        self.transaction_with(key, f, ())
    }

    /// Run `f(args...)` while holding `key`. `args` is a tuple matching the
    /// parameters of `f`.
    pub fn transaction_with<F, Args>(
        &self,
        key: K,
        f: F,
        args: Args,
    ) -> Result<F::Output, LockError>
    where
        F: Invoke<Args>,
    {
        let guard = self.guard(key)?;
        let output = f.invoke(args);
        guard.release()?;
        Ok(output)
    }

    /// Like [`transaction`](Self::transaction) for fallible work, keeping
    /// lock failures and work failures apart.
    pub fn try_transaction<F, T, E>(&self, key: K, f: F) -> Result<T, TransactionError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.transaction(key, f)?.map_err(TransactionError::Work)
    }

    /// Run dynamically-shaped work while holding `key`.
    ///
    /// The shape of `target` and `args` is validated before the lock is
    /// touched; an invalid shape never acquires anything.
    pub fn call(
        &self,
        key: K,
        target: impl Into<Target>,
        args: Option<Value>,
    ) -> Result<Value, LockError> {
        let call = dynamic::normalize(target.into(), args, &self.registry)?;
        self.transaction(key, move || call.run())?
            .map_err(LockError::Work)
    }

    /// `key + callable`
    pub fn call_fn(&self, key: K, f: DynFn) -> Result<Value, LockError> {
        self.call(key, f, None)
    }

    /// `key + callable + argument list`
    pub fn call_fn_with(&self, key: K, f: DynFn, args: Value) -> Result<Value, LockError> {
        self.call(key, f, Some(args))
    }

    /// `key + module/function + argument list`
    pub fn call_named(
        &self,
        key: K,
        module: &str,
        function: &str,
        args: Value,
    ) -> Result<Value, LockError> {
        self.call(key, FunctionRef::new(module, function), Some(args))
    }
}
