//! Named functions callable through `Transactor::call_named`.
//!
//! Functions are registered under a `(module, function)` pair together with
//! their arity, and receive their arguments as a list of JSON values.
//!
//! ## Example
//!
//! ```ignore
//! use keyed_lock::{FunctionRegistry, Transactor};
//! use serde_json::json;
//!
//! let registry = FunctionRegistry::new()
//!     .function("accounts", "deposit", 2, |args| {
//!         // decode args, mutate the account, return the new balance
//!         Ok(json!(100))
//!     });
//!
//! let transactor = Transactor::new().with_registry(registry);
//! let balance = transactor.call_named("acct-1", "accounts", "deposit", json!(["acct-1", 50]))?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::WorkError;

pub(crate) type NamedFn = dyn Fn(Vec<Value>) -> Result<Value, WorkError> + Send + Sync;

#[derive(Clone)]
pub(crate) struct Registered {
    pub(crate) arity: usize,
    pub(crate) function: Arc<NamedFn>,
}

/// Maps `(module, function)` pairs to callables.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<(String, String), Registered>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module::function` taking `arity` arguments.
    ///
    /// Builder style, returns `self` for chaining.
    pub fn function<F>(mut self, module: &str, function: &str, arity: usize, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, WorkError> + Send + Sync + 'static,
    {
        self.register(module, function, arity, f);
        self
    }

    /// Register `module::function`, replacing any earlier registration.
    pub fn register<F>(&mut self, module: &str, function: &str, arity: usize, f: F)
    where
        F: Fn(Vec<Value>) -> Result<Value, WorkError> + Send + Sync + 'static,
    {
        self.functions.insert(
            (module.to_string(), function.to_string()),
            Registered {
                arity,
                function: Arc::new(f),
            },
        );
    }

    /// Registered `(module, function)` pairs.
    pub fn functions(&self) -> Vec<(&str, &str)> {
        self.functions
            .keys()
            .map(|(module, function)| (module.as_str(), function.as_str()))
            .collect()
    }

    pub fn contains(&self, module: &str, function: &str) -> bool {
        self.functions
            .contains_key(&(module.to_string(), function.to_string()))
    }

    pub(crate) fn resolve(&self, module: &str, function: &str) -> Option<Registered> {
        self.functions
            .get(&(module.to_string(), function.to_string()))
            .cloned()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions())
            .finish()
    }
}
