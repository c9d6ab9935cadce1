use std::error::Error;
use std::fmt;

use crate::store::StoreError;

/// Which half of a lock cycle touched the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Acquire,
    Release,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Acquire => f.write_str("acquire"),
            Phase::Release => f.write_str("release"),
        }
    }
}

/// The call shape a dynamic transaction was attempted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `key + callable`
    Bare,
    /// `key + callable + argument list`
    CallableWithArgs,
    /// `key + module/function + argument list`
    Named,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Bare => f.write_str("transaction(key, fun)"),
            Shape::CallableWithArgs => f.write_str("transaction(key, fun, args)"),
            Shape::Named => f.write_str("transaction(key, module, function, args)"),
        }
    }
}

/// Failure reported by a dynamic callable or named function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkError(pub String);

impl WorkError {
    pub fn new(message: impl Into<String>) -> Self {
        WorkError(message.into())
    }
}

impl fmt::Display for WorkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for WorkError {}

impl From<serde_json::Error> for WorkError {
    fn from(err: serde_json::Error) -> Self {
        WorkError(err.to_string())
    }
}

/// Error type for keyed lock operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The callable/arguments did not match any accepted call shape.
    /// Raised before any lock attempt.
    InvalidArgumentShape { shape: Shape, message: String },
    /// The counter store failed while acquiring or releasing `key`.
    StoreUnavailable {
        key: String,
        phase: Phase,
        source: StoreError,
    },
    /// No function registered under `module::function`.
    UnknownFunction { module: String, function: String },
    /// Backoff configuration rejected.
    InvalidConfig(String),
    /// A dynamic callable failed. The lock was released before this surfaced.
    Work(WorkError),
}

impl LockError {
    pub(crate) fn invalid_shape(shape: Shape, message: impl Into<String>) -> Self {
        LockError::InvalidArgumentShape {
            shape,
            message: message.into(),
        }
    }

    pub(crate) fn store<K: fmt::Debug>(key: &K, phase: Phase, source: StoreError) -> Self {
        LockError::StoreUnavailable {
            key: format!("{:?}", key),
            phase,
            source,
        }
    }
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::InvalidArgumentShape { shape, message } => {
                write!(f, "invalid arguments for {}: {}", shape, message)
            }
            LockError::StoreUnavailable { key, phase, source } => write!(
                f,
                "counter store failed during {} of key {} ({}); is the store still running?",
                phase, key, source
            ),
            LockError::UnknownFunction { module, function } => {
                write!(f, "unknown function: {}::{}", module, function)
            }
            LockError::InvalidConfig(msg) => write!(f, "invalid lock config: {}", msg),
            LockError::Work(e) => write!(f, "transaction failed: {}", e),
        }
    }
}

impl Error for LockError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LockError::StoreUnavailable { source, .. } => Some(source),
            LockError::Work(e) => Some(e),
            _ => None,
        }
    }
}

/// Error from `Transactor::try_transaction`: either the lock layer failed or
/// the protected work returned its own error.
#[derive(Debug)]
pub enum TransactionError<E> {
    Lock(LockError),
    Work(E),
}

impl<E: fmt::Display> fmt::Display for TransactionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::Lock(e) => write!(f, "{}", e),
            TransactionError::Work(e) => write!(f, "transaction failed: {}", e),
        }
    }
}

impl<E: Error + 'static> Error for TransactionError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransactionError::Lock(e) => Some(e),
            TransactionError::Work(e) => Some(e),
        }
    }
}

impl<E> From<LockError> for TransactionError<E> {
    fn from(err: LockError) -> Self {
        TransactionError::Lock(err)
    }
}
