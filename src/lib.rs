//! Keyed mutual exclusion without a coordinator.
//!
//! Every key maps to a small saturating counter in a shared
//! [`CounterStore`]. Acquiring and releasing are single atomic
//! bounded increments on that counter, so callers synchronize with each
//! other directly instead of queueing behind a lock-manager thread.
//! [`Transactor`] wraps the primitive into acquire, run, release, with
//! jittered retries while a key is contended.
//!
//! The lock is not reentrant: running a transaction on a key from inside a
//! transaction on the same key never returns.

mod backoff;
mod error;
mod lock;
mod store;
mod transaction;

pub use backoff::{Backoff, BackoffConfig};
pub use error::{LockError, Phase, Shape, TransactionError, WorkError};
pub use lock::{KeyLock, LockGuard, CONTENDED, FREE, HELD};
pub use store::{CounterStore, InMemoryCounterStore, StoreError};
pub use transaction::{DynFn, FunctionRef, FunctionRegistry, Invoke, Target, Transactor};
