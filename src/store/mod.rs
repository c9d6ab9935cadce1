mod error;
mod in_memory;

pub use error::StoreError;
pub use in_memory::InMemoryCounterStore;

/// A shared key → counter map with one atomic primitive.
///
/// `KeyLock` performs all of its synchronization through
/// [`bounded_increment`](CounterStore::bounded_increment); nothing else in the
/// crate mutates lock state. The default `InMemoryCounterStore` keeps counters
/// in a striped concurrent map; other implementations might front a
/// shared-memory segment or a store owned by another component, as long as the
/// primitive stays linearizable per key.
///
/// A store outlives every caller that uses it and never forgets a key: entries
/// are created on first use and afterwards only ever reset.
pub trait CounterStore<K>: Send + Sync {
    /// Atomically increment the counter for `key` and clamp it to `ceiling`.
    ///
    /// A missing entry is created at `default_if_absent` before the increment
    /// is applied. Returns the value stored after clamping. Concurrent calls on
    /// the same key must behave as if they ran one after another.
    fn bounded_increment(
        &self,
        key: &K,
        increment: i64,
        ceiling: i64,
        default_if_absent: i64,
    ) -> Result<i64, StoreError>;

    /// Current counter for `key`, or `None` if the key was never touched.
    fn value(&self, key: &K) -> Result<Option<i64>, StoreError>;

    /// Number of distinct keys the store holds a counter for.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
