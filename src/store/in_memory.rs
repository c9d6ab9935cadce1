use std::hash::Hash;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;

use super::{CounterStore, StoreError};

/// In-memory counter store backed by a `DashMap<K, AtomicI64>`.
///
/// Each key gets its own atomic counter, created lazily through the map's
/// entry API so exactly one slot ever exists per key. The bounded increment
/// itself is a compare-and-swap loop on that atomic; the map's shard locks
/// only guard slot lookup and creation.
pub struct InMemoryCounterStore<K> {
    counters: DashMap<K, AtomicI64>,
}

impl<K: Eq + Hash> InMemoryCounterStore<K> {
    pub fn new() -> Self {
        InMemoryCounterStore {
            counters: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash> Default for InMemoryCounterStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> CounterStore<K> for InMemoryCounterStore<K>
where
    K: Eq + Hash + Clone + Send + Sync,
{
    fn bounded_increment(
        &self,
        key: &K,
        increment: i64,
        ceiling: i64,
        default_if_absent: i64,
    ) -> Result<i64, StoreError> {
        if let Some(counter) = self.counters.get(key) {
            return Ok(clamped_add(&counter, increment, ceiling));
        }

        let counter = self
            .counters
            .entry(key.clone())
            .or_insert_with(|| AtomicI64::new(default_if_absent));
        Ok(clamped_add(&counter, increment, ceiling))
    }

    fn value(&self, key: &K) -> Result<Option<i64>, StoreError> {
        Ok(self
            .counters
            .get(key)
            .map(|counter| counter.load(Ordering::Acquire)))
    }

    fn len(&self) -> usize {
        self.counters.len()
    }
}

fn clamped_add(counter: &AtomicI64, increment: i64, ceiling: i64) -> i64 {
    let step = |current: i64| current.saturating_add(increment).min(ceiling);
    // The closure never declines, so both arms carry the previous value.
    let previous = match counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
        Some(step(current))
    }) {
        Ok(previous) | Err(previous) => previous,
    };
    step(previous)
}
