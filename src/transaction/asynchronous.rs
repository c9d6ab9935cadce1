use std::fmt::Debug;
use std::future::Future;

use super::Transactor;
use crate::backoff::Backoff;
use crate::error::LockError;
use crate::lock::LockGuard;
use crate::store::CounterStore;

impl<K, S> Transactor<K, S>
where
    K: Debug,
    S: CounterStore<K>,
{
    /// Wait for `key` without blocking the executor thread.
    ///
    /// Only the calling task sleeps between attempts. Dropping the future
    /// while it waits leaves nothing behind, since the key is not held yet.
    pub async fn guard_async(&self, key: K) -> Result<LockGuard<'_, K, S>, LockError> {
        let mut backoff = Backoff::new(self.config)?;
        loop {
            if self.lock.acquire(&key)? {
                return Ok(LockGuard::new(&self.lock, key));
            }
            backoff.wait_async().await;
        }
    }

    /// Run the future produced by `f` while holding `key`.
    ///
    /// If the returned future is dropped after acquiring (for example by a
    /// `tokio::time::timeout`), the guard still releases the key.
    pub async fn transaction_async<F, Fut>(
        &self,
        key: K,
        f: F,
    ) -> Result<Fut::Output, LockError>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let guard = self.guard_async(key).await?;
        let output = f().await;
        guard.release()?;
        Ok(output)
    }
}
