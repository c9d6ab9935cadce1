//! Jittered retry delays for contended keys.
//!
//! A caller that loses an acquire sleeps for a uniformly random delay in
//! `[min_delay_ms, max_delay_ms]` and tries again. The range never grows and
//! there is no retry limit: this is flat jittered polling. The randomness
//! only spreads waiters apart; exclusion never depends on it.

use std::thread;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::LockError;

/// Shortest delay between two acquire attempts on a contended key.
const DEFAULT_MIN_DELAY_MS: u64 = 2;

/// Longest delay between two acquire attempts on a contended key.
const DEFAULT_MAX_DELAY_MS: u64 = 51;

/// Retry timing for contended acquisitions.
///
/// Deserializes from partial input; missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Lower bound of the retry delay, in milliseconds (inclusive).
    pub min_delay_ms: u64,
    /// Upper bound of the retry delay, in milliseconds (inclusive).
    pub max_delay_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl BackoffConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_min_delay_ms(mut self, min_delay_ms: u64) -> Self {
        self.min_delay_ms = min_delay_ms;
        self
    }

    #[must_use]
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Parse a config from JSON, e.g. `{"min_delay_ms": 1, "max_delay_ms": 5}`.
    pub fn from_json(json: &str) -> Result<Self, LockError> {
        let config: BackoffConfig =
            serde_json::from_str(json).map_err(|e| LockError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LockError> {
        if self.min_delay_ms > self.max_delay_ms {
            return Err(LockError::InvalidConfig(format!(
                "min_delay_ms ({}) exceeds max_delay_ms ({})",
                self.min_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }
}

/// Retry state for one waiting caller.
///
/// Each transaction owns its own `Backoff`; waiting suspends only the caller
/// that owns it.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    attempts: u64,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Result<Self, LockError> {
        config.validate()?;
        Ok(Self {
            config,
            attempts: 0,
        })
    }

    /// How many delays this backoff has handed out so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Pick the next delay.
    pub fn next_delay(&mut self) -> Duration {
        self.attempts += 1;
        let ms = rand::thread_rng()
            .gen_range(self.config.min_delay_ms..=self.config.max_delay_ms);
        Duration::from_millis(ms)
    }

    /// Block the current thread for the next delay.
    pub fn wait(&mut self) {
        let delay = self.next_delay();
        tracing::debug!(
            attempt = self.attempts,
            delay_ms = delay.as_millis() as u64,
            "lock contended, backing off"
        );
        thread::sleep(delay);
    }

    /// Suspend the current task for the next delay.
    ///
    /// Dropping the returned future abandons the retry; nothing is held while
    /// waiting.
    #[cfg(feature = "tokio")]
    pub async fn wait_async(&mut self) {
        let delay = self.next_delay();
        tracing::debug!(
            attempt = self.attempts,
            delay_ms = delay.as_millis() as u64,
            "lock contended, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
