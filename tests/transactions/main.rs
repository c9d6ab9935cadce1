mod exclusion;
mod failures;

use keyed_lock::{BackoffConfig, Transactor};

/// Route `tracing` output through the test harness. Set `RUST_LOG=keyed_lock=debug`
/// to see contention and backoff decisions.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A transactor with a short retry range so contended tests finish quickly.
pub fn fast_transactor() -> Transactor<String> {
    init_tracing();
    Transactor::new()
        .with_config(BackoffConfig::new().with_min_delay_ms(1).with_max_delay_ms(5))
        .unwrap()
}
