use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

use keyed_lock::{CounterStore, Transactor, FREE};

use crate::{fast_transactor, init_tracing};

// =============================================================================
// At most one holder per key
// =============================================================================

#[test]
fn racing_callers_are_fully_serialized() {
    let t = fast_transactor();
    let total = Arc::new(AtomicU64::new(0));
    let callers = 128;
    let barrier = Arc::new(Barrier::new(callers));

    let handles: Vec<_> = (1..=callers as u64)
        .map(|contribution| {
            let t = t.clone();
            let total = Arc::clone(&total);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                t.transaction("shared".to_string(), || {
                    // read-modify-write split in two; only exclusion keeps it correct
                    let seen = total.load(Ordering::Relaxed);
                    thread::yield_now();
                    total.store(seen + contribution, Ordering::Relaxed);
                })
                .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let n = callers as u64;
    assert_eq!(total.load(Ordering::Relaxed), n * (n + 1) / 2);
    assert_eq!(t.lock().store().value(&"shared".to_string()).unwrap(), Some(FREE));
}

#[test]
fn default_backoff_also_serializes() {
    init_tracing();
    let t: Transactor<&'static str> = Transactor::new();
    let total = Arc::new(AtomicU64::new(0));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let t = t.clone();
            let total = Arc::clone(&total);
            thread::spawn(move || {
                for _ in 0..5 {
                    t.transaction("k", || {
                        let seen = total.load(Ordering::Relaxed);
                        thread::yield_now();
                        total.store(seen + 1, Ordering::Relaxed);
                    })
                    .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(total.load(Ordering::Relaxed), 80);
}

// =============================================================================
// Key independence and ordering
// =============================================================================

#[test]
fn different_keys_do_not_block_each_other() {
    let t = fast_transactor();
    let (started_tx, started_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel();

    let slow = {
        let t = t.clone();
        let done_tx = done_tx.clone();
        thread::spawn(move || {
            t.transaction("a".to_string(), || {
                started_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(300));
                done_tx.send("slow").unwrap();
            })
            .unwrap();
        })
    };

    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("slow transaction never started");

    t.transaction("b".to_string(), || done_tx.send("fast").unwrap())
        .unwrap();

    assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), "fast");
    assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), "slow");
    slow.join().unwrap();
}

#[test]
fn same_key_runs_one_after_another() {
    let t = fast_transactor();
    let (started_tx, started_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel();

    let slow = {
        let t = t.clone();
        let done_tx = done_tx.clone();
        thread::spawn(move || {
            t.transaction("k".to_string(), || {
                started_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(200));
                done_tx.send("slow").unwrap();
            })
            .unwrap();
        })
    };

    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("slow transaction never started");

    t.transaction("k".to_string(), || done_tx.send("fast").unwrap())
        .unwrap();

    assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), "slow");
    assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), "fast");
    slow.join().unwrap();
}

// =============================================================================
// Counter lifecycle
// =============================================================================

#[test]
fn repeated_cycles_leave_the_key_free() {
    let t = fast_transactor();
    let key = "cycled".to_string();
    for i in 0..50 {
        assert_eq!(t.transaction(key.clone(), || i * 2).unwrap(), i * 2);
        assert_eq!(t.lock().store().value(&key).unwrap(), Some(FREE));
    }
    assert_eq!(t.lock().store().len(), 1);
}

#[test]
fn store_grows_with_distinct_keys_only() {
    let t = fast_transactor();
    for i in 0..10 {
        t.transaction(format!("key-{}", i % 3), || ()).unwrap();
    }
    assert_eq!(t.lock().store().len(), 3);
}

#[test]
fn lock_is_not_reentrant() {
    let t = fast_transactor();
    let inner_got_it = t
        .transaction("k".to_string(), || {
            t.lock().try_guard("k".to_string()).unwrap().is_some()
        })
        .unwrap();
    assert!(!inner_got_it);
    assert_eq!(t.lock().store().value(&"k".to_string()).unwrap(), Some(FREE));
}
