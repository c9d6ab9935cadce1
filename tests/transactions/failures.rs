use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use keyed_lock::{
    CounterStore, DynFn, InMemoryCounterStore, LockError, Phase, StoreError, TransactionError,
    Transactor, WorkError, FREE,
};

use crate::fast_transactor;

/// Run a transaction on another thread and fail the test instead of hanging
/// if it never acquires.
fn assert_acquires_promptly(t: &Transactor<String>, key: &str) {
    let (tx, rx) = mpsc::channel();
    let t = t.clone();
    let key = key.to_string();
    thread::spawn(move || {
        let result = t.transaction(key, || "acquired");
        let _ = tx.send(result);
    });
    let result = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("transaction blocked after a failed holder");
    assert_eq!(result.unwrap(), "acquired");
}

#[test]
fn panicking_work_still_releases() {
    let t = fast_transactor();

    let holder = {
        let t = t.clone();
        thread::spawn(move || {
            t.transaction("k".to_string(), || panic!("work blew up"))
                .unwrap();
        })
    };
    assert!(holder.join().is_err());

    assert_eq!(t.lock().store().value(&"k".to_string()).unwrap(), Some(FREE));
    assert_acquires_promptly(&t, "k");
}

#[test]
fn erroring_work_still_releases() {
    let t = fast_transactor();

    let result: Result<(), TransactionError<String>> =
        t.try_transaction("k".to_string(), || Err("insufficient funds".to_string()));
    match result {
        Err(TransactionError::Work(msg)) => assert_eq!(msg, "insufficient funds"),
        other => panic!("expected work error, got {:?}", other),
    }

    assert_acquires_promptly(&t, "k");
}

#[test]
fn failing_dynamic_work_surfaces_after_release() {
    let t = fast_transactor();
    let err = t
        .call_fn(
            "k".to_string(),
            DynFn::nullary(|| Err(WorkError::new("division by zero"))),
        )
        .unwrap_err();

    assert_eq!(err, LockError::Work(WorkError::new("division by zero")));
    assert_eq!(err.to_string(), "transaction failed: division by zero");
    assert_acquires_promptly(&t, "k");
}

/// Counts calls and refuses every one of them.
#[derive(Default)]
struct DownStore {
    calls: AtomicUsize,
}

impl CounterStore<String> for DownStore {
    fn bounded_increment(&self, _: &String, _: i64, _: i64, _: i64) -> Result<i64, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn value(&self, _: &String) -> Result<Option<i64>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn len(&self) -> usize {
        0
    }
}

#[test]
fn unreachable_store_is_fatal_and_not_retried() {
    let store = Arc::new(DownStore::default());
    let t = Transactor::with_store(Arc::clone(&store));

    let err = t.transaction("orders:7".to_string(), || ()).unwrap_err();
    match &err {
        LockError::StoreUnavailable { key, phase, source } => {
            assert_eq!(key, "\"orders:7\"");
            assert_eq!(*phase, Phase::Acquire);
            assert_eq!(*source, StoreError::Unavailable("connection refused".into()));
        }
        other => panic!("expected StoreUnavailable, got {:?}", other),
    }
    assert!(err.to_string().contains("acquire"));
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn guard_release_is_explicit_on_the_happy_path() {
    let t: Transactor<String> = Transactor::with_store(Arc::new(InMemoryCounterStore::new()));
    let guard = t.guard("k".to_string()).unwrap();
    assert_eq!(guard.key(), "k");
    assert!(t.lock().try_guard("k".to_string()).unwrap().is_none());
    guard.release().unwrap();
    assert_eq!(t.lock().store().value(&"k".to_string()).unwrap(), Some(FREE));
}
