use chrono::{Duration, FixedOffset, NaiveDate};
use std::sync::Arc;
use tempfile::TempDir;
use weartime_core::{
    Clock, ManualClock, StorePolicy, TimerStateStore,
    models::{Reconciliation, Status},
    storage::{FileStore, KeyValueStore, keys},
};

type Store = TimerStateStore<FileStore, Arc<ManualClock>>;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at_local(
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
        8,
        0,
        FixedOffset::east_opt(3600).unwrap(),
    ))
}

fn open(dir: &TempDir, clock: &Arc<ManualClock>) -> Store {
    let storage = FileStore::open(dir.path()).unwrap();
    TimerStateStore::with_clock(storage, clock.clone(), StorePolicy::default())
}

#[test]
fn test_day_of_use_across_restarts() {
    let dir = TempDir::new().unwrap();
    let clock = clock();

    let mut store = open(&dir, &clock);
    store.load_and_reconcile();
    store.start().unwrap();
    clock.advance(Duration::hours(2));
    store.stop().unwrap();
    store.start().unwrap();
    clock.advance(Duration::minutes(30));
    drop(store);

    // Killed while running; relaunched ten minutes later
    clock.advance(Duration::minutes(10));
    let mut store = open(&dir, &clock);
    assert_eq!(
        store.load_and_reconcile(),
        Reconciliation::Resumed {
            elapsed_ms: 40 * 60 * 1000
        }
    );
    assert_eq!(store.status(), Status::Recovered);
    assert_eq!(store.current_total(), (2 * 60 + 40) * 60 * 1000);

    let record = store.stop().unwrap();
    assert_eq!(record.session_duration, 40 * 60 * 1000);
    assert_eq!(store.records().len(), 2);
    drop(store);

    let mut store = open(&dir, &clock);
    assert_eq!(
        store.load_and_reconcile(),
        Reconciliation::Stopped {
            accumulated_ms: (2 * 60 + 40) * 60 * 1000
        }
    );
    assert_eq!(store.records().len(), 2);
}

#[test]
fn test_next_morning_starts_fresh_and_keeps_history() {
    let dir = TempDir::new().unwrap();
    let clock = clock();

    let mut store = open(&dir, &clock);
    store.load_and_reconcile();
    store.start().unwrap();
    clock.advance(Duration::hours(1));
    store.stop().unwrap();
    drop(store);

    clock.advance(Duration::days(1));
    let mut store = open(&dir, &clock);
    let outcome = store.load_and_reconcile();
    assert_eq!(
        outcome,
        Reconciliation::NewDay {
            previous_date: NaiveDate::from_ymd_opt(2024, 6, 3),
            discarded: None,
        }
    );
    assert_eq!(store.current_total(), 0);
    assert_eq!(store.records().len(), 1);
    assert_eq!(
        store.storage().get(keys::LAST_SAVED_DATE).as_deref(),
        Some("2024-06-04")
    );
    assert_eq!(store.clock().today(), NaiveDate::from_ymd_opt(2024, 6, 4).unwrap());
}

#[test]
fn test_forgotten_timer_is_abandoned() {
    let dir = TempDir::new().unwrap();
    let clock = clock();

    let mut store = open(&dir, &clock);
    store.load_and_reconcile();
    store.start().unwrap();
    clock.advance(Duration::hours(1));
    store.stop().unwrap();
    // Left running at 09:00 and the app closed
    store.start().unwrap();
    drop(store);

    // Same local day, but the threshold is shorter than the gap
    clock.advance(Duration::hours(3));
    let storage = FileStore::open(dir.path()).unwrap();
    let policy = StorePolicy {
        stale_after: Duration::hours(2),
        ..StorePolicy::default()
    };
    let mut store = TimerStateStore::with_clock(storage, clock.clone(), policy);

    let Reconciliation::Abandoned { discarded } = store.load_and_reconcile() else {
        panic!("expected the stale session to be abandoned");
    };
    assert!(discarded.interrupted);
    assert!(!discarded.is_complete);
    assert_eq!(store.status(), Status::ResetAfterCrash);
    assert!(!store.is_running());
    assert_eq!(store.current_total(), 60 * 60 * 1000);
    assert_eq!(store.records().len(), 2);
}

#[test]
fn test_corrupt_file_starts_clean() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("storage.json"), "{not json").unwrap();
    let clock = clock();

    let mut store = open(&dir, &clock);
    let outcome = store.load_and_reconcile();
    assert!(matches!(outcome, Reconciliation::NewDay { previous_date: None, discarded: None }));
    assert_eq!(store.status(), Status::Ready);

    store.start().unwrap();
    clock.advance(Duration::minutes(5));
    store.stop().unwrap();
    assert_eq!(store.current_total(), 5 * 60 * 1000);
}
