// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use tempo_storage::MemoryStore;

fn write(job: &str, value: Value) -> PersistRequest {
    (StateKey::job_state(job), Some(value))
}

#[test]
fn save_retries_until_success() {
    let store = MemoryStore::new();
    store.fail_next(2);
    let persister = StatePersister::new(store.clone());

    persister.save(&[write("nightly", json!({"enabled": true}))]).unwrap();

    assert_eq!(store.save_calls(), 3);
    assert_eq!(store.get(&StateKey::job_state("nightly")), Some(json!({"enabled": true})));
}

#[test]
fn save_gives_up_after_three_attempts() {
    let store = MemoryStore::new();
    store.fail_next(3);
    let persister = StatePersister::new(store.clone());

    let err = persister.save(&[write("nightly", json!(1))]).unwrap_err();

    assert!(matches!(err, StoreError::Unavailable(_)));
    assert_eq!(store.save_calls(), 3);
    assert!(store.is_empty());
}

#[test]
fn restore_jobs_skips_unreadable_records() {
    let store = MemoryStore::new();
    let good = JobState { enabled: false, runs: Vec::new(), next_run_num: 4 };
    store
        .save(&[
            write("good", serde_json::to_value(&good).unwrap()),
            write("bad", json!("not a job state")),
        ])
        .unwrap();
    let persister = StatePersister::new(store);

    let names = [JobName::new("good"), JobName::new("bad"), JobName::new("missing")];
    let states = persister.restore_jobs(&names).unwrap();

    assert_eq!(states.len(), 1);
    assert_eq!(states.get("good"), Some(&good));
}

#[tokio::test]
async fn persist_task_applies_writes_and_deletes() {
    let store = MemoryStore::new();
    store.save(&[write("old", json!(0))]).unwrap();
    let persister = Arc::new(StatePersister::new(store.clone()));
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = spawn_persist_task(persister, rx);

    tx.send(write("nightly", json!(1))).unwrap();
    tx.send(write("nightly", json!(2))).unwrap();
    tx.send((StateKey::job_state("old"), None)).unwrap();
    drop(tx);
    handle.await.unwrap();

    assert_eq!(store.get(&StateKey::job_state("nightly")), Some(json!(2)));
    assert_eq!(store.get(&StateKey::job_state("old")), None);
}

#[tokio::test]
async fn persist_task_survives_failed_batch() {
    let store = MemoryStore::new();
    store.fail_next(3);
    let persister = Arc::new(StatePersister::new(store.clone()));
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = spawn_persist_task(persister, rx);

    tx.send(write("first", json!(1))).unwrap();
    // Give the first batch time to fail on its own
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    tx.send(write("second", json!(2))).unwrap();
    drop(tx);
    handle.await.unwrap();

    assert_eq!(store.get(&StateKey::job_state("second")), Some(json!(2)));
}

#[tokio::test]
async fn failed_delete_is_carried_into_next_batch() {
    let store = MemoryStore::new();
    store.save(&[write("retired", json!(0))]).unwrap();
    store.fail_next(3);
    let persister = Arc::new(StatePersister::new(store.clone()));
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = spawn_persist_task(persister, rx);

    tx.send((StateKey::job_state("retired"), None)).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(store.get(&StateKey::job_state("retired")), Some(json!(0)));

    tx.send(write("nightly", json!(1))).unwrap();
    drop(tx);
    handle.await.unwrap();

    assert_eq!(store.get(&StateKey::job_state("retired")), None);
    assert_eq!(store.get(&StateKey::job_state("nightly")), Some(json!(1)));
}

#[tokio::test]
async fn carried_delete_yields_to_newer_write() {
    let store = MemoryStore::new();
    store.save(&[write("nightly", json!(0))]).unwrap();
    store.fail_next(3);
    let persister = Arc::new(StatePersister::new(store.clone()));
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = spawn_persist_task(persister, rx);

    tx.send((StateKey::job_state("nightly"), None)).unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    tx.send(write("nightly", json!(2))).unwrap();
    drop(tx);
    handle.await.unwrap();

    assert_eq!(store.get(&StateKey::job_state("nightly")), Some(json!(2)));
}

#[test]
fn restore_triggers_reads_saved_registry() {
    let store = MemoryStore::new();
    let persister = StatePersister::new(store.clone());
    assert_eq!(persister.restore_triggers().unwrap(), TriggerState::default());

    store
        .save(&[(
            StateKey::trigger_state(),
            Some(json!({"published": {"etl.load.shortdate.2024-03-01": "2024-03-01T04:05:00Z"}})),
        )])
        .unwrap();

    let state = persister.restore_triggers().unwrap();
    assert_eq!(state.published.len(), 1);
    assert!(state.published.contains_key("etl.load.shortdate.2024-03-01"));
}

#[test]
fn unreadable_trigger_state_starts_empty() {
    let store = MemoryStore::new();
    store.save(&[(StateKey::trigger_state(), Some(json!("not a registry")))]).unwrap();
    let persister = StatePersister::new(store);

    assert_eq!(persister.restore_triggers().unwrap(), TriggerState::default());
}
