use caselog_core::{Crime, CrimeStore};
use std::time::Duration;
use uuid::Uuid;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn titled(title: &str) -> Crime {
    let mut crime = Crime::new();
    crime.title = title.to_string();
    crime
}

#[test]
fn add_then_get_roundtrip() {
    let store = CrimeStore::open_in_memory().unwrap();

    let crime = titled("Burglary");
    store.add_crime(crime.clone()).unwrap();

    // The read queues behind the fire-and-forget write, so it observes it.
    let loaded = store.get_crime(crime.id).unwrap().unwrap();
    assert_eq!(loaded, crime);
}

#[test]
fn writes_apply_in_submission_order() {
    let store = CrimeStore::open_in_memory().unwrap();

    let mut crime = titled("v0");
    store.add_crime(crime.clone()).unwrap();
    for revision in 1..=5 {
        crime.title = format!("v{revision}");
        store.update_crime(crime.clone()).unwrap();
    }

    let loaded = store.get_crime(crime.id).unwrap().unwrap();
    assert_eq!(loaded.title, "v5");
}

#[test]
fn interleaved_insert_and_delete_respect_submission_order() {
    let store = CrimeStore::open_in_memory().unwrap();

    let first = titled("kept? no");
    let second = titled("kept");
    store.add_crime(first.clone()).unwrap();
    store.add_crime(second.clone()).unwrap();
    store.delete_crime(first.id).unwrap();

    let listed = store.list_crimes().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, second.id);
}

#[test]
fn all_crimes_stream_delivers_fresh_snapshot_after_each_write() {
    let store = CrimeStore::open_in_memory().unwrap();

    let subscription = store.crimes().unwrap();
    let initial = subscription.recv_timeout(RECV_TIMEOUT).unwrap();
    assert!(initial.is_empty());

    let mut crime = titled("Arson");
    store.add_crime(crime.clone()).unwrap();
    let after_insert = subscription.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(after_insert.len(), 1);
    assert_eq!(after_insert[0].title, "Arson");

    crime.title = "Arson (case closed)".to_string();
    crime.resolve();
    store.update_crime(crime.clone()).unwrap();
    let after_update = subscription.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(after_update[0].title, "Arson (case closed)");
    assert!(after_update[0].solved);
}

#[test]
fn delete_removes_record_from_snapshots_and_by_id_stream() {
    let store = CrimeStore::open_in_memory().unwrap();

    let crime = titled("Pickpocketing");
    store.add_crime(crime.clone()).unwrap();

    let watch = store.crime(crime.id).unwrap();
    let initial = watch.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(initial.map(|snapshot| snapshot.id), Some(crime.id));

    store.delete_crime(crime.id).unwrap();
    let after_delete = watch.recv_timeout(RECV_TIMEOUT).unwrap();
    assert!(after_delete.is_none());

    assert!(store.list_crimes().unwrap().is_empty());
}

#[test]
fn missing_record_reads_as_absent() {
    let store = CrimeStore::open_in_memory().unwrap();
    let unknown = Uuid::new_v4();

    assert!(store.get_crime(unknown).unwrap().is_none());

    let watch = store.crime(unknown).unwrap();
    let initial = watch.recv_timeout(RECV_TIMEOUT).unwrap();
    assert!(initial.is_none());
}

#[test]
fn solved_update_preserves_identity_and_timestamp() {
    let store = CrimeStore::open_in_memory().unwrap();

    let crime = titled("Theft");
    store.add_crime(crime.clone()).unwrap();

    let mut edited = store.get_crime(crime.id).unwrap().unwrap();
    edited.resolve();
    store.update_crime(edited).unwrap();

    let loaded = store.get_crime(crime.id).unwrap().unwrap();
    assert_eq!(loaded.id, crime.id);
    assert_eq!(loaded.title, "Theft");
    assert_eq!(loaded.timestamp_ms, crime.timestamp_ms);
    assert!(loaded.solved);
}

#[test]
fn dropping_a_subscription_detaches_the_observer() {
    let store = CrimeStore::open_in_memory().unwrap();

    let subscription = store.crimes().unwrap();
    let _ = subscription.recv_timeout(RECV_TIMEOUT);
    drop(subscription);

    // Writes after the drop still apply; nothing is left to notify.
    store.add_crime(titled("Loitering")).unwrap();
    assert_eq!(store.list_crimes().unwrap().len(), 1);
}

#[test]
fn dropping_the_store_finishes_pending_writes_then_ends_streams() {
    let store = CrimeStore::open_in_memory().unwrap();

    let subscription = store.crimes().unwrap();
    let initial = subscription.recv_timeout(RECV_TIMEOUT).unwrap();
    assert!(initial.is_empty());

    store.add_crime(titled("Last entry")).unwrap();
    drop(store);

    // The pending insert committed before shutdown, then the stream ended.
    let final_snapshot = subscription.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(final_snapshot.len(), 1);
    assert!(subscription.recv_timeout(RECV_TIMEOUT).is_none());
}

#[test]
fn streams_end_after_store_shutdown() {
    let store = CrimeStore::open_in_memory().unwrap();
    let subscription = store.crimes().unwrap();
    drop(store);

    // Only the initial snapshot was queued; the stream then ends.
    assert_eq!(subscription.recv_timeout(RECV_TIMEOUT), Some(Vec::new()));
    assert!(subscription.recv_timeout(RECV_TIMEOUT).is_none());
}
