//! Integration tests for observable arrays.

use observable_array::{observable, ArrayConfig, DropReason, ObservableArray, SubscriptionConfig};
use std::thread;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_millis(100);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

// --- Walkthrough ---

#[test]
fn test_mutation_walkthrough() {
    init_tracing();

    let mut array = observable![1, 2, 3];
    let events = array.subscribe_to_events();
    let snapshots = array.subscribe_to_snapshots();

    // Replay of the initial contents
    assert_eq!(&*snapshots.recv_timeout(TIMEOUT).unwrap(), &[1, 2, 3]);

    array.append(4);
    let event = events.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(event.inserted_values(), &[4]);
    assert!(event.removed_values().is_empty());
    assert!(event.updated_values().is_empty());
    assert_eq!(&*snapshots.recv_timeout(TIMEOUT).unwrap(), &[1, 2, 3, 4]);

    array.remove_at(0).unwrap();
    let event = events.recv_timeout(TIMEOUT).unwrap();
    assert!(event.is_removal());
    assert_eq!(event.removed_values(), &[1]);
    assert_eq!(&*snapshots.recv_timeout(TIMEOUT).unwrap(), &[2, 3, 4]);

    array.set(1, 9).unwrap();
    let event = events.recv_timeout(TIMEOUT).unwrap();
    assert!(event.is_update());
    assert_eq!(event.updated_values(), &[9]);
    assert_eq!(&*snapshots.recv_timeout(TIMEOUT).unwrap(), &[2, 9, 4]);

    array.replace_range(0..2, vec![7, 8, 9]).unwrap();
    let event = events.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(event.removed_values(), &[2, 9]);
    assert_eq!(event.inserted_values(), &[7, 8, 9]);
    assert!(event.updated_values().is_empty());
    assert_eq!(&*snapshots.recv_timeout(TIMEOUT).unwrap(), &[7, 8, 9, 4]);

    // Nothing else queued
    assert!(events.try_recv().is_err());
    assert!(snapshots.try_recv().is_err());
}

#[test]
fn test_literal_roundtrip_through_snapshot() {
    let array = observable!["a", "b", "c"];
    let snapshots = array.subscribe_to_snapshots();
    assert_eq!(&*snapshots.recv_timeout(TIMEOUT).unwrap(), &["a", "b", "c"]);

    let array: ObservableArray<u8> = observable![0; 3];
    assert_eq!(array.as_slice(), &[0, 0, 0]);

    let array: ObservableArray<u8> = observable![];
    assert!(array.is_empty());
}

// --- Subscription Semantics ---

#[test]
fn test_events_have_no_replay() {
    let mut array = observable![1];
    array.append(2);

    // Channel did not exist yet, then exists without history
    let events = array.subscribe_to_events();
    assert!(events.try_recv().is_err());

    array.append(3);
    let late = array.subscribe_to_events();
    array.append(4);

    assert_eq!(events.try_iter().count(), 2);
    let late_events: Vec<_> = late.try_iter().collect();
    assert_eq!(late_events.len(), 1);
    assert_eq!(late_events[0].inserted_values(), &[4]);
}

#[test]
fn test_each_snapshot_subscriber_gets_replay() {
    let mut array = observable![1];
    let first = array.subscribe_to_snapshots();
    array.append(2);
    let second = array.subscribe_to_snapshots();

    let first_seen: Vec<Vec<i32>> = first.try_iter().map(|s| s.to_vec()).collect();
    let second_seen: Vec<Vec<i32>> = second.try_iter().map(|s| s.to_vec()).collect();
    assert_eq!(first_seen, vec![vec![1], vec![1, 2]]);
    assert_eq!(second_seen, vec![vec![1, 2]]);
}

#[test]
fn test_multiple_event_subscribers_same_order() {
    let mut array = ObservableArray::new();
    let a = array.subscribe_to_events();
    let b = array.subscribe_to_events();

    for i in 0..10 {
        array.append(i);
    }

    let from_a: Vec<i32> = a.try_iter().map(|e| e.inserted_values()[0]).collect();
    let from_b: Vec<i32> = b.try_iter().map(|e| e.inserted_values()[0]).collect();
    assert_eq!(from_a, (0..10).collect::<Vec<_>>());
    assert_eq!(from_a, from_b);
}

#[test]
fn test_unsubscribe_closes_handle() {
    let mut array = observable![1];
    let events = array.subscribe_to_events();
    let snapshots = array.subscribe_to_snapshots();

    assert!(array.unsubscribe_events(events.id));
    assert!(array.unsubscribe_snapshots(snapshots.id));
    assert_eq!(array.event_subscription_count(), 0);

    array.append(2);
    assert!(events.recv_timeout(TIMEOUT).is_err());

    // Only the replayed value was delivered
    assert_eq!(snapshots.try_iter().count(), 1);
}

#[test]
fn test_dropping_array_closes_handles() {
    let mut array = observable![1, 2];
    let events = array.subscribe_to_events();
    array.append(3);

    let contents = array.into_vec();
    assert_eq!(contents, vec![1, 2, 3]);

    assert!(events.recv().is_ok());
    assert!(events.recv().is_err());
}

#[test]
fn test_bounded_subscriber_dropped_on_overflow() {
    let config = ArrayConfig {
        events: SubscriptionConfig::with_buffer_size(4),
        ..Default::default()
    };
    let mut array = ObservableArray::with_config(config);
    let slow = array.subscribe_to_events();
    let unbounded = array.subscribe_to_events_with(SubscriptionConfig::default());

    for i in 0..20 {
        array.append(i);
    }

    assert_eq!(array.event_subscription_count(), 1);
    assert_eq!(slow.try_iter().count(), 4);
    assert_eq!(slow.drop_reason(), Some(DropReason::BufferOverflow));
    assert_eq!(unbounded.try_iter().count(), 20);
    assert_eq!(unbounded.drop_reason(), None);
}

#[test]
fn test_default_subscribers_receive_every_mutation() {
    let mut array = ObservableArray::new();
    let events = array.subscribe_to_events();
    let snapshots = array.subscribe_to_snapshots();

    // Nobody drains while the loop runs
    for i in 0..1500 {
        array.append(i);
    }

    assert_eq!(array.event_subscription_count(), 1);
    assert_eq!(array.snapshot_subscription_count(), 1);

    let received: Vec<i32> = events.try_iter().map(|e| e.inserted_values()[0]).collect();
    assert_eq!(received, (0..1500).collect::<Vec<_>>());

    let seen: Vec<_> = snapshots.try_iter().collect();
    assert_eq!(seen.len(), 1501);
    assert_eq!(seen.last().map(|s| s.len()), Some(1500));
    assert_eq!(&**seen.last().unwrap(), array.as_slice());
}

#[test]
fn test_closed_handle_reports_reason() {
    let mut array = observable![1];
    let unsubscribed = array.subscribe_to_events();
    let orphaned = array.subscribe_to_snapshots();

    array.unsubscribe_events(unsubscribed.id);
    assert_eq!(unsubscribed.drop_reason(), Some(DropReason::Unsubscribed));

    array.append(2);
    assert_eq!(orphaned.drop_reason(), None);

    drop(array);
    assert_eq!(orphaned.drop_reason(), Some(DropReason::ChannelClosed));
    assert_eq!(orphaned.try_iter().count(), 2);
}

// --- Threads ---

#[test]
fn test_consumer_on_other_thread() {
    let mut array = ObservableArray::new();
    let snapshots = array.subscribe_to_snapshots();

    let consumer = thread::spawn(move || {
        let mut last = Vec::new();
        for snapshot in snapshots.iter() {
            last = snapshot.to_vec();
        }
        last
    });

    for i in 0..50 {
        array.append(i);
    }
    array.remove_range(10..).unwrap();
    drop(array);

    let last = consumer.join().unwrap();
    assert_eq!(last, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_shared_array_across_threads() {
    let shared = ObservableArray::<u32>::new().into_shared();
    let events = shared.read().subscribe_to_events();

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    shared.write().append(t * 100 + i);
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(shared.read().len(), 100);
    assert_eq!(events.try_iter().count(), 100);
}

// --- Realistic Workflow ---

#[test]
fn test_mirror_follows_events() {
    // A consumer rebuilding the list from events alone
    let mut array = observable!["todo: write", "todo: test"];
    let events = array.subscribe_to_events();
    let mut mirror: Vec<&str> = array.as_slice().to_vec();

    array.append("todo: ship");
    array.set(0, "done: write").unwrap();
    array.remove_at(1).unwrap();
    array.insert("todo: review", 1).unwrap();

    // Positions follow the known sequence of operations
    let received: Vec<_> = events.try_iter().collect();
    mirror.extend_from_slice(received[0].inserted_values());
    mirror[0] = received[1].updated_values()[0];
    mirror.remove(1);
    mirror.insert(1, received[3].inserted_values()[0]);

    assert_eq!(mirror, array.as_slice());
}
