use crate::EventSequencer;

use std::collections::HashSet;
use std::sync::Arc;

#[test]
fn given_new_tenant_when_next_then_starts_at_one() {
    let sequencer = EventSequencer::new();

    assert_eq!(sequencer.next("tenant-a"), 1);
    assert_eq!(sequencer.next("tenant-a"), 2);
    assert_eq!(sequencer.current("tenant-a"), 2);
}

#[test]
fn given_two_tenants_when_next_then_counters_independent() {
    let sequencer = EventSequencer::new();

    sequencer.next("tenant-a");
    sequencer.next("tenant-a");

    assert_eq!(sequencer.next("tenant-b"), 1);
    assert_eq!(sequencer.current("tenant-c"), 0);
}

#[test]
fn given_concurrent_callers_when_next_then_ids_unique_and_dense() {
    let sequencer = Arc::new(EventSequencer::new());

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let sequencer = Arc::clone(&sequencer);
            std::thread::spawn(move || {
                (0..250)
                    .map(|_| sequencer.next("tenant-a"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let ids: HashSet<u64> = threads
        .into_iter()
        .flat_map(|t| t.join().unwrap())
        .collect();

    assert_eq!(ids.len(), 2000);
    assert_eq!(ids.iter().min(), Some(&1));
    assert_eq!(ids.iter().max(), Some(&2000));
}
