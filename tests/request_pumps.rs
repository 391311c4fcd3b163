//! FIFO, UID, and event-order coverage for the read/write data queues.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use offstage::{NodeRef, RequestUid, Scheduler, SchedulerBuilder};
use proptest::prelude::*;

const IDLE: Duration = Duration::from_millis(250);

fn recording_scheduler() -> (Scheduler, Arc<RecordingSink>) {
    init_test_logging();
    let sink = RecordingSink::new();
    let scheduler = SchedulerBuilder::new()
        .idle_delay(IDLE)
        .event_fn({
            let sink = Arc::clone(&sink);
            move |event| sink.record(event)
        })
        .build();
    (scheduler, sink)
}

// ============================================================================
// UID allocation
// ============================================================================

#[test]
fn uids_are_strictly_increasing_and_nonzero() {
    let (scheduler, _sink) = recording_scheduler();
    scheduler.start().unwrap();

    let mut last = 0;
    for i in 0..10 {
        let uid = scheduler.request_read_file(
            NodeRef::new(format!("node-{i}")),
            format!("/tmp/in-{i}"),
            false,
            false,
        );
        assert!(uid.is_valid());
        assert!(uid.get() > last);
        last = uid.get();
    }

    // The write queue draws from the same counter.
    let uid = scheduler.request_write_data(NodeRef::new("node"), "/tmp/out");
    assert!(uid.get() > last);

    scheduler.shutdown();
}

#[test]
fn inactive_queues_reject_and_retain_nothing() {
    let (scheduler, sink) = recording_scheduler();

    // Built but never started: every producer rejects.
    assert_eq!(
        scheduler.request_read_file(NodeRef::new("n"), "/tmp/in", false, false),
        RequestUid::NONE
    );
    assert_eq!(
        scheduler.request_write_data(NodeRef::new("n"), "/tmp/out"),
        RequestUid::NONE
    );
    assert_eq!(
        scheduler.request_add_node_reference(NodeRef::new("a"), NodeRef::new("b"), "role"),
        RequestUid::NONE
    );
    assert_eq!(scheduler.pending_read_requests(), 0);
    assert_eq!(scheduler.pending_write_requests(), 0);

    // Inactive pumps are no-ops and emit nothing.
    let mut scene = TestScene::new();
    assert_eq!(scheduler.process_read_data(&mut scene), None);
    assert_eq!(scheduler.process_write_data(&mut scene), None);
    assert!(sink.events().is_empty());
    assert!(scene.ops.is_empty());
}

// ============================================================================
// FIFO execution and event order
// ============================================================================

#[test]
fn read_requests_execute_in_fifo_order_with_processed_events() {
    let (scheduler, sink) = recording_scheduler();
    scheduler.start().unwrap();
    sink.clear();

    let first = scheduler.request_read_file(NodeRef::new("a"), "/tmp/a", false, false);
    let second = scheduler.request_update_parent_transform(NodeRef::new("b"), NodeRef::new("t"));
    let third = scheduler.request_add_node_reference(NodeRef::new("c"), NodeRef::new("d"), "ref");
    assert_eq!(
        (first.get(), second.get(), third.get()),
        (1, 2, 3),
        "fresh scheduler allocates 1,2,3"
    );

    let mut scene = TestScene::new();
    assert_eq!(scheduler.process_read_data(&mut scene), Some(first));
    assert_eq!(scheduler.process_read_data(&mut scene), Some(second));
    assert_eq!(scheduler.process_read_data(&mut scene), Some(third));
    assert_eq!(scheduler.process_read_data(&mut scene), None);

    assert_eq!(sink.processed_uids(), vec![first, second, third]);
    assert_eq!(
        scene.ops,
        vec![
            "read-file a /tmp/a false",
            "reparent b t",
            "reference c->d as ref",
        ]
    );

    scheduler.shutdown();
}

#[test]
fn read_and_write_queues_are_isolated() {
    let (scheduler, _sink) = recording_scheduler();
    scheduler.start().unwrap();

    let read = scheduler.request_read_file(NodeRef::new("r"), "/tmp/in", false, false);
    let write = scheduler.request_write_data(NodeRef::new("w"), "/tmp/out");
    assert_eq!(scheduler.pending_read_requests(), 1);
    assert_eq!(scheduler.pending_write_requests(), 1);

    let mut scene = TestScene::new();
    assert_eq!(scheduler.process_write_data(&mut scene), Some(write));
    assert_eq!(scene.ops, vec!["write-file w /tmp/out"]);
    assert_eq!(scheduler.pending_read_requests(), 1);

    assert_eq!(scheduler.process_read_data(&mut scene), Some(read));
    assert_eq!(scheduler.pending_read_requests(), 0);

    scheduler.shutdown();
}

#[test]
fn pump_reschedules_immediately_while_backlogged() {
    let (scheduler, sink) = recording_scheduler();
    scheduler.start().unwrap();

    scheduler.request_read_file(NodeRef::new("a"), "/tmp/a", false, false);
    scheduler.request_read_file(NodeRef::new("b"), "/tmp/b", false, false);

    let mut scene = TestScene::new();
    scheduler.process_read_data(&mut scene);
    assert_eq!(sink.last_delay(read_data_delay), Some(Duration::ZERO));

    scheduler.process_read_data(&mut scene);
    assert_eq!(sink.last_delay(read_data_delay), Some(IDLE));

    // Empty pump still keeps the timer loop alive at the idle cadence.
    assert_eq!(scheduler.process_read_data(&mut scene), None);
    assert_eq!(sink.last_delay(read_data_delay), Some(IDLE));

    scheduler.shutdown();
}

#[test]
fn failed_execution_still_signals_completion() {
    let (scheduler, sink) = recording_scheduler();
    scheduler.start().unwrap();
    sink.clear();

    let uid = scheduler.request_write_data(NodeRef::new("n"), "/tmp/out");
    let mut scene = TestScene {
        fail_next: true,
        ..TestScene::new()
    };
    assert_eq!(scheduler.process_write_data(&mut scene), Some(uid));
    assert!(scene.ops.is_empty(), "operation failed before recording");
    assert_eq!(sink.processed_uids(), vec![uid]);

    scheduler.shutdown();
}

#[test]
fn producers_reject_after_shutdown_and_pending_work_is_dropped() {
    let (scheduler, _sink) = recording_scheduler();
    scheduler.start().unwrap();

    scheduler.request_read_file(NodeRef::new("n"), "/tmp/in", false, false);
    scheduler.shutdown();

    assert_eq!(
        scheduler.request_read_file(NodeRef::new("n"), "/tmp/in", false, false),
        RequestUid::NONE
    );

    // The pump refuses to execute the stranded entry.
    let mut scene = TestScene::new();
    assert_eq!(scheduler.process_read_data(&mut scene), None);
    assert!(scene.ops.is_empty());
}

#[test]
fn uids_survive_restart_without_reuse() {
    let (scheduler, _sink) = recording_scheduler();
    scheduler.start().unwrap();
    let before = scheduler.request_write_data(NodeRef::new("n"), "/tmp/a");
    scheduler.shutdown();

    scheduler.start().unwrap();
    let after = scheduler.request_write_data(NodeRef::new("n"), "/tmp/b");
    assert!(after > before, "restart must not reuse UIDs");
    scheduler.shutdown();
}

// ============================================================================
// Property coverage
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any interleaving of producers yields strictly increasing UIDs.
    #[test]
    fn uid_monotonic_over_arbitrary_producer_sequences(ops in prop::collection::vec(0..3u8, 1..32)) {
        let (scheduler, _sink) = recording_scheduler();
        scheduler.start().unwrap();

        let mut last = 0;
        for (i, op) in ops.into_iter().enumerate() {
            let node = NodeRef::new(format!("node-{i}"));
            let uid = match op {
                0 => scheduler.request_read_file(node, "/tmp/in", false, false),
                1 => scheduler.request_write_data(node, "/tmp/out"),
                _ => scheduler.request_add_node_reference(node, NodeRef::new("other"), "role"),
            };
            prop_assert!(uid.is_valid());
            prop_assert!(uid.get() > last);
            last = uid.get();
        }

        scheduler.shutdown();
    }
}
