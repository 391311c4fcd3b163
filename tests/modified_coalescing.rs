//! Coalescing and reference-release behavior of the modified queue.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use offstage::{RequestUid, Scheduler, SchedulerBuilder};

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

#[test]
fn consecutive_duplicates_yield_one_bracketed_notification() {
    let (scheduler, _sink) = recording_scheduler();
    scheduler.start().unwrap();

    let object = CountingObject::new();
    let baseline = Arc::strong_count(&object);

    let mut last = RequestUid::NONE;
    for _ in 0..3 {
        let uid = scheduler.request_modified(object.clone());
        assert!(uid.is_valid());
        assert!(uid > last);
        last = uid;
    }
    assert_eq!(scheduler.pending_modified(), 3);

    assert!(scheduler.process_modified());
    assert_eq!(object.marks(), 1, "three enqueues coalesce into one");
    assert_eq!(object.begins.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(object.ends.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(scheduler.pending_modified(), 0);
    assert_eq!(
        Arc::strong_count(&object),
        baseline,
        "every queued reference is released"
    );

    scheduler.shutdown();
}

#[test]
fn non_consecutive_duplicates_are_notified_separately() {
    let (scheduler, sink) = recording_scheduler();
    scheduler.start().unwrap();

    let a = CountingObject::new();
    let b = CountingObject::new();

    scheduler.request_modified(a.clone());
    scheduler.request_modified(a.clone());
    scheduler.request_modified(b.clone());
    scheduler.request_modified(a.clone());

    // First pump: the leading run of `a` coalesces; `b` breaks the run.
    assert!(scheduler.process_modified());
    assert_eq!(a.marks(), 1);
    assert_eq!(b.marks(), 0);
    assert_eq!(sink.last_delay(modified_delay), Some(Duration::ZERO));

    assert!(scheduler.process_modified());
    assert_eq!(b.marks(), 1);

    assert!(scheduler.process_modified());
    assert_eq!(a.marks(), 2);
    assert_eq!(sink.last_delay(modified_delay), Some(IDLE));

    // Empty queue: no notification, idle reschedule keeps the loop alive.
    assert!(!scheduler.process_modified());
    assert_eq!(sink.last_delay(modified_delay), Some(IDLE));

    scheduler.shutdown();
}

#[test]
fn inactive_queue_rejects_and_pump_is_silent() {
    let (scheduler, sink) = recording_scheduler();

    let object = CountingObject::new();
    assert_eq!(scheduler.request_modified(object.clone()), RequestUid::NONE);
    assert_eq!(scheduler.pending_modified(), 0);
    assert_eq!(Arc::strong_count(&object), 1);

    assert!(!scheduler.process_modified());
    assert!(sink.events().is_empty());
    assert_eq!(object.marks(), 0);
}

#[test]
fn shutdown_releases_undelivered_references_exactly_once() {
    let (scheduler, _sink) = recording_scheduler();
    scheduler.start().unwrap();

    let a = CountingObject::new();
    let b = CountingObject::new();
    scheduler.request_modified(a.clone());
    scheduler.request_modified(b.clone());
    scheduler.request_modified(b.clone());
    assert_eq!(scheduler.pending_modified(), 3);

    scheduler.shutdown();

    assert_eq!(scheduler.pending_modified(), 0);
    assert_eq!(Arc::strong_count(&a), 1);
    assert_eq!(Arc::strong_count(&b), 1);
    assert_eq!(a.marks(), 0, "shutdown never notifies");
    assert_eq!(b.marks(), 0);
}
