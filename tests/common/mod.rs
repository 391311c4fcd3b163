#![allow(dead_code)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```ignore
//! mod common;
//! use common::*;
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};

use offstage::{NodeRef, RequestUid, SceneError, SceneObject, SceneOps, SchedulerEvent};

static INIT_LOGGING: Once = Once::new();

/// Initializes tracing output for tests (once per process).
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Event sink target that records every posted event.
///
/// Wire it into a builder with:
/// ```ignore
/// let sink = RecordingSink::new();
/// let scheduler = SchedulerBuilder::new()
///     .event_fn({
///         let sink = Arc::clone(&sink);
///         move |event| sink.record(event)
///     })
///     .build();
/// ```
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SchedulerEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, event: SchedulerEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<SchedulerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Processed UIDs in emission order.
    pub fn processed_uids(&self) -> Vec<RequestUid> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                SchedulerEvent::RequestProcessed { uid } => Some(*uid),
                _ => None,
            })
            .collect()
    }

    /// The delay carried by the most recent reschedule event matching
    /// `matcher`, if any was emitted.
    pub fn last_delay(
        &self,
        matcher: impl Fn(&SchedulerEvent) -> Option<Duration>,
    ) -> Option<Duration> {
        self.events().iter().rev().find_map(|event| matcher(event))
    }
}

/// Extracts the delay from a read-data reschedule event.
pub fn read_data_delay(event: &SchedulerEvent) -> Option<Duration> {
    match event {
        SchedulerEvent::RequestReadData { delay } => Some(*delay),
        _ => None,
    }
}

/// Extracts the delay from a write-data reschedule event.
pub fn write_data_delay(event: &SchedulerEvent) -> Option<Duration> {
    match event {
        SchedulerEvent::RequestWriteData { delay } => Some(*delay),
        _ => None,
    }
}

/// Extracts the delay from a modified reschedule event.
pub fn modified_delay(event: &SchedulerEvent) -> Option<Duration> {
    match event {
        SchedulerEvent::RequestModified { delay } => Some(*delay),
        _ => None,
    }
}

/// `SceneOps` implementation that records each operation as one line.
#[derive(Default)]
pub struct TestScene {
    pub ops: Vec<String>,
    /// When `true`, the next operation fails once with a collaborator
    /// error.
    pub fail_next: bool,
}

impl TestScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_failure(&mut self) -> Result<(), SceneError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(SceneError::Operation("injected failure".into()));
        }
        Ok(())
    }
}

impl SceneOps for TestScene {
    fn read_file_into_node(
        &mut self,
        node: &NodeRef,
        path: &Path,
        display: bool,
    ) -> Result<(), SceneError> {
        self.check_failure()?;
        self.ops
            .push(format!("read-file {node} {} {display}", path.display()));
        Ok(())
    }

    fn read_scene(
        &mut self,
        path: &Path,
        target_ids: &[String],
        source_ids: &[String],
        _display: bool,
    ) -> Result<(), SceneError> {
        self.check_failure()?;
        self.ops.push(format!(
            "read-scene {} {}<-{}",
            path.display(),
            target_ids.join(","),
            source_ids.join(",")
        ));
        Ok(())
    }

    fn write_node_to_file(&mut self, node: &NodeRef, path: &Path) -> Result<(), SceneError> {
        self.check_failure()?;
        self.ops.push(format!("write-file {node} {}", path.display()));
        Ok(())
    }

    fn update_parent_transform(
        &mut self,
        node: &NodeRef,
        transform_node: &NodeRef,
    ) -> Result<(), SceneError> {
        self.check_failure()?;
        self.ops.push(format!("reparent {node} {transform_node}"));
        Ok(())
    }

    fn update_subject_hierarchy_location(
        &mut self,
        node: &NodeRef,
        sibling: &NodeRef,
    ) -> Result<(), SceneError> {
        self.check_failure()?;
        self.ops.push(format!("move {node} {sibling}"));
        Ok(())
    }

    fn add_node_reference(
        &mut self,
        referencing: &NodeRef,
        referenced: &NodeRef,
        role: &str,
    ) -> Result<(), SceneError> {
        self.check_failure()?;
        self.ops
            .push(format!("reference {referencing}->{referenced} as {role}"));
        Ok(())
    }
}

/// `SceneObject` implementation counting notification calls.
#[derive(Default)]
pub struct CountingObject {
    pub begins: AtomicUsize,
    pub marks: AtomicUsize,
    pub ends: AtomicUsize,
}

impl CountingObject {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn marks(&self) -> usize {
        self.marks.load(Ordering::SeqCst)
    }
}

impl SceneObject for CountingObject {
    fn begin_modify(&self) {
        self.begins.fetch_add(1, Ordering::SeqCst);
    }

    fn mark_modified(&self) {
        self.marks.fetch_add(1, Ordering::SeqCst);
    }

    fn end_modify(&self) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }
}

/// Polls `predicate` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, predicate: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    predicate()
}
