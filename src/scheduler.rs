//! The scheduler facade: producers, pumps, and lifecycle.
//!
//! # Threading contract
//!
//! Producers ([`Scheduler::schedule_task`], the `request_*` methods) are
//! callable from any thread. Background tasks execute on the dedicated
//! worker threads spawned by [`Scheduler::start`]. Everything that
//! mutates the scene (data request execution and modified notifications)
//! happens only inside the pump methods
//! ([`process_modified`], [`process_read_data`], [`process_write_data`]),
//! which the embedding application calls from the scene-owning thread in
//! response to the reschedule events it receives. That single-consumer
//! arrangement is the safety invariant of the whole engine: the queues
//! are produced from anywhere but drained only where the scene lives.
//!
//! [`process_modified`]: Scheduler::process_modified
//! [`process_read_data`]: Scheduler::process_read_data
//! [`process_write_data`]: Scheduler::process_write_data

use core::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::events::{EventSink, SchedulerEvent};
use crate::queue::{ModifiedQueue, RequestQueue, TaskQueue};
use crate::request::DataRequest;
use crate::scene::{NodeRef, SceneObject, SceneOps};
use crate::task::Task;
use crate::types::{RequestUid, TaskKind};
use crate::worker;

/// Shared state behind the facade and its handles.
struct SchedulerInner {
    config: SchedulerConfig,
    /// Next UID. Shared by the modified/read/write queues and never
    /// reset, so UIDs stay unique across `shutdown`/`start` cycles.
    uid_counter: AtomicU64,
    tasks: Arc<TaskQueue>,
    modified: ModifiedQueue,
    read_data: RequestQueue,
    write_data: RequestQueue,
    events: Arc<dyn EventSink>,
    running: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl SchedulerInner {
    fn schedule_task(&self, task: Task) -> bool {
        if task.kind() == TaskKind::Undefined {
            tracing::warn!("scheduling a task of undefined kind; no worker class consumes it");
        }
        self.tasks.push(task)
    }

    fn request_modified(&self, object: Arc<dyn SceneObject>) -> RequestUid {
        self.modified.push(object, &self.uid_counter)
    }

    fn request_read_file(
        &self,
        node: NodeRef,
        filename: PathBuf,
        display: bool,
        delete_file: bool,
    ) -> RequestUid {
        self.read_data.push(
            DataRequest::ReadFile {
                node,
                filename,
                display,
                delete_file,
            },
            &self.uid_counter,
        )
    }

    fn request_read_scene(
        &self,
        filename: PathBuf,
        target_ids: Vec<String>,
        source_ids: Vec<String>,
        display: bool,
        delete_file: bool,
    ) -> RequestUid {
        self.read_data.push(
            DataRequest::ReadScene {
                filename,
                target_ids,
                source_ids,
                display,
                delete_file,
            },
            &self.uid_counter,
        )
    }

    fn request_write_data(&self, node: NodeRef, filename: PathBuf) -> RequestUid {
        self.write_data
            .push(DataRequest::WriteFile { node, filename }, &self.uid_counter)
    }

    fn request_update_parent_transform(
        &self,
        node: NodeRef,
        transform_node: NodeRef,
    ) -> RequestUid {
        self.read_data.push(
            DataRequest::UpdateParentTransform {
                node,
                transform_node,
            },
            &self.uid_counter,
        )
    }

    fn request_update_subject_hierarchy_location(
        &self,
        node: NodeRef,
        sibling: NodeRef,
    ) -> RequestUid {
        self.read_data.push(
            DataRequest::UpdateSubjectHierarchyLocation { node, sibling },
            &self.uid_counter,
        )
    }

    fn request_add_node_reference(
        &self,
        referencing: NodeRef,
        referenced: NodeRef,
        role: String,
    ) -> RequestUid {
        self.read_data.push(
            DataRequest::AddNodeReference {
                referencing,
                referenced,
                role,
            },
            &self.uid_counter,
        )
    }
}

/// The execution engine facade.
///
/// One instance per application session, built by
/// [`SchedulerBuilder`](crate::SchedulerBuilder). Owns the four queues,
/// the worker threads, and the UID counter. Cheap producer-only clones
/// are available through [`Scheduler::handle`].
///
/// Dropping the scheduler shuts it down: producers start rejecting,
/// workers exit after their current task, and undelivered modified
/// entries release their held references.
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    pub(crate) fn new(mut config: SchedulerConfig, events: Arc<dyn EventSink>) -> Self {
        config.normalize();
        Self {
            inner: Arc::new(SchedulerInner {
                config,
                uid_counter: AtomicU64::new(1),
                tasks: Arc::new(TaskQueue::new()),
                modified: ModifiedQueue::new(),
                read_data: RequestQueue::new("read-data"),
                write_data: RequestQueue::new("write-data"),
                events,
                running: AtomicBool::new(false),
                workers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns a cloneable producer-only handle.
    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Spawns the worker threads, activates all four queues, and emits
    /// one kick event per pump so the application's timer loop starts
    /// invoking them.
    ///
    /// Fails with [`SchedulerError::AlreadyRunning`] if called while
    /// running. A thread-spawn failure tears down whatever was spawned
    /// and leaves the scheduler stopped.
    pub fn start(&self) -> Result<(), SchedulerError> {
        if self.inner.running.swap(true, Ordering::AcqRel) {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.inner.tasks.activate();
        self.inner.modified.activate();
        self.inner.read_data.activate();
        self.inner.write_data.activate();

        if let Err(err) = self.spawn_workers() {
            self.shutdown();
            return Err(err);
        }

        let delay = self.inner.config.startup_delay;
        self.inner
            .events
            .post(SchedulerEvent::RequestModified { delay });
        self.inner
            .events
            .post(SchedulerEvent::RequestReadData { delay });
        self.inner
            .events
            .post(SchedulerEvent::RequestWriteData { delay });

        tracing::debug!(
            networking_threads = self.inner.config.networking_threads,
            "scheduler started"
        );
        Ok(())
    }

    fn spawn_workers(&self) -> Result<(), SchedulerError> {
        let processing = worker::spawn_worker(
            Arc::clone(&self.inner.tasks),
            TaskKind::Processing,
            0,
            &self.inner.config,
        )?;
        self.inner.workers.lock().unwrap().push(processing);

        for index in 0..self.inner.config.networking_threads {
            let networking = worker::spawn_worker(
                Arc::clone(&self.inner.tasks),
                TaskKind::Networking,
                index,
                &self.inner.config,
            )?;
            self.inner.workers.lock().unwrap().push(networking);
        }
        Ok(())
    }

    /// Deactivates every queue, joins the worker threads, and releases
    /// the references held by undelivered modified entries.
    ///
    /// Producers start rejecting as soon as the flags clear; workers
    /// observe the flag between items and exit, so an in-flight task
    /// runs to completion before its thread is joined. Idempotent.
    pub fn shutdown(&self) {
        if !self.inner.running.swap(false, Ordering::AcqRel) {
            return;
        }

        self.inner.tasks.deactivate();
        self.inner.modified.deactivate();
        self.inner.read_data.deactivate();
        self.inner.write_data.deactivate();

        let handles: Vec<_> = self.inner.workers.lock().unwrap().drain(..).collect();
        for handle in handles {
            if handle.join().is_err() {
                tracing::warn!("worker thread panicked before shutdown");
            }
        }

        self.inner.modified.drain();
        tracing::debug!("scheduler stopped");
    }

    /// Returns `true` while worker threads are running and the queues
    /// accept work.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    // ---------------------------------------------------------------------
    // Producers (any thread)
    // ---------------------------------------------------------------------

    /// Schedules a background task.
    ///
    /// Returns `false` without queuing when the task queue is inactive;
    /// the task is dropped unexecuted.
    pub fn schedule_task(&self, task: Task) -> bool {
        self.inner.schedule_task(task)
    }

    /// Queues a mark-modified notification for `object`.
    ///
    /// The queue holds a strong reference until the notification is
    /// delivered (or coalesced away, or the scheduler shuts down).
    /// Returns [`RequestUid::NONE`] when the modified queue is inactive.
    /// The UID is a logical timestamp only; no completion event is
    /// emitted for modified entries.
    pub fn request_modified(&self, object: Arc<dyn SceneObject>) -> RequestUid {
        self.inner.request_modified(object)
    }

    /// Queues a deferred load of `filename` into `node`.
    ///
    /// `display` asks the scene to show the result; `delete_file`
    /// removes the file after a successful load. Completion is
    /// observable via [`SchedulerEvent::RequestProcessed`] carrying the
    /// returned UID.
    pub fn request_read_file(
        &self,
        node: NodeRef,
        filename: impl Into<PathBuf>,
        display: bool,
        delete_file: bool,
    ) -> RequestUid {
        self.inner
            .request_read_file(node, filename.into(), display, delete_file)
    }

    /// Queues a deferred scene load with id remapping: the stored nodes
    /// named by `source_ids` land on the live nodes named by
    /// `target_ids`.
    pub fn request_read_scene(
        &self,
        filename: impl Into<PathBuf>,
        target_ids: Vec<String>,
        source_ids: Vec<String>,
        display: bool,
        delete_file: bool,
    ) -> RequestUid {
        self.inner
            .request_read_scene(filename.into(), target_ids, source_ids, display, delete_file)
    }

    /// Queues a deferred store of `node` into `filename`.
    pub fn request_write_data(&self, node: NodeRef, filename: impl Into<PathBuf>) -> RequestUid {
        self.inner.request_write_data(node, filename.into())
    }

    /// Queues a deferred re-parent of `node` under `transform_node`.
    pub fn request_update_parent_transform(
        &self,
        node: NodeRef,
        transform_node: NodeRef,
    ) -> RequestUid {
        self.inner.request_update_parent_transform(node, transform_node)
    }

    /// Queues a deferred subject-hierarchy move of `node` next to
    /// `sibling`.
    pub fn request_update_subject_hierarchy_location(
        &self,
        node: NodeRef,
        sibling: NodeRef,
    ) -> RequestUid {
        self.inner
            .request_update_subject_hierarchy_location(node, sibling)
    }

    /// Queues a deferred typed reference from `referencing` to
    /// `referenced` under `role`.
    pub fn request_add_node_reference(
        &self,
        referencing: NodeRef,
        referenced: NodeRef,
        role: impl Into<String>,
    ) -> RequestUid {
        self.inner
            .request_add_node_reference(referencing, referenced, role.into())
    }

    // ---------------------------------------------------------------------
    // Pumps (owning thread)
    // ---------------------------------------------------------------------

    /// Delivers at most one coalesced mark-modified notification.
    ///
    /// Owning-thread only. Returns `true` if a notification was
    /// delivered. While the queue is active the pump re-requests its own
    /// invocation via [`SchedulerEvent::RequestModified`]: immediately
    /// while entries remain, after `idle_delay` otherwise; when inactive
    /// it emits nothing and the loop ends until the next `start`.
    pub fn process_modified(&self) -> bool {
        if !self.inner.modified.is_active() {
            return false;
        }
        let idle = self.inner.config.idle_delay;
        match self.inner.modified.pop_coalesced() {
            Some((uid, object, remaining)) => {
                tracing::trace!(%uid, "delivering modified notification");
                // Bracketed so notifications the object suppressed while
                // queued flush together with this one.
                object.begin_modify();
                object.mark_modified();
                object.end_modify();
                drop(object);

                let delay = if remaining { Duration::ZERO } else { idle };
                self.inner
                    .events
                    .post(SchedulerEvent::RequestModified { delay });
                true
            }
            None => {
                self.inner
                    .events
                    .post(SchedulerEvent::RequestModified { delay: idle });
                false
            }
        }
    }

    /// Executes at most one queued read-data request against `scene`.
    ///
    /// Owning-thread only. Returns the UID of the executed request, if
    /// any. Emits [`SchedulerEvent::RequestProcessed`] for the executed
    /// request whether or not its scene operation succeeded (failures
    /// are logged and reported through the collaborator's own channel),
    /// then re-requests its own invocation like
    /// [`process_modified`](Self::process_modified).
    pub fn process_read_data(&self, scene: &mut dyn SceneOps) -> Option<RequestUid> {
        self.pump_requests(&self.inner.read_data, scene, |delay| {
            SchedulerEvent::RequestReadData { delay }
        })
    }

    /// Executes at most one queued write-data request against `scene`.
    ///
    /// Owning-thread only; same contract as
    /// [`process_read_data`](Self::process_read_data).
    pub fn process_write_data(&self, scene: &mut dyn SceneOps) -> Option<RequestUid> {
        self.pump_requests(&self.inner.write_data, scene, |delay| {
            SchedulerEvent::RequestWriteData { delay }
        })
    }

    fn pump_requests(
        &self,
        queue: &RequestQueue,
        scene: &mut dyn SceneOps,
        reschedule: fn(Duration) -> SchedulerEvent,
    ) -> Option<RequestUid> {
        if !queue.is_active() {
            return None;
        }
        let idle = self.inner.config.idle_delay;
        match queue.pop() {
            Some((queued, remaining)) => {
                let uid = queued.uid;
                let op = queued.request.name();
                tracing::debug!(%uid, op, "executing request");
                if let Err(err) = queued.request.execute(scene) {
                    tracing::warn!(%uid, op, error = %err, "request execution failed");
                }
                self.inner
                    .events
                    .post(SchedulerEvent::RequestProcessed { uid });
                self.inner
                    .events
                    .post(reschedule(if remaining { Duration::ZERO } else { idle }));
                Some(uid)
            }
            None => {
                self.inner.events.post(reschedule(idle));
                None
            }
        }
    }

    // ---------------------------------------------------------------------
    // Statistics
    // ---------------------------------------------------------------------

    /// Number of background tasks waiting in the task queue.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.inner.tasks.len()
    }

    /// Number of entries waiting in the modified queue.
    #[must_use]
    pub fn pending_modified(&self) -> usize {
        self.inner.modified.len()
    }

    /// Number of requests waiting in the read-data queue.
    #[must_use]
    pub fn pending_read_requests(&self) -> usize {
        self.inner.read_data.len()
    }

    /// Number of requests waiting in the write-data queue.
    #[must_use]
    pub fn pending_write_requests(&self) -> usize {
        self.inner.write_data.len()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("running", &self.is_running())
            .field("pending_tasks", &self.pending_tasks())
            .field("pending_modified", &self.pending_modified())
            .field("pending_read_requests", &self.pending_read_requests())
            .field("pending_write_requests", &self.pending_write_requests())
            .finish()
    }
}

/// Cloneable producer-only handle to a [`Scheduler`].
///
/// Handles share the scheduler's queues and UID counter and remain valid
/// after shutdown; their producers simply start returning
/// [`RequestUid::NONE`]/`false`. Handles cannot pump or change the
/// scheduler's lifecycle.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Arc<SchedulerInner>,
}

impl SchedulerHandle {
    /// See [`Scheduler::is_running`].
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// See [`Scheduler::schedule_task`].
    pub fn schedule_task(&self, task: Task) -> bool {
        self.inner.schedule_task(task)
    }

    /// See [`Scheduler::request_modified`].
    pub fn request_modified(&self, object: Arc<dyn SceneObject>) -> RequestUid {
        self.inner.request_modified(object)
    }

    /// See [`Scheduler::request_read_file`].
    pub fn request_read_file(
        &self,
        node: NodeRef,
        filename: impl Into<PathBuf>,
        display: bool,
        delete_file: bool,
    ) -> RequestUid {
        self.inner
            .request_read_file(node, filename.into(), display, delete_file)
    }

    /// See [`Scheduler::request_read_scene`].
    pub fn request_read_scene(
        &self,
        filename: impl Into<PathBuf>,
        target_ids: Vec<String>,
        source_ids: Vec<String>,
        display: bool,
        delete_file: bool,
    ) -> RequestUid {
        self.inner
            .request_read_scene(filename.into(), target_ids, source_ids, display, delete_file)
    }

    /// See [`Scheduler::request_write_data`].
    pub fn request_write_data(&self, node: NodeRef, filename: impl Into<PathBuf>) -> RequestUid {
        self.inner.request_write_data(node, filename.into())
    }

    /// See [`Scheduler::request_update_parent_transform`].
    pub fn request_update_parent_transform(
        &self,
        node: NodeRef,
        transform_node: NodeRef,
    ) -> RequestUid {
        self.inner.request_update_parent_transform(node, transform_node)
    }

    /// See [`Scheduler::request_update_subject_hierarchy_location`].
    pub fn request_update_subject_hierarchy_location(
        &self,
        node: NodeRef,
        sibling: NodeRef,
    ) -> RequestUid {
        self.inner
            .request_update_subject_hierarchy_location(node, sibling)
    }

    /// See [`Scheduler::request_add_node_reference`].
    pub fn request_add_node_reference(
        &self,
        referencing: NodeRef,
        referenced: NodeRef,
        role: impl Into<String>,
    ) -> RequestUid {
        self.inner
            .request_add_node_reference(referencing, referenced, role.into())
    }
}

impl fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SchedulerBuilder;

    #[test]
    fn built_scheduler_is_stopped() {
        let scheduler = SchedulerBuilder::new().build();
        assert!(!scheduler.is_running());
        assert!(!scheduler.schedule_task(Task::processing(|| {})));
        assert_eq!(scheduler.pending_tasks(), 0);
    }

    #[test]
    fn start_twice_fails() {
        let scheduler = SchedulerBuilder::new().build();
        scheduler.start().unwrap();
        assert!(matches!(
            scheduler.start(),
            Err(SchedulerError::AlreadyRunning)
        ));
        scheduler.shutdown();
    }

    #[test]
    fn shutdown_is_idempotent() {
        let scheduler = SchedulerBuilder::new().build();
        scheduler.start().unwrap();
        scheduler.shutdown();
        scheduler.shutdown();
        assert!(!scheduler.is_running());
    }

    #[test]
    fn handle_remains_valid_after_shutdown() {
        let scheduler = SchedulerBuilder::new().build();
        let handle = scheduler.handle();
        scheduler.start().unwrap();
        assert!(handle.is_running());
        scheduler.shutdown();
        assert!(!handle.is_running());
        assert_eq!(
            handle.request_write_data(NodeRef::new("n"), "/tmp/out"),
            RequestUid::NONE
        );
    }
}
