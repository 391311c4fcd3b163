//! Typed FIFO work queue consumed by the worker threads.
//!
//! The queue holds [`Task`]s of mixed kinds in one FIFO. A consumer pops
//! only when the head's kind matches its own class; a mismatched head
//! stays in place and that consumer idles until the owning class drains
//! it. Head-of-line blocking between classes is accepted: each class has
//! its own dedicated consumer, so a matching head is always drained.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::task::Task;
use crate::types::TaskKind;

/// FIFO of background tasks with kind-filtered consumption.
#[derive(Debug)]
pub(crate) struct TaskQueue {
    queue: Mutex<VecDeque<Task>>,
    /// Wakes parked workers on push and on deactivation.
    available: Condvar,
    active: AtomicBool,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            active: AtomicBool::new(false),
        }
    }

    /// Gate observed by producers and by the worker loops once per
    /// iteration.
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    /// Clears the gate and wakes every parked worker so the loops observe
    /// it and exit.
    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
        let _guard = self.queue.lock().unwrap();
        self.available.notify_all();
    }

    /// Appends `task` to the tail. Fails without queuing when inactive.
    pub(crate) fn push(&self, task: Task) -> bool {
        if !self.is_active() {
            return false;
        }
        let mut queue = self.queue.lock().unwrap();
        tracing::trace!(kind = %task.kind(), depth = queue.len(), "task queued");
        queue.push_back(task);
        // Every worker class re-inspects the head; the task may not be
        // for the class a single notify would happen to wake.
        self.available.notify_all();
        true
    }

    /// Pops the head if its kind matches `kind`, parking up to `wait`
    /// otherwise.
    ///
    /// Returns `None` on timeout, on a mismatched head, or on
    /// deactivation; the caller re-checks the active flag before calling
    /// again, which keeps shutdown non-preemptive and once-per-iteration.
    pub(crate) fn take(&self, kind: TaskKind, wait: Duration) -> Option<Task> {
        let mut queue = self.queue.lock().unwrap();
        if Self::head_matches(&queue, kind) {
            return queue.pop_front();
        }
        // Deactivation stores the flag before taking the lock, so checking
        // here (while holding it) cannot miss a shutdown and park through it.
        if !self.is_active() {
            return None;
        }
        let (mut queue, _timed_out) = self.available.wait_timeout(queue, wait).unwrap();
        if !self.is_active() {
            return None;
        }
        if Self::head_matches(&queue, kind) {
            queue.pop_front()
        } else {
            None
        }
    }

    fn head_matches(queue: &VecDeque<Task>, kind: TaskKind) -> bool {
        queue.front().is_some_and(|task| task.kind() == kind)
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}
