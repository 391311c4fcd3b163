//! Background work units consumed by worker threads.

use core::fmt;

use crate::types::TaskKind;

/// One unit of background work.
///
/// A task pairs an immutable [`TaskKind`] with the closure to run. The
/// queue owns the task while it is resident; ownership moves to the
/// consuming worker on pop, which runs the closure exactly once on its
/// own thread and then drops it. The engine does not intercept failures
/// inside the closure; a task reports its own errors through whatever
/// channel its creator arranged.
pub struct Task {
    kind: TaskKind,
    work: Box<dyn FnOnce() + Send + 'static>,
}

impl Task {
    /// Creates a task of the given kind.
    #[must_use]
    pub fn new<F>(kind: TaskKind, work: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            kind,
            work: Box::new(work),
        }
    }

    /// Creates a [`TaskKind::Processing`] task.
    #[must_use]
    pub fn processing<F>(work: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(TaskKind::Processing, work)
    }

    /// Creates a [`TaskKind::Networking`] task.
    #[must_use]
    pub fn networking<F>(work: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(TaskKind::Networking, work)
    }

    /// Returns the worker class allowed to consume this task.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Consumes the task, running its closure on the current thread.
    pub(crate) fn run(self) {
        (self.work)();
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
