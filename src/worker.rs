//! Worker threads consuming the task queue.
//!
//! One dedicated thread consumes [`TaskKind::Processing`] tasks and, by
//! default, one consumes [`TaskKind::Networking`] tasks. The loop's only
//! cancellation mechanism is the queue's active flag, observed once per
//! iteration between items; an in-flight task always runs to completion.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::queue::TaskQueue;
use crate::types::TaskKind;

/// Runs until the queue is deactivated, executing matching-kind tasks in
/// FIFO order. Tasks are executed outside the queue lock.
pub(crate) fn worker_loop(queue: &TaskQueue, kind: TaskKind, poll_interval: Duration) {
    tracing::debug!(kind = %kind, "worker loop started");
    while queue.is_active() {
        if let Some(task) = queue.take(kind, poll_interval) {
            tracing::trace!(kind = %kind, "executing task");
            task.run();
        }
    }
    tracing::debug!(kind = %kind, "worker loop exited");
}

/// Spawns one named worker thread over `queue`.
pub(crate) fn spawn_worker(
    queue: Arc<TaskQueue>,
    kind: TaskKind,
    index: usize,
    config: &SchedulerConfig,
) -> Result<JoinHandle<()>, SchedulerError> {
    let name = format!("{}-{}-{index}", config.thread_name_prefix, kind.name());
    let poll_interval = config.poll_interval;
    let on_start = config.on_thread_start.clone();
    let on_stop = config.on_thread_stop.clone();

    let mut builder = thread::Builder::new().name(name.clone());
    if let Some(stack_size) = config.thread_stack_size {
        builder = builder.stack_size(stack_size);
    }
    builder
        .spawn(move || {
            if let Some(ref callback) = on_start {
                callback();
            }
            worker_loop(&queue, kind, poll_interval);
            if let Some(ref callback) = on_stop {
                callback();
            }
        })
        .map_err(|source| SchedulerError::ThreadSpawn { name, source })
}
