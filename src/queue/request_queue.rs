//! FIFO queues of deferred owning-thread operations.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use crate::request::DataRequest;
use crate::types::RequestUid;

/// A [`DataRequest`] resident in a queue, tagged with its correlation
/// UID.
#[derive(Debug)]
pub(crate) struct QueuedRequest {
    pub(crate) uid: RequestUid,
    pub(crate) request: DataRequest,
}

/// FIFO of queued requests. One instance each for read-data and
/// write-data; both allocate UIDs from the scheduler's shared counter.
pub(crate) struct RequestQueue {
    /// Queue name for logs.
    label: &'static str,
    queue: Mutex<VecDeque<QueuedRequest>>,
    active: AtomicBool,
}

impl RequestQueue {
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            label,
            queue: Mutex::new(VecDeque::new()),
            active: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn activate(&self) {
        self.active.store(true, Ordering::Release);
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Appends `request` to the tail and returns its fresh UID.
    ///
    /// The UID is drawn from `counter` while the queue lock is held, so
    /// UIDs are monotonic in enqueue order within this queue. Returns
    /// [`RequestUid::NONE`] without queuing when inactive.
    pub(crate) fn push(&self, request: DataRequest, counter: &AtomicU64) -> RequestUid {
        if !self.is_active() {
            tracing::warn!(
                queue = self.label,
                op = request.name(),
                "request rejected: queue inactive"
            );
            return RequestUid::NONE;
        }
        let mut queue = self.queue.lock().unwrap();
        let uid = RequestUid::next(counter);
        tracing::trace!(
            queue = self.label,
            op = request.name(),
            %uid,
            depth = queue.len(),
            "request queued"
        );
        queue.push_back(QueuedRequest { uid, request });
        uid
    }

    /// Pops the head, reporting whether entries remain behind it.
    pub(crate) fn pop(&self) -> Option<(QueuedRequest, bool)> {
        let mut queue = self.queue.lock().unwrap();
        let head = queue.pop_front()?;
        Some((head, !queue.is_empty()))
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}
