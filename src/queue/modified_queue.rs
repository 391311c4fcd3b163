//! Coalescing queue of pending mark-modified notifications.
//!
//! Producers enqueue an object reference from any thread; the owning
//! thread drains one logical notification per pump tick. Consecutive
//! entries for the same object (by `Arc` identity) collapse into a
//! single notification. This coalesces bursts; it is not an ordering
//! guarantee across the whole queue.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::scene::SceneObject;
use crate::types::RequestUid;

/// One pending notification: the held reference and its logical
/// timestamp.
struct ModifiedEntry {
    /// Enqueue-order timestamp. Not a completion token; no processed
    /// event is emitted for modified entries.
    uid: RequestUid,
    object: Arc<dyn SceneObject>,
}

/// FIFO of objects awaiting a mark-modified notification.
pub(crate) struct ModifiedQueue {
    queue: Mutex<VecDeque<ModifiedEntry>>,
    active: AtomicBool,
}

impl ModifiedQueue {
    pub(crate) fn new() -> Self {
        Self {
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

    /// Enqueues `object`, holding a strong reference until the entry is
    /// drained, coalesced away, or released by [`drain`](Self::drain).
    ///
    /// Returns [`RequestUid::NONE`] without queuing when inactive.
    pub(crate) fn push(&self, object: Arc<dyn SceneObject>, counter: &AtomicU64) -> RequestUid {
        if !self.is_active() {
            tracing::warn!("modified request rejected: queue inactive");
            return RequestUid::NONE;
        }
        let mut queue = self.queue.lock().unwrap();
        let uid = RequestUid::next(counter);
        tracing::trace!(%uid, depth = queue.len(), "modified notification queued");
        queue.push_back(ModifiedEntry { uid, object });
        uid
    }

    /// Pops the head entry and every consecutive duplicate of it,
    /// returning the surviving reference and whether entries remain.
    ///
    /// Duplicates are matched by `Arc` identity; each discarded
    /// duplicate's held reference is released here, so one notification
    /// accounts for the whole coalesced run.
    pub(crate) fn pop_coalesced(&self) -> Option<(RequestUid, Arc<dyn SceneObject>, bool)> {
        let mut queue = self.queue.lock().unwrap();
        let head = queue.pop_front()?;
        while queue
            .front()
            .is_some_and(|next| Arc::ptr_eq(&next.object, &head.object))
        {
            queue.pop_front();
        }
        let remaining = !queue.is_empty();
        Some((head.uid, head.object, remaining))
    }

    /// Releases every held reference without notifying. Shutdown path.
    pub(crate) fn drain(&self) {
        let mut queue = self.queue.lock().unwrap();
        if !queue.is_empty() {
            tracing::debug!(dropped = queue.len(), "releasing undelivered modified entries");
        }
        queue.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}
