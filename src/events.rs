//! Events emitted by the engine toward the embedding application.
//!
//! The engine owns no timer. Each main-thread pump requests its own
//! re-invocation by posting a [`SchedulerEvent`] into the injected
//! [`EventSink`]; the application's event loop turns the requested delay
//! into an actual timer tick and calls the pump again. Completion
//! notifications for data requests ride the same channel.

use std::time::Duration;

use crate::types::RequestUid;

/// An event posted to the embedding application's [`EventSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Invoke [`process_modified`](crate::Scheduler::process_modified)
    /// again after `delay`.
    RequestModified {
        /// Requested delay before the next invocation; zero means
        /// "immediately".
        delay: Duration,
    },
    /// Invoke [`process_read_data`](crate::Scheduler::process_read_data)
    /// again after `delay`.
    RequestReadData {
        /// Requested delay before the next invocation; zero means
        /// "immediately".
        delay: Duration,
    },
    /// Invoke [`process_write_data`](crate::Scheduler::process_write_data)
    /// again after `delay`.
    RequestWriteData {
        /// Requested delay before the next invocation; zero means
        /// "immediately".
        delay: Duration,
    },
    /// A queued data request finished executing. Emitted whether or not
    /// the underlying scene operation succeeded.
    RequestProcessed {
        /// The UID returned to the producer at enqueue time.
        uid: RequestUid,
    },
}

/// Receiver for engine events.
///
/// Posted from the owning thread's pumps and from
/// [`Scheduler::start`](crate::Scheduler::start), never while a queue
/// lock is held. Implementations must be cheap and non-blocking.
pub trait EventSink: Send + Sync {
    /// Delivers one event.
    fn post(&self, event: SchedulerEvent);
}

/// Discards every event.
///
/// The default sink, for embeddings that poll the pumps on a fixed
/// cadence instead of reacting to reschedule events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn post(&self, _event: SchedulerEvent) {}
}

/// Adapts a closure to [`EventSink`].
pub struct FnSink<F>(F);

impl<F> FnSink<F>
where
    F: Fn(SchedulerEvent) + Send + Sync,
{
    /// Wraps `f` as an event sink.
    #[must_use]
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventSink for FnSink<F>
where
    F: Fn(SchedulerEvent) + Send + Sync,
{
    fn post(&self, event: SchedulerEvent) {
        (self.0)(event);
    }
}
