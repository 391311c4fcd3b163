//! Fluent construction of a [`Scheduler`].

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{self, SchedulerConfig};
use crate::error::SchedulerError;
use crate::events::{EventSink, FnSink, NullSink, SchedulerEvent};
use crate::scheduler::Scheduler;

/// Builder for a [`Scheduler`] with custom configuration.
///
/// ```ignore
/// use offstage::SchedulerBuilder;
///
/// let scheduler = SchedulerBuilder::new()
///     .networking_threads(1)
///     .idle_delay(std::time::Duration::from_millis(50))
///     .event_fn(|event| timer_source.post(event))
///     .build();
/// scheduler.start()?;
/// ```
#[derive(Clone)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    events: Arc<dyn EventSink>,
}

impl SchedulerBuilder {
    /// Creates a builder with default configuration and a [`NullSink`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            events: Arc::new(NullSink),
        }
    }

    /// Sets the number of networking worker threads.
    ///
    /// Defaults to 1; raise it only when networking task bodies are safe
    /// to run concurrently.
    #[must_use]
    pub fn networking_threads(mut self, n: usize) -> Self {
        self.config.networking_threads = n;
        self
    }

    /// Sets the upper bound on a worker's parked wait between active-flag
    /// checks.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Sets the reschedule delay a pump requests when its queue is empty.
    #[must_use]
    pub fn idle_delay(mut self, delay: Duration) -> Self {
        self.config.idle_delay = delay;
        self
    }

    /// Sets the delay carried by the pump kick events emitted by
    /// [`Scheduler::start`].
    #[must_use]
    pub fn startup_delay(mut self, delay: Duration) -> Self {
        self.config.startup_delay = delay;
        self
    }

    /// Sets the worker thread name prefix.
    #[must_use]
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Sets the worker thread stack size in bytes.
    #[must_use]
    pub fn thread_stack_size(mut self, size: usize) -> Self {
        self.config.thread_stack_size = Some(size);
        self
    }

    /// Registers a callback to run on each worker thread before its loop.
    #[must_use]
    pub fn on_thread_start<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.config.on_thread_start = Some(Arc::new(f));
        self
    }

    /// Registers a callback to run on each worker thread after its loop.
    #[must_use]
    pub fn on_thread_stop<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.config.on_thread_stop = Some(Arc::new(f));
        self
    }

    /// Sets the sink receiving pump reschedule and completion events.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Sets a closure as the event sink.
    #[must_use]
    pub fn event_fn<F>(self, f: F) -> Self
    where
        F: Fn(SchedulerEvent) + Send + Sync + 'static,
    {
        self.event_sink(Arc::new(FnSink::new(f)))
    }

    /// Applies `OFFSTAGE_*` environment overrides on top of the current
    /// values.
    pub fn load_env(mut self) -> Result<Self, SchedulerError> {
        config::apply_env_overrides(&mut self.config)?;
        Ok(self)
    }

    /// Applies a TOML config file on top of the current values.
    #[cfg(feature = "config-file")]
    pub fn load_toml_file(mut self, path: &std::path::Path) -> Result<Self, SchedulerError> {
        let parsed = config::parse_toml_file(path)?;
        config::apply_toml_config(&mut self.config, &parsed);
        Ok(self)
    }

    /// Normalizes the configuration and constructs the scheduler.
    ///
    /// The scheduler is created stopped; call [`Scheduler::start`] to
    /// spawn workers and activate the queues.
    #[must_use]
    pub fn build(self) -> Scheduler {
        Scheduler::new(self.config, self.events)
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SchedulerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
