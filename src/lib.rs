//! Offstage: asynchronous task and request execution for scene-owning
//! applications.
//!
//! # Overview
//!
//! Offstage lets a single-threaded, scene-owning application offload file
//! I/O, network I/O, and arbitrary background computation to dedicated
//! worker threads while guaranteeing that every mutation of the shared
//! scene happens on the owning (main) thread.
//!
//! Work flows through four FIFO queues, each gated by its own active
//! flag:
//!
//! - **Task queue**: background closures tagged [`TaskKind::Processing`]
//!   or [`TaskKind::Networking`], consumed by dedicated worker threads.
//! - **Modified queue**: objects awaiting a mark-modified notification,
//!   coalesced over consecutive duplicates and drained on the owning
//!   thread.
//! - **Read-data / write-data queues**: deferred scene operations
//!   ([`DataRequest`]) that must execute on the owning thread, pumped
//!   one item per timer tick.
//!
//! Producers may run on any thread. The pumps
//! ([`Scheduler::process_modified`], [`Scheduler::process_read_data`],
//! [`Scheduler::process_write_data`]) are invoked by the application's
//! timer loop on the owning thread and request their own re-invocation
//! through the injected [`EventSink`].
//!
//! # Core guarantees
//!
//! - **Owning-thread mutation**: the scene is touched only inside a
//!   pump, through the [`SceneOps`] capability the caller passes in.
//! - **Per-queue FIFO**: entries of the consumable type execute in
//!   enqueue order; there is no ordering across queues.
//! - **Correlation**: every accepted request returns a unique,
//!   never-reused [`RequestUid`]; completion is observable via
//!   [`SchedulerEvent::RequestProcessed`].
//! - **Coarse cancellation**: shutdown flips the active flags; producers
//!   start rejecting immediately, workers observe the flag between items
//!   and exit without preempting in-flight work.
//!
//! # Example
//!
//! ```ignore
//! use offstage::{NodeRef, SchedulerBuilder, Task};
//!
//! let scheduler = SchedulerBuilder::new()
//!     .event_fn(|event| timer_source.post(event))
//!     .build();
//! scheduler.start()?;
//!
//! // Any thread:
//! scheduler.schedule_task(Task::processing(|| fetch_and_convert()));
//! let uid = scheduler.request_read_file(NodeRef::new("model-42"),
//!     "/tmp/download.obj", true, true);
//!
//! // Owning thread, on each RequestReadData event:
//! scheduler.process_read_data(&mut scene);
//! ```
//!
//! # Module structure
//!
//! - [`types`]: identifier and classification types
//! - [`task`]: background work units
//! - [`request`]: deferred owning-thread scene operations
//! - [`scene`]: collaborator interfaces implemented by the application
//! - [`events`]: emitted events and the sink they flow into
//! - [`config`]: configuration, env-var and TOML layering
//! - [`builder`]: fluent scheduler construction
//! - [`scheduler`]: the facade: producers, pumps, lifecycle
//! - [`error`]: error types

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]

pub mod builder;
pub mod config;
pub mod error;
pub mod events;
pub mod request;
pub mod scene;
pub mod scheduler;
pub mod task;
pub mod types;

mod queue;
mod worker;

pub use builder::SchedulerBuilder;
pub use config::SchedulerConfig;
pub use error::{SceneError, SchedulerError};
pub use events::{EventSink, FnSink, NullSink, SchedulerEvent};
pub use request::DataRequest;
pub use scene::{NodeRef, SceneObject, SceneOps};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use task::Task;
pub use types::{RequestUid, TaskKind};
