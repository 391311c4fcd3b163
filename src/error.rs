//! Error types for scheduler lifecycle and scene collaborators.
//!
//! Producer rejection is not an error: producers signal "not accepted"
//! with [`RequestUid::NONE`](crate::types::RequestUid::NONE) or `false`
//! and never fail any other way. The types here cover the two places
//! failures actually surface:
//!
//! - [`SchedulerError`]: construction, configuration, and worker-thread
//!   lifecycle failures, returned to the caller.
//! - [`SceneError`]: failures inside a collaborator's scene operation.
//!   These are logged by the pump and reported through whatever the
//!   collaborator's own error channel is; they never cross the pump
//!   boundary, and completion is still signalled for the request.

use crate::scene::NodeRef;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures in scheduler construction, configuration, or lifecycle.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `start` was called while worker threads are already running.
    #[error("scheduler is already running")]
    AlreadyRunning,

    /// Spawning a worker thread failed; the scheduler is left stopped.
    #[error("failed to spawn worker thread {name}")]
    ThreadSpawn {
        /// Name of the thread that failed to spawn.
        name: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A configuration value could not be parsed or is out of range.
    #[error("invalid value for {key}: {reason}")]
    InvalidConfig {
        /// Environment variable or config file key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl SchedulerError {
    /// Creates a [`SchedulerError::InvalidConfig`] for `key`.
    #[must_use]
    pub fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Failures raised by a [`SceneOps`](crate::scene::SceneOps)
/// implementation while executing a deferred request.
#[derive(Debug, Error)]
pub enum SceneError {
    /// No node matches the given reference id.
    #[error("node {id} not found")]
    NodeNotFound {
        /// The reference id that failed to resolve.
        id: NodeRef,
    },

    /// File I/O failed while loading or storing node data.
    #[error("i/o failure on {}", .path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The operation failed for a collaborator-specific reason.
    #[error("{0}")]
    Operation(String),
}

impl SceneError {
    /// Creates a [`SceneError::Io`] for `path`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
