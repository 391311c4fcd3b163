//! Collaborator interfaces: the owning thread's scene capabilities.
//!
//! The engine never touches the scene itself. [`SceneOps`] is the narrow
//! mutation capability a pump borrows from its caller for the duration of
//! one request execution; [`SceneObject`] is the notification surface of
//! an object resident in the modified queue. Both are implemented by the
//! embedding application.

use core::fmt;
use std::path::Path;

use crate::error::SceneError;

/// Opaque reference id for a node in the application's scene.
///
/// The engine treats this as an uninterpreted key; [`SceneOps`]
/// implementations resolve it to concrete node storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(String);

impl NodeRef {
    /// Wraps a reference id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeRef {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Scene mutation capability, borrowed by the read-data and write-data
/// pumps.
///
/// Implementations run on the scene-owning thread only. The engine
/// invokes at most one method at a time, never while a queue lock is
/// held. Failures are returned as [`SceneError`]; the pump logs them and
/// still signals completion for the request, so implementations are
/// responsible for their own user-visible error reporting (a failure
/// flag on the resolved node, a log entry, and so on).
pub trait SceneOps {
    /// Loads `path` into the node identified by `node`.
    ///
    /// `display` asks the implementation to make the loaded data visible
    /// once the load succeeds.
    fn read_file_into_node(
        &mut self,
        node: &NodeRef,
        path: &Path,
        display: bool,
    ) -> Result<(), SceneError>;

    /// Loads a scene file, mapping the stored nodes identified by
    /// `source_ids` onto the live nodes identified by `target_ids`.
    fn read_scene(
        &mut self,
        path: &Path,
        target_ids: &[String],
        source_ids: &[String],
        display: bool,
    ) -> Result<(), SceneError>;

    /// Stores the node identified by `node` into `path`.
    fn write_node_to_file(&mut self, node: &NodeRef, path: &Path) -> Result<(), SceneError>;

    /// Re-parents `node` under the transform node `transform_node`.
    fn update_parent_transform(
        &mut self,
        node: &NodeRef,
        transform_node: &NodeRef,
    ) -> Result<(), SceneError>;

    /// Moves `node` next to `sibling` in the subject hierarchy.
    fn update_subject_hierarchy_location(
        &mut self,
        node: &NodeRef,
        sibling: &NodeRef,
    ) -> Result<(), SceneError>;

    /// Records a reference from `referencing` to `referenced` under the
    /// given `role`.
    fn add_node_reference(
        &mut self,
        referencing: &NodeRef,
        referenced: &NodeRef,
        role: &str,
    ) -> Result<(), SceneError>;
}

/// Notification surface of an object resident in the modified queue.
///
/// The modified pump delivers exactly one [`mark_modified`] per coalesced
/// run of queue entries, bracketed by [`begin_modify`]/[`end_modify`] so
/// implementations that suppress notifications while queued can flush
/// them together with the delivered one.
///
/// Implementations must be callable from the owning thread; the `Send +
/// Sync` bound exists because the queue holds the reference across
/// threads, not because notifications are delivered concurrently.
///
/// [`mark_modified`]: SceneObject::mark_modified
/// [`begin_modify`]: SceneObject::begin_modify
/// [`end_modify`]: SceneObject::end_modify
pub trait SceneObject: Send + Sync {
    /// Opens a modify bracket before the notification. Defaults to a
    /// no-op.
    fn begin_modify(&self) {}

    /// Delivers the mark-modified notification.
    fn mark_modified(&self);

    /// Closes the modify bracket, flushing any notifications suppressed
    /// while it was open. Defaults to a no-op.
    fn end_modify(&self) {}
}
