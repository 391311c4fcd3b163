//! Deferred scene operations executed on the owning thread.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SceneError;
use crate::scene::{NodeRef, SceneOps};

/// A deferred operation that must execute on the scene-owning thread.
///
/// The kind set is closed: every variant is dispatched exhaustively by
/// the pump, so adding a kind is a compile-time-visible change. Producers
/// on [`Scheduler`](crate::Scheduler) construct these; each instance is
/// executed at most once and consumed by execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataRequest {
    /// Load a file into an existing node.
    ReadFile {
        /// Target node.
        node: NodeRef,
        /// File to load.
        filename: PathBuf,
        /// Make the loaded data visible after the load.
        display: bool,
        /// Remove `filename` after a successful load.
        delete_file: bool,
    },
    /// Load a scene file, remapping stored node ids onto live ones.
    ReadScene {
        /// Scene file to load.
        filename: PathBuf,
        /// Ids of the live nodes to load into.
        target_ids: Vec<String>,
        /// Corresponding ids of the nodes in the stored scene.
        source_ids: Vec<String>,
        /// Make the loaded data visible after the load.
        display: bool,
        /// Remove `filename` after a successful load.
        delete_file: bool,
    },
    /// Store a node into a file.
    WriteFile {
        /// Source node.
        node: NodeRef,
        /// Destination file.
        filename: PathBuf,
    },
    /// Re-parent a node under a transform node.
    UpdateParentTransform {
        /// Node whose parent changes.
        node: NodeRef,
        /// New parent transform node.
        transform_node: NodeRef,
    },
    /// Move a node next to a sibling in the subject hierarchy.
    UpdateSubjectHierarchyLocation {
        /// Node being moved.
        node: NodeRef,
        /// Sibling to place the node beside.
        sibling: NodeRef,
    },
    /// Record a typed reference between two nodes.
    AddNodeReference {
        /// Node holding the reference.
        referencing: NodeRef,
        /// Node being referenced.
        referenced: NodeRef,
        /// Reference role.
        role: String,
    },
}

impl DataRequest {
    /// Returns a short operation name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "read-file",
            Self::ReadScene { .. } => "read-scene",
            Self::WriteFile { .. } => "write-file",
            Self::UpdateParentTransform { .. } => "update-parent-transform",
            Self::UpdateSubjectHierarchyLocation { .. } => "update-subject-hierarchy-location",
            Self::AddNodeReference { .. } => "add-node-reference",
        }
    }

    /// Executes the operation against `scene`, consuming the request.
    pub(crate) fn execute(self, scene: &mut dyn SceneOps) -> Result<(), SceneError> {
        match self {
            Self::ReadFile {
                node,
                filename,
                display,
                delete_file,
            } => {
                scene.read_file_into_node(&node, &filename, display)?;
                if delete_file {
                    remove_consumed_file(&filename);
                }
                Ok(())
            }
            Self::ReadScene {
                filename,
                target_ids,
                source_ids,
                display,
                delete_file,
            } => {
                scene.read_scene(&filename, &target_ids, &source_ids, display)?;
                if delete_file {
                    remove_consumed_file(&filename);
                }
                Ok(())
            }
            Self::WriteFile { node, filename } => scene.write_node_to_file(&node, &filename),
            Self::UpdateParentTransform {
                node,
                transform_node,
            } => scene.update_parent_transform(&node, &transform_node),
            Self::UpdateSubjectHierarchyLocation { node, sibling } => {
                scene.update_subject_hierarchy_location(&node, &sibling)
            }
            Self::AddNodeReference {
                referencing,
                referenced,
                role,
            } => scene.add_node_reference(&referencing, &referenced, &role),
        }
    }
}

/// Removes a source file consumed by a successful load. Failure to remove
/// is logged, not propagated.
fn remove_consumed_file(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %err, "failed to remove consumed source file");
    }
}
