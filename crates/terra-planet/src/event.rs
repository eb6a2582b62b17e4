//! Notifications for the rendering and decoration collaborators.

use crate::ChunkId;

/// A visible-state change of one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkEvent {
    /// A chunk was built; its mesh is visible and collidable.
    Created(ChunkId),
    /// A chunk and its mesh and decorations were released.
    Destroyed(ChunkId),
    /// A merged chunk's own mesh, collider and decorations were re-enabled.
    Shown(ChunkId),
    /// A subdivided chunk's own mesh, collider and decorations were disabled.
    Hidden(ChunkId),
    /// A chunk's vertices changed; its collider must be rebuilt.
    MeshUpdated(ChunkId),
}

/// Counters for one [`ChunkTree::update`](crate::ChunkTree::update) pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Chunks visited.
    pub evaluated: usize,
    /// Leaf to subdivided transitions.
    pub subdivisions: usize,
    /// Subdivided to leaf transitions.
    pub merges: usize,
    /// Chunks built.
    pub created: usize,
    /// Chunks released.
    pub destroyed: usize,
}

impl TickStats {
    /// Whether the tree changed shape.
    pub fn changed(&self) -> bool {
        self.subdivisions > 0 || self.merges > 0
    }
}
