//! One quadtree node and the mesh it owns.

use std::sync::Arc;

use glam::DVec3;
use terra_cubesphere::{CubeFace, Footprint};
use terra_terrain::{BiomeSignal, Placement};

use crate::ChunkId;

/// Lifecycle state of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Mesh visible and collidable, no children.
    Leaf,
    /// Mesh hidden, four children tile the footprint.
    Subdivided,
}

/// Mesh buffers of a chunk, in planet-local space.
#[derive(Clone, Debug)]
pub struct ChunkMeshData {
    /// Undisplaced vertices on the base sphere.
    pub base: Vec<DVec3>,
    /// Current vertices: displaced, and sculpted by edits.
    pub vertices: Vec<DVec3>,
    /// Triangle list, shared by all chunks of the planet.
    pub indices: Arc<[u32]>,
    /// Smooth vertex normals of `vertices`.
    pub normals: Vec<DVec3>,
    /// Per-vertex biome signal, the renderer's UV channel.
    pub biome: Vec<BiomeSignal>,
    /// Grid side length.
    pub resolution: u32,
    /// `false` when the backend failed and the mesh is the flat base sphere.
    pub displaced: bool,
}

impl ChunkMeshData {
    /// The biome signal packed for upload as a second UV channel.
    pub fn biome_uvs(&self) -> Vec<[f32; 2]> {
        self.biome.iter().map(BiomeSignal::as_uv).collect()
    }
}

/// A node of a per-face quadtree.
#[derive(Clone, Debug)]
pub struct TerrainChunk {
    pub(crate) face: CubeFace,
    pub(crate) depth: u8,
    pub(crate) footprint: Footprint,
    pub(crate) center: DVec3,
    pub(crate) parent: Option<ChunkId>,
    pub(crate) children: Option<[ChunkId; 4]>,
    pub(crate) mesh: ChunkMeshData,
    pub(crate) visible: bool,
    pub(crate) collider_enabled: bool,
    pub(crate) decorations: Vec<Placement>,
    pub(crate) decorations_active: bool,
    pub(crate) seed: u64,
}

impl TerrainChunk {
    /// Cube face of the whole branch.
    pub fn face(&self) -> CubeFace {
        self.face
    }

    /// Depth in the quadtree; roots are 0.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Region of the face this chunk covers.
    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// World-space center of the footprint on the undisplaced sphere.
    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// Parent handle; `None` for roots.
    pub fn parent(&self) -> Option<ChunkId> {
        self.parent
    }

    /// Child handles when subdivided.
    pub fn children(&self) -> Option<[ChunkId; 4]> {
        self.children
    }

    /// Leaf or subdivided.
    pub fn state(&self) -> ChunkState {
        if self.children.is_some() {
            ChunkState::Subdivided
        } else {
            ChunkState::Leaf
        }
    }

    /// Whether this chunk is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Mesh buffers.
    pub fn mesh(&self) -> &ChunkMeshData {
        &self.mesh
    }

    /// Whether the renderer should draw this chunk's own mesh.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether this chunk's collider is active.
    pub fn collider_enabled(&self) -> bool {
        self.collider_enabled
    }

    /// Props scattered on this chunk. Only finest-level chunks have any.
    pub fn decorations(&self) -> &[Placement] {
        &self.decorations
    }

    /// Whether the decoration instances should be shown.
    pub fn decorations_active(&self) -> bool {
        self.decorations_active
    }

    /// Seed the decoration pass was keyed on.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.visible = active;
        self.collider_enabled = active;
        self.decorations_active = active;
    }
}
