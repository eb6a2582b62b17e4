//! Regular grid meshes for one quadtree chunk, projected onto the sphere.
//!
//! A chunk mesh is a `resolution × resolution` vertex grid laid over the
//! chunk's [`Footprint`] on its [`CubeFace`], mapped onto the unit cube and
//! then pushed out to the planet radius by normalization.

use std::sync::Arc;

use glam::{DVec2, DVec3};

use crate::{CubeFace, Footprint, face_uv_to_cube_point};

/// Smallest grid side length that still forms a quad.
pub const MIN_RESOLUTION: u32 = 2;
/// Largest supported grid side length.
pub const MAX_RESOLUTION: u32 = 256;

/// Errors raised when configuring a [`ChunkMeshBuilder`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    /// Grid resolution outside `[MIN_RESOLUTION, MAX_RESOLUTION]`.
    #[error("chunk resolution must be in [{MIN_RESOLUTION}, {MAX_RESOLUTION}], got {0}")]
    Resolution(u32),
    /// Planet radius is zero, negative, or not finite.
    #[error("planet radius must be positive and finite, got {0}")]
    Radius(f64),
}

/// Number of vertices in a chunk mesh of the given resolution.
#[inline]
#[must_use]
pub fn vertex_count(resolution: u32) -> usize {
    (resolution as usize).pow(2)
}

/// Number of triangle indices in a chunk mesh of the given resolution.
#[inline]
#[must_use]
pub fn index_count(resolution: u32) -> usize {
    6 * (resolution as usize).saturating_sub(1).pow(2)
}

/// Vertex grid and triangle list for one chunk, in planet-local space.
#[derive(Clone, Debug)]
pub struct ChunkMesh {
    /// Vertex positions, row-major (`y` outer, `x` inner).
    pub vertices: Vec<DVec3>,
    /// Triangle list. Shared between every mesh of the same resolution.
    pub indices: Arc<[u32]>,
    /// Grid side length.
    pub resolution: u32,
}

impl ChunkMesh {
    /// Vertex positions narrowed to `f32` for GPU upload.
    #[must_use]
    pub fn positions_f32(&self) -> Vec<[f32; 3]> {
        self.vertices
            .iter()
            .map(|v| [v.x as f32, v.y as f32, v.z as f32])
            .collect()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Builds [`ChunkMesh`]es of a fixed resolution and radius.
///
/// The builder is pure: the same face and footprint always produce the same mesh.
#[derive(Clone, Debug)]
pub struct ChunkMeshBuilder {
    resolution: u32,
    radius: f64,
    indices: Arc<[u32]>,
}

impl ChunkMeshBuilder {
    /// Create a builder.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError`] if the resolution is out of range or the radius
    /// is not positive and finite.
    pub fn new(resolution: u32, radius: f64) -> Result<Self, MeshError> {
        if !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&resolution) {
            return Err(MeshError::Resolution(resolution));
        }
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(MeshError::Radius(radius));
        }
        Ok(Self {
            resolution,
            radius,
            indices: grid_indices(resolution).into(),
        })
    }

    /// Grid side length.
    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Planet radius the vertices are projected to.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Build the undisplaced mesh for `footprint` on `face`.
    #[must_use]
    pub fn build(&self, face: CubeFace, footprint: &Footprint) -> ChunkMesh {
        let res = self.resolution;
        let step = 1.0 / (res - 1) as f64;
        let mut vertices = Vec::with_capacity(vertex_count(res));

        for y in 0..res {
            for x in 0..res {
                let percent = DVec2::new(x as f64 * step, y as f64 * step);
                let uv = footprint.uv_at(percent);
                let cube_point = face_uv_to_cube_point(face, uv);
                vertices.push(cube_point.normalize() * self.radius);
            }
        }

        ChunkMesh {
            vertices,
            indices: Arc::clone(&self.indices),
            resolution: res,
        }
    }
}

/// Two triangles per grid quad with the winding
/// `(i, i+res+1, i+res)`, `(i, i+1, i+res+1)`.
fn grid_indices(resolution: u32) -> Vec<u32> {
    let res = resolution;
    let mut indices = Vec::with_capacity(index_count(res));
    for y in 0..res - 1 {
        for x in 0..res - 1 {
            let i = y * res + x;
            indices.extend_from_slice(&[i, i + res + 1, i + res, i, i + 1, i + res + 1]);
        }
    }
    indices
}

/// Area-weighted smooth vertex normals for an indexed triangle list.
///
/// Vertices that end up with a degenerate normal fall back to their radial
/// direction from the origin.
#[must_use]
pub fn compute_normals(vertices: &[DVec3], indices: &[u32]) -> Vec<DVec3> {
    let mut normals = vec![DVec3::ZERO; vertices.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        // Unnormalized cross product weights each face by its area.
        let face_normal = (vertices[b] - vertices[a]).cross(vertices[c] - vertices[a]);
        normals[a] += face_normal;
        normals[b] += face_normal;
        normals[c] += face_normal;
    }
    normals
        .iter()
        .zip(vertices)
        .map(|(n, v)| n.try_normalize().unwrap_or_else(|| v.normalize_or_zero()))
        .collect()
}
