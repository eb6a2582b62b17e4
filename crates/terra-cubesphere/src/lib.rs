//! Cube-sphere geometry: face bases, quadtree footprints, projection, and chunk mesh building.

mod chunk_mesh;
mod cube_face;
mod footprint;
mod projection;

pub use chunk_mesh::{
    ChunkMesh, ChunkMeshBuilder, MAX_RESOLUTION, MIN_RESOLUTION, MeshError, compute_normals,
    index_count, vertex_count,
};
pub use cube_face::CubeFace;
pub use footprint::Footprint;
pub use projection::{
    direction_to_face, direction_to_face_uv, face_uv_to_cube_point, face_uv_to_sphere,
};
