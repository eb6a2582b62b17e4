//! The adaptive planet surface: six per-face chunk quadtrees refined around a
//! moving viewer, fed by a noise displacement backend and decorated by a
//! deterministic scatterer.

mod arena;
mod chunk;
mod error;
mod event;
mod generator;
mod settings;
mod surface;
mod tree;

pub use arena::{ChunkArena, ChunkId};
pub use chunk::{ChunkMeshData, ChunkState, TerrainChunk};
pub use error::{ConfigurationError, LodError};
pub use event::{ChunkEvent, TickStats};
pub use settings::{MAX_LOD_LIMIT, PlanetSettings};
pub use surface::{EditOutcome, PlanetSurface};
pub use tree::ChunkTree;
