//! Planet error types.

use terra_cubesphere::MeshError;

use crate::ChunkId;

/// Invalid planet settings. Fatal at construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// `detail_distances` must have one entry per depth, `max_lod + 1` in total.
    #[error("expected {expected} detail distances (max_lod + 1), got {actual}")]
    DetailDistanceCount {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// A detail distance is zero, negative, or not finite.
    #[error("detail distance {index} must be positive and finite, got {value}")]
    DetailDistance {
        /// Offending index.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// `detail_distances[index]` is larger than its predecessor.
    #[error("detail distances must not increase with depth (index {index})")]
    NotDescending {
        /// First index that exceeds its predecessor.
        index: usize,
    },

    /// `max_lod` beyond the supported depth.
    #[error("max_lod must be at most {max}, got {value}")]
    MaxLod {
        /// Supplied value.
        value: u8,
        /// Supported maximum.
        max: u8,
    },

    /// Octave count outside `1..=8`.
    #[error("octaves must be in [1, 8], got {0}")]
    Octaves(u32),

    /// Persistence outside `[0, 1]`.
    #[error("persistence must be in [0, 1], got {0}")]
    Persistence(f64),

    /// Sea level outside `[-1, 1]`.
    #[error("sea level must be in [-1, 1], got {0}")]
    SeaLevel(f64),

    /// Noise scale, lacunarity or height multiplier not finite, or noise scale not positive.
    #[error("noise parameter `{name}` is invalid: {value}")]
    Noise {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Planet center or seed offset not finite.
    #[error("`{0}` must be finite")]
    NonFinite(&'static str),

    /// The lowest possible terrain would sit at or below the planet center.
    #[error("radius {radius} must exceed |height_multiplier| {height_multiplier}")]
    SurfaceThroughCenter {
        /// Base sphere radius.
        radius: f64,
        /// Configured height multiplier.
        height_multiplier: f64,
    },

    /// Mesh resolution or radius rejected by the mesh builder.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Errors from explicit quadtree operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LodError {
    /// Subdividing would create chunks deeper than `max_lod`.
    #[error("cannot subdivide chunk at depth {depth}: max_lod is {max}")]
    DepthExceeded {
        /// Depth of the chunk.
        depth: u8,
        /// Configured maximum depth.
        max: u8,
    },

    /// The handle does not refer to a live chunk.
    #[error("unknown chunk {0}")]
    UnknownChunk(ChunkId),
}
