//! The boundary to the displacement compute stage.
//!
//! A [`NoiseDisplacementPort`] takes undisplaced sphere vertices and returns
//! their noise-displaced positions plus a biome signal per vertex, and applies
//! localized sculpt brushes. Backends may run on the CPU or on a GPU; callers
//! only see blocking calls.

use glam::DVec3;

use crate::{BiomeSignal, GenerationParams};

/// Failures reported by a displacement backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DisplacementError {
    /// The backend is not initialized or lost its device.
    #[error("displacement backend unavailable: {0}")]
    Unavailable(String),
}

/// Output of [`NoiseDisplacementPort::displace`].
#[derive(Clone, Debug, Default)]
pub struct Displacement {
    /// Displaced positions, one per input vertex.
    pub vertices: Vec<DVec3>,
    /// Biome signal, one per input vertex.
    pub biome: Vec<BiomeSignal>,
}

/// Contract for the terrain displacement backend.
///
/// Implementations must guarantee:
/// - output length equals input length;
/// - every output vertex lies on the ray from the planet center through its input;
/// - the biome signal depends only on the input direction, never on mesh resolution;
/// - no buffers outlive a call.
pub trait NoiseDisplacementPort: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Displace `vertices` radially by layered noise and compute their biome signal.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::Unavailable`] if the backend cannot run.
    fn displace(
        &self,
        vertices: &[DVec3],
        params: &GenerationParams,
    ) -> Result<Displacement, DisplacementError>;

    /// Raise (`signed_strength > 0`) or lower terrain around `brush`.
    ///
    /// Only vertices closer than `radius` to `brush` move, each along its own
    /// direction from the planet center, by `signed_strength * sculpt_falloff(d, radius)`.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::Unavailable`] if the backend cannot run.
    fn sculpt(
        &self,
        vertices: &[DVec3],
        brush: DVec3,
        radius: f64,
        signed_strength: f64,
    ) -> Result<Vec<DVec3>, DisplacementError>;
}

/// Smallest distance from the planet center a displaced or sculpted vertex may have.
pub const MIN_SURFACE_RADIUS: f64 = 1.0e-3;

/// Brush weight at `distance` from the brush center: smoothstep from 1 at the
/// center down to 0 at `radius`, and 0 beyond.
#[inline]
#[must_use]
pub fn sculpt_falloff(distance: f64, radius: f64) -> f64 {
    if radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    let t = (distance / radius).max(0.0);
    1.0 - t * t * (3.0 - 2.0 * t)
}

/// Reference sculpt kernel shared by CPU backends.
#[must_use]
pub fn sculpt_vertices(
    vertices: &[DVec3],
    brush: DVec3,
    radius: f64,
    signed_strength: f64,
) -> Vec<DVec3> {
    vertices
        .iter()
        .map(|&v| {
            let weight = sculpt_falloff(v.distance(brush), radius);
            match v.try_normalize() {
                Some(dir) if weight > 0.0 => {
                    dir * (v.length() + signed_strength * weight).max(MIN_SURFACE_RADIUS)
                }
                _ => v,
            }
        })
        .collect()
}
