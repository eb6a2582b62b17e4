//! Procedural terrain: noise displacement backends, archetype presets, biome
//! signal classification, per-chunk seeds, and decoration scattering.

mod archetype;
mod biome;
mod cpu;
mod decoration;
mod displacement;
#[cfg(feature = "gpu")]
mod gpu;
mod params;
mod seed;

pub use archetype::{Archetype, ArchetypePreset};
pub use biome::{BiomeDef, BiomeId, BiomeRegion, BiomeSignal, BiomeTable};
pub use cpu::CpuDisplacement;
pub use decoration::{DecorationRule, DecorationScatterer, Placement, PropId, ScatterInput};
pub use displacement::{
    Displacement, DisplacementError, MIN_SURFACE_RADIUS, NoiseDisplacementPort, sculpt_falloff,
    sculpt_vertices,
};
#[cfg(feature = "gpu")]
pub use gpu::GpuDisplacement;
pub use params::GenerationParams;
pub use seed::{chunk_rng, chunk_seed};
