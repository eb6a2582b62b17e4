//! Per-planet generation parameters shared with the displacement backends.

use glam::DVec3;

use crate::{Archetype, ArchetypePreset};

/// Everything a displacement backend needs to shape a planet.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationParams {
    /// Base sphere radius.
    pub radius: f64,
    /// Frequency of the first noise octave over the unit sphere.
    pub noise_scale: f64,
    /// Number of noise octaves, `1..=8`.
    pub octaves: u32,
    /// Amplitude multiplier between successive octaves, `[0, 1]`.
    pub persistence: f64,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// World units per unit of normalized height.
    pub height_multiplier: f64,
    /// Normalized sea level in `[-1, 1]`. Terrain never sinks below it.
    pub sea_level: f64,
    /// Translation of the noise domain; acts as the planet's seed.
    pub seed_offset: DVec3,
    /// Terrain preset shaping the height and biome fields.
    pub archetype: Archetype,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            radius: 1000.0,
            noise_scale: 2.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            height_multiplier: 40.0,
            sea_level: 0.0,
            seed_offset: DVec3::ZERO,
            archetype: Archetype::Terrestrial,
        }
    }
}

impl GenerationParams {
    /// Distance from the planet center to the sea surface.
    #[must_use]
    pub fn sea_radius(&self) -> f64 {
        self.radius + self.sea_level * self.height_multiplier
    }

    /// Upper bound on the displaced radius of any vertex.
    #[must_use]
    pub fn max_radius(&self) -> f64 {
        self.radius + self.height_multiplier.abs()
    }

    /// Overwrite the preset-controlled fields with `archetype`'s values.
    pub fn apply_archetype(&mut self, archetype: Archetype) -> ArchetypePreset {
        let preset = archetype.preset();
        self.archetype = archetype;
        self.radius = preset.radius;
        self.height_multiplier = preset.height_multiplier;
        self.sea_level = preset.sea_level;
        self.noise_scale = preset.noise_scale;
        preset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sea_radius() {
        let params = GenerationParams {
            radius: 100.0,
            height_multiplier: 10.0,
            sea_level: -0.5,
            ..Default::default()
        };
        assert_eq!(params.sea_radius(), 95.0);
        assert_eq!(params.max_radius(), 110.0);
    }

    #[test]
    fn test_apply_archetype_overwrites_preset_fields_only() {
        let mut params = GenerationParams {
            octaves: 7,
            seed_offset: DVec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let preset = params.apply_archetype(Archetype::Desert);
        assert_eq!(params.archetype, Archetype::Desert);
        assert_eq!(params.radius, preset.radius);
        assert_eq!(params.sea_level, preset.sea_level);
        assert_eq!(params.noise_scale, preset.noise_scale);
        assert_eq!(params.octaves, 7);
        assert_eq!(params.seed_offset, DVec3::new(1.0, 2.0, 3.0));
    }
}
