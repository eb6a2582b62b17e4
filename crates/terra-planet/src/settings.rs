//! Validated planet settings.

use glam::DVec3;
use terra_config::PlanetConfig;
use terra_cubesphere::ChunkMeshBuilder;
use terra_terrain::{Archetype, ArchetypePreset, GenerationParams};

use crate::ConfigurationError;

/// Deepest supported quadtree level.
pub const MAX_LOD_LIMIT: u8 = 24;

/// Everything a [`PlanetSurface`](crate::PlanetSurface) is built from.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanetSettings {
    /// Planet origin in world space.
    pub center: DVec3,
    /// Vertices per chunk edge.
    pub resolution: u32,
    /// Deepest quadtree level.
    pub max_lod: u8,
    /// Subdivision threshold per depth; `max_lod + 1` entries, non-increasing.
    pub detail_distances: Vec<f64>,
    /// Parameters handed to the displacement backend.
    pub generation: GenerationParams,
    /// Decoration placement attempts per finest-level chunk.
    pub max_props_per_chunk: u32,
    /// Atmosphere shell radius as a multiple of the planet radius.
    pub atmosphere_scale: f64,
}

impl Default for PlanetSettings {
    fn default() -> Self {
        Self {
            center: DVec3::ZERO,
            resolution: 17,
            max_lod: 3,
            detail_distances: vec![2000.0, 1000.0, 400.0, 100.0],
            generation: GenerationParams::default(),
            max_props_per_chunk: 24,
            atmosphere_scale: Archetype::Terrestrial.preset().atmosphere_scale,
        }
    }
}

impl PlanetSettings {
    /// Convert persisted configuration and validate it.
    ///
    /// When `use_archetype_preset` is set the archetype's radius, height
    /// multiplier, sea level and noise scale replace the configured values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the result fails [`validate`](Self::validate).
    pub fn from_config(config: &PlanetConfig) -> Result<Self, ConfigurationError> {
        let mut settings = Self {
            center: DVec3::from_array(config.center),
            resolution: config.resolution,
            max_lod: config.max_lod,
            detail_distances: config.detail_distances.clone(),
            generation: GenerationParams {
                radius: config.radius,
                noise_scale: config.noise_scale,
                octaves: config.octaves,
                persistence: config.persistence,
                lacunarity: config.lacunarity,
                height_multiplier: config.height_multiplier,
                sea_level: config.sea_level,
                seed_offset: DVec3::from_array(config.seed_offset),
                archetype: config.archetype,
            },
            max_props_per_chunk: config.max_props_per_chunk,
            atmosphere_scale: config.archetype.preset().atmosphere_scale,
        };
        if config.use_archetype_preset {
            settings.apply_archetype(config.archetype);
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Overwrite the preset-controlled parameters with `archetype`'s values.
    pub fn apply_archetype(&mut self, archetype: Archetype) -> ArchetypePreset {
        let preset = self.generation.apply_archetype(archetype);
        self.atmosphere_scale = preset.atmosphere_scale;
        preset
    }

    /// Check every invariant the planet relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        ChunkMeshBuilder::new(self.resolution, self.generation.radius)?;

        if self.max_lod > MAX_LOD_LIMIT {
            return Err(ConfigurationError::MaxLod {
                value: self.max_lod,
                max: MAX_LOD_LIMIT,
            });
        }

        let expected = self.max_lod as usize + 1;
        if self.detail_distances.len() != expected {
            return Err(ConfigurationError::DetailDistanceCount {
                expected,
                actual: self.detail_distances.len(),
            });
        }
        for (index, &value) in self.detail_distances.iter().enumerate() {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigurationError::DetailDistance { index, value });
            }
            if index > 0 && value > self.detail_distances[index - 1] {
                return Err(ConfigurationError::NotDescending { index });
            }
        }

        let g = &self.generation;
        if !(1..=8).contains(&g.octaves) {
            return Err(ConfigurationError::Octaves(g.octaves));
        }
        if !(0.0..=1.0).contains(&g.persistence) {
            return Err(ConfigurationError::Persistence(g.persistence));
        }
        if !(-1.0..=1.0).contains(&g.sea_level) {
            return Err(ConfigurationError::SeaLevel(g.sea_level));
        }
        if !(g.noise_scale > 0.0 && g.noise_scale.is_finite()) {
            return Err(ConfigurationError::Noise {
                name: "noise_scale",
                value: g.noise_scale,
            });
        }
        if !g.lacunarity.is_finite() {
            return Err(ConfigurationError::Noise {
                name: "lacunarity",
                value: g.lacunarity,
            });
        }
        if !g.height_multiplier.is_finite() {
            return Err(ConfigurationError::Noise {
                name: "height_multiplier",
                value: g.height_multiplier,
            });
        }
        // Shaped heights and the sea level both lie in [-1, 1].
        if g.radius - g.height_multiplier.abs() <= 0.0 {
            return Err(ConfigurationError::SurfaceThroughCenter {
                radius: g.radius,
                height_multiplier: g.height_multiplier,
            });
        }
        if !g.seed_offset.is_finite() {
            return Err(ConfigurationError::NonFinite("seed_offset"));
        }
        if !self.center.is_finite() {
            return Err(ConfigurationError::NonFinite("center"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use terra_cubesphere::MeshError;

    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(PlanetSettings::default().validate(), Ok(()));
    }

    #[test]
    fn test_distance_count_must_match_max_lod() {
        let settings = PlanetSettings {
            max_lod: 4,
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigurationError::DetailDistanceCount {
                expected: 5,
                actual: 4
            })
        );
    }

    #[test]
    fn test_distances_must_not_increase() {
        let settings = PlanetSettings {
            detail_distances: vec![2000.0, 1000.0, 1200.0, 100.0],
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigurationError::NotDescending { index: 2 })
        );
    }

    #[test]
    fn test_equal_distances_allowed() {
        let settings = PlanetSettings {
            detail_distances: vec![500.0, 500.0, 500.0, 500.0],
            ..Default::default()
        };
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn test_distances_must_be_positive() {
        let settings = PlanetSettings {
            detail_distances: vec![2000.0, 1000.0, 0.0, 0.0],
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigurationError::DetailDistance { index: 2, .. })
        ));
    }

    #[test]
    fn test_resolution_and_radius_checked_by_mesh_builder() {
        let settings = PlanetSettings {
            resolution: 1,
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigurationError::Mesh(MeshError::Resolution(1)))
        );

        let mut settings = PlanetSettings::default();
        settings.generation.radius = -5.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigurationError::Mesh(MeshError::Radius(_)))
        ));
    }

    #[test]
    fn test_noise_ranges() {
        let mut settings = PlanetSettings::default();
        settings.generation.octaves = 9;
        assert_eq!(settings.validate(), Err(ConfigurationError::Octaves(9)));

        let mut settings = PlanetSettings::default();
        settings.generation.persistence = 1.5;
        assert_eq!(
            settings.validate(),
            Err(ConfigurationError::Persistence(1.5))
        );

        let mut settings = PlanetSettings::default();
        settings.generation.sea_level = -1.2;
        assert_eq!(settings.validate(), Err(ConfigurationError::SeaLevel(-1.2)));
    }

    #[test]
    fn test_terrain_cannot_reach_center() {
        for height_multiplier in [40.0, -40.0, 10.0] {
            let mut settings = PlanetSettings::default();
            settings.generation.radius = 10.0;
            settings.generation.height_multiplier = height_multiplier;
            settings.generation.sea_level = -1.0;
            assert_eq!(
                settings.validate(),
                Err(ConfigurationError::SurfaceThroughCenter {
                    radius: 10.0,
                    height_multiplier
                })
            );
        }

        let mut settings = PlanetSettings::default();
        settings.generation.radius = 10.0;
        settings.generation.height_multiplier = 9.5;
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn test_from_config_applies_preset() {
        let config = PlanetConfig {
            archetype: Archetype::Desert,
            use_archetype_preset: true,
            ..Default::default()
        };
        let settings = PlanetSettings::from_config(&config).unwrap();
        let preset = Archetype::Desert.preset();
        assert_eq!(settings.generation.radius, preset.radius);
        assert_eq!(settings.generation.sea_level, preset.sea_level);
        assert_eq!(settings.atmosphere_scale, preset.atmosphere_scale);
        assert_eq!(settings.max_lod, config.max_lod);
    }

    #[test]
    fn test_from_config_without_preset_keeps_values() {
        let config = PlanetConfig {
            archetype: Archetype::Icy,
            use_archetype_preset: false,
            radius: 321.0,
            seed_offset: [1.0, 2.0, 3.0],
            center: [10.0, 0.0, 0.0],
            ..Default::default()
        };
        let settings = PlanetSettings::from_config(&config).unwrap();
        assert_eq!(settings.generation.radius, 321.0);
        assert_eq!(settings.generation.archetype, Archetype::Icy);
        assert_eq!(settings.generation.seed_offset, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(settings.center, DVec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = PlanetConfig {
            max_lod: 2,
            ..Default::default()
        };
        assert!(matches!(
            PlanetSettings::from_config(&config),
            Err(ConfigurationError::DetailDistanceCount { .. })
        ));
    }
}
