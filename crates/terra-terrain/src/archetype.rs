//! Planet archetypes: named bundles of generation parameters.

use serde::{Deserialize, Serialize};

/// A terrain preset applied wholesale to a planet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Continents and oceans in roughly equal measure.
    #[default]
    Terrestrial,
    /// Mostly water with scattered archipelagos.
    Oceanic,
    /// Dry, low relief with ridged dune fields.
    Desert,
    /// Cold, terraced highlands and frozen seas.
    Icy,
}

/// Parameters an [`Archetype`] overrides on the planet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArchetypePreset {
    /// Base sphere radius.
    pub radius: f64,
    /// Height scale applied to normalized noise.
    pub height_multiplier: f64,
    /// Normalized sea level in `[-1, 1]`.
    pub sea_level: f64,
    /// Frequency of the base noise octave over the unit sphere.
    pub noise_scale: f64,
    /// Atmosphere shell radius as a multiple of the planet radius, for the renderer.
    pub atmosphere_scale: f64,
}

impl Archetype {
    /// All archetypes in declaration order.
    pub const ALL: [Archetype; 4] = [
        Archetype::Terrestrial,
        Archetype::Oceanic,
        Archetype::Desert,
        Archetype::Icy,
    ];

    /// The parameter bundle for this archetype.
    #[must_use]
    pub fn preset(self) -> ArchetypePreset {
        match self {
            Archetype::Terrestrial => ArchetypePreset {
                radius: 1000.0,
                height_multiplier: 40.0,
                sea_level: 0.0,
                noise_scale: 2.0,
                atmosphere_scale: 1.025,
            },
            Archetype::Oceanic => ArchetypePreset {
                radius: 1000.0,
                height_multiplier: 25.0,
                sea_level: 0.4,
                noise_scale: 2.0,
                atmosphere_scale: 1.03,
            },
            Archetype::Desert => ArchetypePreset {
                radius: 900.0,
                height_multiplier: 15.0,
                sea_level: -0.65,
                noise_scale: 4.0,
                atmosphere_scale: 1.015,
            },
            Archetype::Icy => ArchetypePreset {
                radius: 800.0,
                height_multiplier: 30.0,
                sea_level: -0.2,
                noise_scale: 2.5,
                atmosphere_scale: 1.01,
            },
        }
    }

    /// Stable numeric id passed to compute kernels.
    #[must_use]
    pub fn id(self) -> u32 {
        match self {
            Archetype::Terrestrial => 0,
            Archetype::Oceanic => 1,
            Archetype::Desert => 2,
            Archetype::Icy => 3,
        }
    }

    /// Reshape a normalized noise height in `[-1, 1]`.
    ///
    /// Desert folds the field into ridges; icy worlds are partly terraced.
    #[must_use]
    pub fn shape(self, h: f64) -> f64 {
        match self {
            Archetype::Terrestrial | Archetype::Oceanic => h,
            Archetype::Desert => 1.0 - 2.0 * h.abs(),
            Archetype::Icy => (h * 4.0).round_ties_even() * 0.25 * 0.6 + h * 0.4,
        }
    }

    /// Additive shift of the temperature channel of the biome signal.
    #[must_use]
    pub fn temperature_bias(self) -> f64 {
        match self {
            Archetype::Terrestrial => 0.0,
            Archetype::Oceanic => 0.05,
            Archetype::Desert => 0.3,
            Archetype::Icy => -0.35,
        }
    }

    /// Additive shift of the humidity channel of the biome signal.
    #[must_use]
    pub fn humidity_bias(self) -> f64 {
        match self {
            Archetype::Terrestrial => 0.0,
            Archetype::Oceanic => 0.25,
            Archetype::Desert => -0.35,
            Archetype::Icy => -0.1,
        }
    }
}
