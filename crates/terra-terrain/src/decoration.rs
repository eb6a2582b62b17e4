//! Deterministic decoration scattering over a chunk's displaced mesh.
//!
//! Each chunk's scatter is driven by a [`ChaCha8Rng`](rand_chacha::ChaCha8Rng)
//! seeded from the chunk seed, and every random draw happens in a fixed order,
//! so the same chunk always receives the same props in the same order.

use std::f64::consts::TAU;

use glam::{DQuat, DVec3};
use noise::{NoiseFn, Perlin};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{BiomeSignal, chunk_rng};

/// Numeric identifier of a decoration prefab.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropId(pub u32);

/// Where and how one kind of prop may be placed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationRule {
    /// Prefab to instantiate.
    pub prop: PropId,
    /// Prefab name, for logs and asset lookup.
    pub name: String,
    /// Accepted temperature range, inclusive.
    pub temperature: (f64, f64),
    /// Accepted humidity range, inclusive.
    pub humidity: (f64, f64),
    /// Steepest accepted slope, in degrees from the radial up direction.
    pub max_slope_degrees: f64,
    /// Minimum height above the sea surface.
    pub min_altitude: f64,
    /// Uniform scale range `(min, max)`.
    pub scale_range: (f64, f64),
    /// How far the prop is pushed into the ground, per unit of scale.
    pub sink_depth: f64,
    /// Blend of the prop's up vector from radial (0) to the terrain normal (1).
    pub align_to_terrain: f64,
    /// Chance per attempt, or clump coverage when `clump_scale` is set.
    pub spawn_probability: f64,
    /// World-space size of noise clumps. `None` disables clumping.
    pub clump_scale: Option<f64>,
}

impl Default for DecorationRule {
    fn default() -> Self {
        Self {
            prop: PropId(0),
            name: String::new(),
            temperature: (0.0, 1.0),
            humidity: (0.0, 1.0),
            max_slope_degrees: 90.0,
            min_altitude: 0.0,
            scale_range: (1.0, 1.0),
            sink_depth: 0.0,
            align_to_terrain: 0.0,
            spawn_probability: 0.1,
            clump_scale: None,
        }
    }
}

impl DecorationRule {
    fn accepts_climate(&self, signal: BiomeSignal) -> bool {
        (self.temperature.0..=self.temperature.1).contains(&signal.temperature)
            && (self.humidity.0..=self.humidity.1).contains(&signal.humidity)
    }
}

/// One placed prop instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Prefab to instantiate.
    pub prop: PropId,
    /// World-space position.
    pub position: DVec3,
    /// Uniform scale.
    pub scale: f64,
    /// Orientation: local `+Y` maps to `up`, then a random yaw around it.
    pub rotation: DQuat,
    /// Resolved up vector.
    pub up: DVec3,
}

/// Mesh data a scatter pass reads from. Vertices are planet-local.
pub struct ScatterInput<'a> {
    /// Displaced vertex positions.
    pub vertices: &'a [DVec3],
    /// Unit vertex normals, same length as `vertices`.
    pub normals: &'a [DVec3],
    /// Biome signal, same length as `vertices`.
    pub biome: &'a [BiomeSignal],
    /// Seed of the chunk being decorated.
    pub chunk_seed: u64,
    /// Planet origin in world space.
    pub planet_center: DVec3,
    /// Planet noise offset; also shifts the clump field.
    pub seed_offset: DVec3,
    /// Distance from the planet center to the sea surface.
    pub sea_radius: f64,
}

/// Places decoration props on chunk meshes.
pub struct DecorationScatterer {
    rules: Vec<DecorationRule>,
    max_props_per_chunk: u32,
    clump_noise: Perlin,
}

impl DecorationScatterer {
    /// Create a scatterer with rules evaluated in order.
    pub fn new(rules: Vec<DecorationRule>, max_props_per_chunk: u32) -> Self {
        Self {
            rules,
            max_props_per_chunk,
            clump_noise: Perlin::new(0),
        }
    }

    /// The configured rules.
    pub fn rules(&self) -> &[DecorationRule] {
        &self.rules
    }

    /// Number of placement attempts per chunk.
    pub fn max_props_per_chunk(&self) -> u32 {
        self.max_props_per_chunk
    }

    /// Clump field in `[0, 1]` at a world position.
    fn clump_value(&self, world: DVec3, seed_offset: DVec3, scale: f64) -> f64 {
        let x = (world.x + seed_offset.x) / scale;
        let z = (world.z + seed_offset.z) / scale;
        (self.clump_noise.get([x, z]) * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    /// Scatter props over one chunk.
    ///
    /// At most `max_props_per_chunk` props are placed: one attempt per slot,
    /// each picking a random vertex and placing the first rule that accepts it.
    pub fn scatter(&self, input: &ScatterInput<'_>) -> Vec<Placement> {
        let mut placements = Vec::new();
        if input.vertices.is_empty() || self.rules.is_empty() {
            return placements;
        }

        let mut rng = chunk_rng(input.chunk_seed);

        for _ in 0..self.max_props_per_chunk {
            let index = rng.random_range(0..input.vertices.len());
            let local = input.vertices[index];
            let Some(radial) = local.try_normalize() else {
                continue;
            };
            let normal = input
                .normals
                .get(index)
                .and_then(|n| n.try_normalize())
                .unwrap_or(radial);
            let signal = input
                .biome
                .get(index)
                .copied()
                .unwrap_or(BiomeSignal::NEUTRAL);

            let world = input.planet_center + local;
            let altitude = local.length();
            let slope = radial.angle_between(normal).to_degrees();

            for rule in &self.rules {
                let spawn = match rule.clump_scale {
                    Some(scale) if scale > 0.0 => {
                        self.clump_value(world, input.seed_offset, scale)
                            >= 1.0 - rule.spawn_probability
                    }
                    _ => rng.random::<f64>() < rule.spawn_probability,
                };
                if !spawn
                    || !rule.accepts_climate(signal)
                    || slope > rule.max_slope_degrees
                    || altitude < input.sea_radius + rule.min_altitude
                {
                    continue;
                }

                let (min, max) = rule.scale_range;
                let scale = if min < max {
                    rng.random_range(min..max)
                } else {
                    min
                };
                let position = world - normal * (rule.sink_depth * scale);

                let tilt = DQuat::IDENTITY.slerp(
                    DQuat::from_rotation_arc(radial, normal),
                    rule.align_to_terrain.clamp(0.0, 1.0),
                );
                let up = (tilt * radial).normalize();
                let yaw = rng.random_range(0.0..TAU);
                let rotation = DQuat::from_rotation_arc(DVec3::Y, up) * DQuat::from_rotation_y(yaw);

                placements.push(Placement {
                    prop: rule.prop,
                    position,
                    scale,
                    rotation,
                    up,
                });
                break;
            }
        }

        placements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RADIUS: f64 = 100.0;

    struct Patch {
        vertices: Vec<DVec3>,
        normals: Vec<DVec3>,
        biome: Vec<BiomeSignal>,
    }

    fn patch(signal: BiomeSignal) -> Patch {
        let mut vertices = Vec::new();
        for z in -5..=5 {
            for x in -5..=5 {
                let dir = DVec3::new(x as f64, RADIUS, z as f64).normalize();
                vertices.push(dir * RADIUS);
            }
        }
        let normals = vertices.iter().map(|v| v.normalize()).collect();
        let biome = vec![signal; vertices.len()];
        Patch {
            vertices,
            normals,
            biome,
        }
    }

    fn input(patch: &Patch, seed: u64) -> ScatterInput<'_> {
        ScatterInput {
            vertices: &patch.vertices,
            normals: &patch.normals,
            biome: &patch.biome,
            chunk_seed: seed,
            planet_center: DVec3::ZERO,
            seed_offset: DVec3::ZERO,
            sea_radius: RADIUS - 10.0,
        }
    }

    fn always(prop: u32) -> DecorationRule {
        DecorationRule {
            prop: PropId(prop),
            spawn_probability: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_scatter_is_deterministic() {
        let rule = DecorationRule {
            spawn_probability: 0.5,
            scale_range: (0.5, 2.0),
            align_to_terrain: 0.5,
            ..always(3)
        };
        let scatterer = DecorationScatterer::new(vec![rule], 30);
        let p = patch(BiomeSignal::NEUTRAL);
        let a = scatterer.scatter(&input(&p, 1234));
        let b = scatterer.scatter(&input(&p, 1234));
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_give_different_scatter() {
        let scatterer = DecorationScatterer::new(vec![always(1)], 20);
        let p = patch(BiomeSignal::NEUTRAL);
        let a = scatterer.scatter(&input(&p, 1));
        let b = scatterer.scatter(&input(&p, 2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_attempt_budget_bounds_placements() {
        let scatterer = DecorationScatterer::new(vec![always(1)], 12);
        let p = patch(BiomeSignal::NEUTRAL);
        assert_eq!(scatterer.scatter(&input(&p, 9)).len(), 12);
    }

    #[test]
    fn test_empty_mesh_or_rules_places_nothing() {
        let empty = Patch {
            vertices: Vec::new(),
            normals: Vec::new(),
            biome: Vec::new(),
        };
        let scatterer = DecorationScatterer::new(vec![always(1)], 10);
        assert!(scatterer.scatter(&input(&empty, 0)).is_empty());

        let no_rules = DecorationScatterer::new(Vec::new(), 10);
        assert!(no_rules.scatter(&input(&patch(BiomeSignal::NEUTRAL), 0)).is_empty());
    }

    #[test]
    fn test_climate_window_rejects() {
        let rule = DecorationRule {
            temperature: (0.9, 1.0),
            ..always(1)
        };
        let scatterer = DecorationScatterer::new(vec![rule], 25);
        let p = patch(BiomeSignal::NEUTRAL);
        assert!(scatterer.scatter(&input(&p, 5)).is_empty());
    }

    #[test]
    fn test_slope_rejects() {
        let rule = DecorationRule {
            max_slope_degrees: 30.0,
            ..always(1)
        };
        let scatterer = DecorationScatterer::new(vec![rule], 25);
        let mut p = patch(BiomeSignal::NEUTRAL);
        // Normals tangent to the surface: a 90 degree slope everywhere.
        p.normals = p
            .vertices
            .iter()
            .map(|v| v.normalize().cross(DVec3::X).normalize())
            .collect();
        assert!(scatterer.scatter(&input(&p, 5)).is_empty());
    }

    #[test]
    fn test_altitude_above_sea_required() {
        let p = patch(BiomeSignal::NEUTRAL);
        let high = DecorationRule {
            min_altitude: 20.0,
            ..always(1)
        };
        assert!(
            DecorationScatterer::new(vec![high], 25)
                .scatter(&input(&p, 5))
                .is_empty()
        );
        let low = DecorationRule {
            min_altitude: 5.0,
            ..always(1)
        };
        assert_eq!(
            DecorationScatterer::new(vec![low], 25)
                .scatter(&input(&p, 5))
                .len(),
            25
        );
    }

    #[test]
    fn test_first_accepting_rule_wins() {
        let scatterer = DecorationScatterer::new(vec![always(7), always(8)], 15);
        let p = patch(BiomeSignal::NEUTRAL);
        let placements = scatterer.scatter(&input(&p, 3));
        assert_eq!(placements.len(), 15);
        assert!(placements.iter().all(|pl| pl.prop == PropId(7)));
    }

    #[test]
    fn test_rejected_rule_falls_through() {
        let cold = DecorationRule {
            temperature: (0.0, 0.1),
            ..always(1)
        };
        let scatterer = DecorationScatterer::new(vec![cold, always(2)], 10);
        let p = patch(BiomeSignal::NEUTRAL);
        let placements = scatterer.scatter(&input(&p, 3));
        assert_eq!(placements.len(), 10);
        assert!(placements.iter().all(|pl| pl.prop == PropId(2)));
    }

    #[test]
    fn test_sink_and_orientation() {
        let rule = DecorationRule {
            scale_range: (2.0, 2.0),
            sink_depth: 0.5,
            ..always(1)
        };
        let scatterer = DecorationScatterer::new(vec![rule], 10);
        let p = patch(BiomeSignal::NEUTRAL);
        for placement in scatterer.scatter(&input(&p, 11)) {
            assert_eq!(placement.scale, 2.0);
            let radial = placement.up;
            // Surface point is one unit (0.5 * 2.0) further out along the normal.
            let surface = placement.position + radial;
            assert!((surface.length() - RADIUS).abs() < 1e-9);
            assert!((placement.rotation * DVec3::Y - placement.up).length() < 1e-9);
        }
    }

    #[test]
    fn test_align_to_terrain_blends_up_vector() {
        let mut p = patch(BiomeSignal::NEUTRAL);
        let tilted: Vec<DVec3> = p
            .vertices
            .iter()
            .map(|v| (v.normalize() + DVec3::X * 0.3).normalize())
            .collect();
        p.normals = tilted;

        let upright = DecorationScatterer::new(vec![always(1)], 8).scatter(&input(&p, 4));
        let aligned = DecorationScatterer::new(
            vec![DecorationRule {
                align_to_terrain: 1.0,
                ..always(1)
            }],
            8,
        )
        .scatter(&input(&p, 4));

        for (a, b) in upright.iter().zip(&aligned) {
            assert_eq!(a.position, b.position);
            let radial = a.position.normalize();
            assert!((a.up - radial).length() < 1e-9);
            let normal = (radial + DVec3::X * 0.3).normalize();
            assert!((b.up - normal).length() < 1e-9);
        }
    }

    #[test]
    fn test_clumping_with_full_coverage_places_everywhere() {
        let rule = DecorationRule {
            clump_scale: Some(25.0),
            ..always(4)
        };
        let scatterer = DecorationScatterer::new(vec![rule], 10);
        let p = patch(BiomeSignal::NEUTRAL);
        assert_eq!(scatterer.scatter(&input(&p, 2)).len(), 10);
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let rule: DecorationRule =
            ron::from_str("(prop: PropId(5), name: \"pine\", spawn_probability: 0.3)").unwrap();
        assert_eq!(rule.prop, PropId(5));
        assert_eq!(rule.name, "pine");
        assert_eq!(rule.max_slope_degrees, 90.0);
        assert_eq!(rule.clump_scale, None);
    }
}
