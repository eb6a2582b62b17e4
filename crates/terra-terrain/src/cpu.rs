//! CPU displacement backend built on the `noise` crate.

use glam::DVec3;
use noise::{NoiseFn, Simplex};

use crate::{
    BiomeSignal, Displacement, DisplacementError, GenerationParams, MIN_SURFACE_RADIUS,
    NoiseDisplacementPort, sculpt_vertices,
};

/// Batches smaller than this are displaced on the calling thread.
const PARALLEL_THRESHOLD: usize = 4096;

/// Frequency of the temperature perturbation over the unit sphere.
const TEMPERATURE_FREQUENCY: f64 = 1.5;
/// Frequency of the humidity field over the unit sphere.
const HUMIDITY_FREQUENCY: f64 = 2.5;

/// Displaces vertices with multi-octave simplex noise on the CPU.
///
/// Large batches are split across scoped worker threads. Every vertex is
/// computed independently, so the result does not depend on the split.
pub struct CpuDisplacement {
    height: Simplex,
    temperature: Simplex,
    humidity: Simplex,
    workers: usize,
}

impl CpuDisplacement {
    /// Backend with noise seed 0 and one worker per logical CPU.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Backend with the given noise permutation seed.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            height: Simplex::new(seed),
            temperature: Simplex::new(seed.wrapping_add(0xDEAD_BEEF)),
            humidity: Simplex::new(seed.wrapping_add(0x5EED_CAFE)),
            workers: 0,
        }
    }

    /// Limit the number of worker threads. `0` means one per logical CPU.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }

    /// Normalized fBm in `[-1, 1]` at a point on the unit sphere.
    fn fbm(&self, dir: DVec3, params: &GenerationParams) -> f64 {
        let base = dir * params.noise_scale + params.seed_offset;
        let mut total = 0.0;
        let mut norm = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;

        for _ in 0..params.octaves.max(1) {
            let p = base * frequency;
            total += self.height.get([p.x, p.y, p.z]) * amplitude;
            norm += amplitude;
            frequency *= params.lacunarity;
            amplitude *= params.persistence;
        }

        (total / norm).clamp(-1.0, 1.0)
    }

    fn biome(&self, dir: DVec3, params: &GenerationParams) -> BiomeSignal {
        let archetype = params.archetype;

        let tp = dir * TEMPERATURE_FREQUENCY + params.seed_offset + DVec3::splat(17.0);
        let t = self.temperature.get([tp.x, tp.y, tp.z]).clamp(-1.0, 1.0);
        let temperature =
            (1.0 - dir.y.abs()) * 0.8 + 0.2 * (t * 0.5 + 0.5) + archetype.temperature_bias();

        let hp = dir * HUMIDITY_FREQUENCY + params.seed_offset - DVec3::splat(41.0);
        let m = self.humidity.get([hp.x, hp.y, hp.z]).clamp(-1.0, 1.0);
        let humidity = 0.5 + 0.5 * m + archetype.humidity_bias();

        BiomeSignal::new(temperature, humidity)
    }

    fn displace_slice(
        &self,
        input: &[DVec3],
        vertices: &mut [DVec3],
        biome: &mut [BiomeSignal],
        params: &GenerationParams,
    ) {
        for ((v, out_v), out_b) in input.iter().zip(vertices).zip(biome) {
            let Some(dir) = v.try_normalize() else {
                *out_v = *v;
                *out_b = BiomeSignal::NEUTRAL;
                continue;
            };
            let h = params.archetype.shape(self.fbm(dir, params));
            let elevation = h.max(params.sea_level) * params.height_multiplier;
            *out_v = dir * (params.radius + elevation).max(MIN_SURFACE_RADIUS);
            *out_b = self.biome(dir, params);
        }
    }
}

impl Default for CpuDisplacement {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseDisplacementPort for CpuDisplacement {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn displace(
        &self,
        input: &[DVec3],
        params: &GenerationParams,
    ) -> Result<Displacement, DisplacementError> {
        let mut vertices = vec![DVec3::ZERO; input.len()];
        let mut biome = vec![BiomeSignal::NEUTRAL; input.len()];

        let workers = self.worker_count();
        if input.len() < PARALLEL_THRESHOLD || workers == 1 {
            self.displace_slice(input, &mut vertices, &mut biome, params);
        } else {
            let batch = input.len().div_ceil(workers);
            log::debug!(
                "Displacing {} vertices on {} workers ({batch} per batch)",
                input.len(),
                input.len().div_ceil(batch)
            );
            std::thread::scope(|scope| {
                for ((src, dst_v), dst_b) in input
                    .chunks(batch)
                    .zip(vertices.chunks_mut(batch))
                    .zip(biome.chunks_mut(batch))
                {
                    scope.spawn(move || self.displace_slice(src, dst_v, dst_b, params));
                }
            });
        }

        Ok(Displacement { vertices, biome })
    }

    fn sculpt(
        &self,
        vertices: &[DVec3],
        brush: DVec3,
        radius: f64,
        signed_strength: f64,
    ) -> Result<Vec<DVec3>, DisplacementError> {
        Ok(sculpt_vertices(vertices, brush, radius, signed_strength))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Archetype;

    fn sphere_points(n: usize, radius: f64) -> Vec<DVec3> {
        // Fibonacci lattice.
        let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
        (0..n)
            .map(|i| {
                let y = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
                let r = (1.0 - y * y).sqrt();
                let theta = golden * i as f64;
                DVec3::new(theta.cos() * r, y, theta.sin() * r) * radius
            })
            .collect()
    }

    #[test]
    fn test_output_length_matches_input() {
        let port = CpuDisplacement::new();
        let params = GenerationParams::default();
        for n in [0, 1, 17, 300] {
            let out = port.displace(&sphere_points(n, 1000.0), &params).unwrap();
            assert_eq!(out.vertices.len(), n);
            assert_eq!(out.biome.len(), n);
        }
    }

    #[test]
    fn test_displacement_is_radial() {
        let port = CpuDisplacement::new();
        let params = GenerationParams::default();
        let input = sphere_points(500, 1000.0);
        let out = port.displace(&input, &params).unwrap();
        for (a, b) in input.iter().zip(&out.vertices) {
            assert!(a.normalize().distance(b.normalize()) < 1e-9);
        }
    }

    #[test]
    fn test_heights_within_sea_and_peak() {
        let port = CpuDisplacement::new();
        for archetype in Archetype::ALL {
            let mut params = GenerationParams::default();
            params.apply_archetype(archetype);
            let out = port.displace(&sphere_points(800, 1.0), &params).unwrap();
            for v in &out.vertices {
                let r = v.length();
                assert!(r >= params.sea_radius() - 1e-9, "{archetype:?}: {r}");
                assert!(r <= params.max_radius() + 1e-9, "{archetype:?}: {r}");
            }
        }
    }

    #[test]
    fn test_sea_level_floor() {
        let port = CpuDisplacement::new();
        let params = GenerationParams {
            sea_level: 1.0,
            ..Default::default()
        };
        let out = port.displace(&sphere_points(200, 1000.0), &params).unwrap();
        for v in &out.vertices {
            assert!((v.length() - 1040.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_biome_in_unit_square_and_resolution_independent() {
        let port = CpuDisplacement::new();
        let params = GenerationParams::default();
        let input = sphere_points(400, 1000.0);
        let doubled: Vec<DVec3> = input.iter().map(|v| *v * 2.0).collect();
        let a = port.displace(&input, &params).unwrap();
        let b = port.displace(&doubled, &params).unwrap();
        for (sa, sb) in a.biome.iter().zip(&b.biome) {
            assert!((0.0..=1.0).contains(&sa.temperature));
            assert!((0.0..=1.0).contains(&sa.humidity));
            assert_eq!(sa, sb);
        }
    }

    #[test]
    fn test_poles_colder_than_equator() {
        let port = CpuDisplacement::new();
        let params = GenerationParams::default();
        let input = [DVec3::Y * 1000.0, DVec3::NEG_Y * 1000.0, DVec3::X * 1000.0];
        let out = port.displace(&input, &params).unwrap();
        assert!(out.biome[0].temperature < out.biome[2].temperature);
        assert!(out.biome[1].temperature < out.biome[2].temperature);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let params = GenerationParams::default();
        let input = sphere_points(PARALLEL_THRESHOLD * 2 + 3, 1000.0);
        let serial = CpuDisplacement::new().with_workers(1);
        let parallel = CpuDisplacement::new().with_workers(4);
        let a = serial.displace(&input, &params).unwrap();
        let b = parallel.displace(&input, &params).unwrap();
        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.biome, b.biome);
    }

    #[test]
    fn test_seed_offset_changes_terrain() {
        let port = CpuDisplacement::new();
        let input = sphere_points(64, 1000.0);
        let a = port.displace(&input, &GenerationParams::default()).unwrap();
        let shifted = GenerationParams {
            seed_offset: DVec3::new(12.3, -4.5, 6.7),
            ..Default::default()
        };
        let b = port.displace(&input, &shifted).unwrap();
        assert_ne!(a.vertices, b.vertices);
    }

    #[test]
    fn test_deep_valleys_stay_on_own_ray() {
        let port = CpuDisplacement::new();
        let params = GenerationParams {
            radius: 10.0,
            height_multiplier: 40.0,
            sea_level: -1.0,
            ..Default::default()
        };
        let input = sphere_points(486, 10.0);
        let out = port.displace(&input, &params).unwrap();
        let flipped = input
            .iter()
            .zip(&out.vertices)
            .filter(|(a, b)| a.dot(**b) <= 0.0)
            .count();
        assert_eq!(flipped, 0);
        assert!(out.vertices.iter().all(|v| v.length() >= MIN_SURFACE_RADIUS - 1e-12));
    }

    #[test]
    fn test_zero_vertex_passes_through() {
        let port = CpuDisplacement::new();
        let out = port
            .displace(&[DVec3::ZERO], &GenerationParams::default())
            .unwrap();
        assert_eq!(out.vertices[0], DVec3::ZERO);
        assert_eq!(out.biome[0], BiomeSignal::NEUTRAL);
    }

    #[test]
    fn test_sculpt_delegates_to_kernel() {
        let port = CpuDisplacement::new();
        let input = sphere_points(50, 100.0);
        let brush = input[10];
        let out = port.sculpt(&input, brush, 5.0, 0.3).unwrap();
        assert_eq!(out, sculpt_vertices(&input, brush, 5.0, 0.3));
    }
}
