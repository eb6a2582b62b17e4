//! Synchronous chunk construction: mesh build, displacement, normals, scatter.

use std::sync::Arc;

use glam::DVec3;
use terra_cubesphere::{
    ChunkMeshBuilder, CubeFace, Footprint, compute_normals, face_uv_to_sphere,
};
use terra_terrain::{
    BiomeSignal, DecorationScatterer, GenerationParams, NoiseDisplacementPort, ScatterInput,
    chunk_seed,
};

use crate::{ChunkId, ChunkMeshData, ConfigurationError, PlanetSettings, TerrainChunk};

/// Builds fully generated [`TerrainChunk`]s for one planet configuration.
pub(crate) struct ChunkGenerator {
    builder: ChunkMeshBuilder,
    port: Arc<dyn NoiseDisplacementPort>,
    scatterer: DecorationScatterer,
    params: GenerationParams,
    center: DVec3,
    max_lod: u8,
}

impl ChunkGenerator {
    pub(crate) fn new(
        settings: &PlanetSettings,
        scatterer: DecorationScatterer,
        port: Arc<dyn NoiseDisplacementPort>,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            builder: ChunkMeshBuilder::new(settings.resolution, settings.generation.radius)?,
            port,
            scatterer,
            params: settings.generation.clone(),
            center: settings.center,
            max_lod: settings.max_lod,
        })
    }

    /// Swap in new settings, keeping the backend and decoration rules.
    pub(crate) fn reconfigure(
        &mut self,
        settings: &PlanetSettings,
    ) -> Result<(), ConfigurationError> {
        self.builder = ChunkMeshBuilder::new(settings.resolution, settings.generation.radius)?;
        if self.scatterer.max_props_per_chunk() != settings.max_props_per_chunk {
            self.scatterer = DecorationScatterer::new(
                self.scatterer.rules().to_vec(),
                settings.max_props_per_chunk,
            );
        }
        self.params = settings.generation.clone();
        self.center = settings.center;
        self.max_lod = settings.max_lod;
        Ok(())
    }

    pub(crate) fn port(&self) -> &dyn NoiseDisplacementPort {
        self.port.as_ref()
    }

    pub(crate) fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub(crate) fn scatterer(&self) -> &DecorationScatterer {
        &self.scatterer
    }

    pub(crate) fn center(&self) -> DVec3 {
        self.center
    }

    /// Build a chunk. Backend failures degrade to the flat base mesh with a
    /// neutral biome signal and no decorations.
    pub(crate) fn generate(
        &self,
        face: CubeFace,
        depth: u8,
        footprint: Footprint,
        parent: Option<ChunkId>,
    ) -> TerrainChunk {
        let base = self.builder.build(face, &footprint);
        let center =
            self.center + face_uv_to_sphere(face, footprint.center_uv()) * self.params.radius;
        let seed = chunk_seed(center, self.params.seed_offset);

        let count = base.vertices.len();
        let flat = || (base.vertices.clone(), vec![BiomeSignal::NEUTRAL; count], false);
        let (vertices, biome, displaced) = match self.port.displace(&base.vertices, &self.params) {
            Ok(d) if d.vertices.len() == count && d.biome.len() == count => {
                (d.vertices, d.biome, true)
            }
            Ok(d) => {
                log::warn!(
                    "{} backend returned {} vertices for {count} inputs on {} depth {depth}, \
                     keeping flat mesh",
                    self.port.name(),
                    d.vertices.len(),
                    face.label()
                );
                flat()
            }
            Err(e) => {
                log::warn!(
                    "Displacement failed on {} depth {depth}: {e}, keeping flat mesh",
                    face.label()
                );
                flat()
            }
        };

        let normals = compute_normals(&vertices, &base.indices);

        let decorations = if depth == self.max_lod && displaced {
            self.scatterer.scatter(&ScatterInput {
                vertices: &vertices,
                normals: &normals,
                biome: &biome,
                chunk_seed: seed,
                planet_center: self.center,
                seed_offset: self.params.seed_offset,
                sea_radius: self.params.sea_radius(),
            })
        } else {
            Vec::new()
        };

        TerrainChunk {
            face,
            depth,
            footprint,
            center,
            parent,
            children: None,
            mesh: ChunkMeshData {
                base: base.vertices,
                vertices,
                indices: base.indices,
                normals,
                biome,
                resolution: base.resolution,
                displaced,
            },
            visible: true,
            collider_enabled: true,
            decorations,
            decorations_active: true,
            seed,
        }
    }
}
