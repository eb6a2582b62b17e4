//! The planet facade: ticks, terrain edits and archetype changes.

use std::sync::Arc;

use glam::DVec3;
use terra_cubesphere::{compute_normals, direction_to_face_uv};
use terra_terrain::{
    Archetype, ArchetypePreset, BiomeId, BiomeTable, DecorationRule, DecorationScatterer,
    DisplacementError, GenerationParams, NoiseDisplacementPort,
};

use crate::{
    ChunkEvent, ChunkId, ChunkTree, ConfigurationError, PlanetSettings, TerrainChunk, TickStats,
};

/// Result of [`PlanetSurface::edit_terrain`].
#[derive(Clone, Debug, PartialEq)]
pub enum EditOutcome {
    /// These leaves were sculpted and had their normals rebuilt.
    Applied { chunks: Vec<ChunkId> },
    /// No leaf vertex was within the brush. Nothing changed.
    OutOfRange,
    /// Every leaf in reach failed to sculpt; all meshes kept.
    Failed(DisplacementError),
}

/// An adaptive planet surface around one moving viewer.
pub struct PlanetSurface {
    settings: PlanetSettings,
    tree: ChunkTree,
    biomes: BiomeTable,
}

impl PlanetSurface {
    /// Validate `settings` and build the six root chunks.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for invalid settings.
    pub fn new(
        settings: PlanetSettings,
        rules: Vec<DecorationRule>,
        port: Arc<dyn NoiseDisplacementPort>,
    ) -> Result<Self, ConfigurationError> {
        let scatterer = DecorationScatterer::new(rules, settings.max_props_per_chunk);
        let tree = ChunkTree::new(&settings, scatterer, port)?;
        log::info!(
            "Planet ready: {:?}, radius {}, max LOD {}",
            settings.generation.archetype,
            settings.generation.radius,
            settings.max_lod
        );
        Ok(Self {
            settings,
            tree,
            biomes: BiomeTable::earthlike(),
        })
    }

    /// Refine the surface for a viewer at `viewer` (world space).
    pub fn update(&mut self, viewer: DVec3) -> TickStats {
        self.tree.update(viewer)
    }

    /// Raise or lower the terrain around `world_point`.
    ///
    /// Only leaves on the point's cube face whose footprint contains the
    /// point's face UV are considered, and of those only the ones with a
    /// vertex closer than `radius` to the point are sculpted.
    pub fn edit_terrain(
        &mut self,
        world_point: DVec3,
        raise: bool,
        radius: f64,
        strength: f64,
    ) -> EditOutcome {
        let brush = world_point - self.tree.generator().center();
        let Some((face, uv)) = direction_to_face_uv(brush) else {
            return EditOutcome::OutOfRange;
        };
        if !(radius > 0.0 && radius.is_finite() && strength.is_finite()) {
            return EditOutcome::OutOfRange;
        }
        let signed_strength = if raise { strength } else { -strength };
        let port = self.tree.generator().port();

        let mut in_range = 0;
        let mut last_error = None;
        let mut updates = Vec::new();
        for id in self.tree.leaves_containing(face, uv) {
            let Some(chunk) = self.tree.chunk(id) else {
                continue;
            };
            let mesh = &chunk.mesh;
            if !mesh.vertices.iter().any(|v| v.distance(brush) < radius) {
                continue;
            }
            in_range += 1;

            match port.sculpt(&mesh.vertices, brush, radius, signed_strength) {
                Ok(vertices) if vertices.len() == mesh.vertices.len() => {
                    let normals = compute_normals(&vertices, &mesh.indices);
                    updates.push((id, vertices, normals));
                }
                Ok(vertices) => {
                    let message = format!(
                        "{} returned {} vertices for {}",
                        port.name(),
                        vertices.len(),
                        mesh.vertices.len()
                    );
                    log::warn!("Sculpt of {id} rejected: {message}");
                    last_error = Some(DisplacementError::Unavailable(message));
                }
                Err(e) => {
                    log::warn!("Sculpt of {id} failed: {e}, keeping mesh");
                    last_error = Some(e);
                }
            }
        }

        if in_range == 0 {
            return EditOutcome::OutOfRange;
        }
        if updates.is_empty() {
            return match last_error {
                Some(e) => EditOutcome::Failed(e),
                None => EditOutcome::OutOfRange,
            };
        }

        let mut chunks = Vec::with_capacity(updates.len());
        for (id, vertices, normals) in updates {
            if let Some(chunk) = self.tree.chunk_mut(id) {
                chunk.mesh.vertices = vertices;
                chunk.mesh.normals = normals;
                self.tree.push_event(ChunkEvent::MeshUpdated(id));
                chunks.push(id);
            }
        }
        log::debug!(
            "Edit at {} {uv:?} touched {} chunk(s), raise: {raise}",
            face.label(),
            chunks.len()
        );
        EditOutcome::Applied { chunks }
    }

    /// Switch to `archetype`'s preset and regenerate every chunk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the resulting settings are invalid;
    /// the surface is left unchanged.
    pub fn apply_archetype(
        &mut self,
        archetype: Archetype,
    ) -> Result<ArchetypePreset, ConfigurationError> {
        let mut settings = self.settings.clone();
        let preset = settings.apply_archetype(archetype);
        self.reconfigure(settings)?;
        log::info!("Applied {archetype:?} preset");
        Ok(preset)
    }

    /// Replace all settings and regenerate every chunk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if `settings` is invalid; the surface is
    /// left unchanged.
    pub fn reconfigure(&mut self, settings: PlanetSettings) -> Result<(), ConfigurationError> {
        self.tree.rebuild(&settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Classify every vertex of a chunk with the biome table.
    pub fn classify_chunk(&self, id: ChunkId) -> Option<Vec<BiomeId>> {
        let chunk = self.tree.chunk(id)?;
        Some(
            chunk
                .mesh
                .biome
                .iter()
                .map(|&signal| self.biomes.lookup(signal))
                .collect(),
        )
    }

    pub fn settings(&self) -> &PlanetSettings {
        &self.settings
    }

    pub fn generation_params(&self) -> &GenerationParams {
        self.tree.generator().params()
    }

    /// Decoration rules in priority order.
    pub fn decoration_rules(&self) -> &[DecorationRule] {
        self.tree.generator().scatterer().rules()
    }

    /// Name of the displacement backend.
    pub fn backend_name(&self) -> &'static str {
        self.tree.generator().port().name()
    }

    pub fn chunk(&self, id: ChunkId) -> Option<&TerrainChunk> {
        self.tree.chunk(id)
    }

    pub fn leaves(&self) -> Vec<ChunkId> {
        self.tree.leaves()
    }

    pub fn roots(&self) -> [ChunkId; 6] {
        self.tree.roots()
    }

    pub fn chunk_count(&self) -> usize {
        self.tree.len()
    }

    pub fn tree(&self) -> &ChunkTree {
        &self.tree
    }

    /// Take the chunk events published since the last drain.
    pub fn drain_events(&mut self) -> Vec<ChunkEvent> {
        self.tree.drain_events()
    }

    pub fn biome_table(&self) -> &BiomeTable {
        &self.biomes
    }

    pub fn set_biome_table(&mut self, table: BiomeTable) {
        self.biomes = table;
    }
}
