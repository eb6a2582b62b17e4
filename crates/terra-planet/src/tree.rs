//! The six per-face chunk quadtrees and their distance-driven refinement.

use std::sync::Arc;

use glam::{DVec2, DVec3};
use terra_cubesphere::{CubeFace, Footprint};
use terra_terrain::{DecorationScatterer, NoiseDisplacementPort};

use crate::generator::ChunkGenerator;
use crate::{
    ChunkArena, ChunkEvent, ChunkId, ConfigurationError, LodError, PlanetSettings, TerrainChunk,
    TickStats,
};

/// Owns every chunk of a planet and refines the quadtrees around a viewer.
///
/// Each update walks the trees strictly top-down: a parent's split or merge
/// decision completes before its children are evaluated, and no chunk is
/// evaluated twice in one pass.
pub struct ChunkTree {
    arena: ChunkArena<TerrainChunk>,
    roots: [ChunkId; 6],
    generator: ChunkGenerator,
    max_lod: u8,
    detail_distances: Vec<f64>,
    events: Vec<ChunkEvent>,
}

impl ChunkTree {
    /// Validate `settings` and build the six root chunks.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the settings are invalid.
    pub fn new(
        settings: &PlanetSettings,
        scatterer: DecorationScatterer,
        port: Arc<dyn NoiseDisplacementPort>,
    ) -> Result<Self, ConfigurationError> {
        settings.validate()?;
        let generator = ChunkGenerator::new(settings, scatterer, port)?;
        let mut arena = ChunkArena::new();
        let mut events = Vec::with_capacity(6);
        let roots = CubeFace::ALL.map(|face| {
            let id = arena.insert(generator.generate(face, 0, Footprint::ROOT, None));
            events.push(ChunkEvent::Created(id));
            id
        });
        log::info!(
            "Built {} root chunks with the {} backend",
            roots.len(),
            generator.port().name()
        );
        Ok(Self {
            arena,
            roots,
            generator,
            max_lod: settings.max_lod,
            detail_distances: settings.detail_distances.clone(),
            events,
        })
    }

    /// Refine all six trees for a viewer at `viewer` (world space).
    pub fn update(&mut self, viewer: DVec3) -> TickStats {
        let mut stats = TickStats::default();
        for root in self.roots {
            self.update_chunk(root, viewer, &mut stats);
        }
        if stats.changed() {
            log::debug!(
                "LOD tick: {} splits, {} merges, {} chunks live",
                stats.subdivisions,
                stats.merges,
                self.arena.len()
            );
        }
        stats
    }

    fn update_chunk(&mut self, id: ChunkId, viewer: DVec3, stats: &mut TickStats) {
        let Some(chunk) = self.arena.get(id) else {
            return;
        };
        stats.evaluated += 1;

        let depth = chunk.depth;
        let wants_detail = depth < self.max_lod
            && chunk.center.distance(viewer) < self.detail_distances[depth as usize];

        if wants_detail {
            let children = match chunk.children {
                Some(children) => children,
                None => {
                    let (face, footprint) = (chunk.face, chunk.footprint);
                    self.split(id, face, depth, footprint, stats)
                }
            };
            for child in children {
                self.update_chunk(child, viewer, stats);
            }
        } else if chunk.children.is_some() {
            self.collapse(id, stats);
        }
    }

    /// Subdivide a leaf. Returns the existing children if already subdivided.
    ///
    /// # Errors
    ///
    /// [`LodError::UnknownChunk`] for stale handles, [`LodError::DepthExceeded`]
    /// for chunks at `max_lod`.
    pub fn subdivide(&mut self, id: ChunkId) -> Result<[ChunkId; 4], LodError> {
        let chunk = self.arena.get(id).ok_or(LodError::UnknownChunk(id))?;
        if let Some(children) = chunk.children {
            return Ok(children);
        }
        if chunk.depth >= self.max_lod {
            return Err(LodError::DepthExceeded {
                depth: chunk.depth,
                max: self.max_lod,
            });
        }
        let (face, depth, footprint) = (chunk.face, chunk.depth, chunk.footprint);
        Ok(self.split(id, face, depth, footprint, &mut TickStats::default()))
    }

    /// Merge a subdivided chunk back into a leaf. Leaves are left unchanged.
    ///
    /// # Errors
    ///
    /// [`LodError::UnknownChunk`] for stale handles.
    pub fn merge(&mut self, id: ChunkId) -> Result<(), LodError> {
        if !self.arena.contains(id) {
            return Err(LodError::UnknownChunk(id));
        }
        self.collapse(id, &mut TickStats::default());
        Ok(())
    }

    /// Build four children, then hide the parent. The caller checks depth.
    fn split(
        &mut self,
        id: ChunkId,
        face: CubeFace,
        depth: u8,
        footprint: Footprint,
        stats: &mut TickStats,
    ) -> [ChunkId; 4] {
        let generator = &self.generator;
        let arena = &mut self.arena;
        let events = &mut self.events;
        let children = footprint.quadrants().map(|quadrant| {
            let child_id = arena.insert(generator.generate(face, depth + 1, quadrant, Some(id)));
            events.push(ChunkEvent::Created(child_id));
            child_id
        });

        if let Some(chunk) = self.arena.get_mut(id) {
            chunk.children = Some(children);
            chunk.set_active(false);
        }
        self.events.push(ChunkEvent::Hidden(id));
        stats.subdivisions += 1;
        stats.created += 4;
        log::debug!("Subdivided {id} ({} depth {depth})", face.label());
        children
    }

    /// Destroy every descendant, then show the chunk again.
    fn collapse(&mut self, id: ChunkId, stats: &mut TickStats) {
        let Some(children) = self.arena.get_mut(id).and_then(|c| c.children.take()) else {
            return;
        };
        for child in children {
            self.destroy(child, stats);
        }
        if let Some(chunk) = self.arena.get_mut(id) {
            chunk.set_active(true);
            log::debug!("Merged {id} ({} depth {})", chunk.face.label(), chunk.depth);
        }
        self.events.push(ChunkEvent::Shown(id));
        stats.merges += 1;
    }

    fn destroy(&mut self, id: ChunkId, stats: &mut TickStats) {
        let Some(chunk) = self.arena.remove(id) else {
            return;
        };
        if let Some(children) = chunk.children {
            for child in children {
                self.destroy(child, stats);
            }
        }
        self.events.push(ChunkEvent::Destroyed(id));
        stats.destroyed += 1;
    }

    /// Release every chunk and rebuild the roots for new settings.
    pub(crate) fn rebuild(&mut self, settings: &PlanetSettings) -> Result<(), ConfigurationError> {
        settings.validate()?;
        self.generator.reconfigure(settings)?;
        self.max_lod = settings.max_lod;
        self.detail_distances = settings.detail_distances.clone();

        let mut stats = TickStats::default();
        for root in self.roots {
            self.destroy(root, &mut stats);
        }
        let generator = &self.generator;
        let arena = &mut self.arena;
        let events = &mut self.events;
        self.roots = CubeFace::ALL.map(|face| {
            let id = arena.insert(generator.generate(face, 0, Footprint::ROOT, None));
            events.push(ChunkEvent::Created(id));
            id
        });
        log::info!("Regenerated planet: released {} chunks", stats.destroyed);
        Ok(())
    }

    /// Leaves of `face`'s tree whose closed footprint contains `uv`.
    pub(crate) fn leaves_containing(&self, face: CubeFace, uv: DVec2) -> Vec<ChunkId> {
        let root = self.roots[face as usize];
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(chunk) = self.arena.get(id) else {
                continue;
            };
            if !chunk.footprint.contains(uv) {
                continue;
            }
            match chunk.children {
                Some(children) => stack.extend(children),
                None => found.push(id),
            }
        }
        found
    }

    pub(crate) fn chunk_mut(&mut self, id: ChunkId) -> Option<&mut TerrainChunk> {
        self.arena.get_mut(id)
    }

    pub(crate) fn generator(&self) -> &ChunkGenerator {
        &self.generator
    }

    pub(crate) fn push_event(&mut self, event: ChunkEvent) {
        self.events.push(event);
    }

    /// Look up a chunk.
    pub fn chunk(&self, id: ChunkId) -> Option<&TerrainChunk> {
        self.arena.get(id)
    }

    /// Root chunks in face order +X, -X, +Y, -Y, +Z, -Z.
    pub fn roots(&self) -> [ChunkId; 6] {
        self.roots
    }

    /// All current leaves.
    pub fn leaves(&self) -> Vec<ChunkId> {
        self.arena
            .iter()
            .filter(|(_, chunk)| chunk.is_leaf())
            .map(|(id, _)| id)
            .collect()
    }

    /// Number of live chunks, leaves and subdivided.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Always `false` once constructed.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Deepest quadtree level.
    pub fn max_lod(&self) -> u8 {
        self.max_lod
    }

    /// Take the events published since the last drain.
    pub fn drain_events(&mut self) -> Vec<ChunkEvent> {
        std::mem::take(&mut self.events)
    }
}
