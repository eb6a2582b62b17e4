//! Biome signal and its Whittaker-style classification.
//!
//! Displacement backends emit a per-vertex [`BiomeSignal`] (temperature,
//! humidity). The same pair drives decoration filtering and, through a
//! [`BiomeTable`], the visual biome the renderer paints.

/// Per-vertex `(temperature, humidity)` pair, both in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeSignal {
    /// Normalized temperature.
    pub temperature: f64,
    /// Normalized humidity.
    pub humidity: f64,
}

impl BiomeSignal {
    /// Mid-range signal used when no backend result is available.
    pub const NEUTRAL: BiomeSignal = BiomeSignal {
        temperature: 0.5,
        humidity: 0.5,
    };

    /// Construct a signal, clamping both channels to `[0, 1]`.
    #[must_use]
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature: temperature.clamp(0.0, 1.0),
            humidity: humidity.clamp(0.0, 1.0),
        }
    }

    /// The signal packed as a UV channel for the renderer.
    #[must_use]
    pub fn as_uv(&self) -> [f32; 2] {
        [self.temperature as f32, self.humidity as f32]
    }
}

/// Identifier of a biome within a [`BiomeTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BiomeId(pub u16);

/// Visual description of a biome.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeDef {
    /// Human-readable name (e.g. "tundra").
    pub name: String,
    /// Linear RGB tint for the biome lookup texture.
    pub color: [f32; 3],
}

/// A rectangle in temperature–humidity space mapped to a biome.
#[derive(Clone, Debug)]
pub struct BiomeRegion {
    /// Temperature range, min inclusive, max exclusive.
    pub temperature: (f64, f64),
    /// Humidity range, min inclusive, max exclusive.
    pub humidity: (f64, f64),
    /// Biome assigned inside this region.
    pub biome: BiomeId,
}

/// Whittaker-style lookup: first matching region wins, otherwise the fallback.
pub struct BiomeTable {
    biomes: Vec<BiomeDef>,
    regions: Vec<BiomeRegion>,
    fallback: BiomeId,
}

impl BiomeTable {
    /// Creates a table containing only the fallback biome.
    pub fn new(fallback: BiomeDef) -> Self {
        Self {
            biomes: vec![fallback],
            regions: Vec::new(),
            fallback: BiomeId(0),
        }
    }

    /// Registers a biome and returns its id.
    pub fn add_biome(&mut self, def: BiomeDef) -> BiomeId {
        let id = BiomeId(self.biomes.len() as u16);
        self.biomes.push(def);
        id
    }

    /// Appends a lookup region. Earlier regions take priority.
    pub fn add_region(
        &mut self,
        temperature: (f64, f64),
        humidity: (f64, f64),
        biome: BiomeId,
    ) -> &mut Self {
        self.regions.push(BiomeRegion {
            temperature,
            humidity,
            biome,
        });
        self
    }

    /// A five-biome table covering the whole signal square.
    pub fn earthlike() -> Self {
        let mut table = Self::new(BiomeDef {
            name: "grassland".into(),
            color: [0.36, 0.55, 0.22],
        });
        let grassland = table.fallback;
        let tundra = table.add_biome(BiomeDef {
            name: "tundra".into(),
            color: [0.85, 0.88, 0.9],
        });
        let desert = table.add_biome(BiomeDef {
            name: "desert".into(),
            color: [0.86, 0.75, 0.5],
        });
        let forest = table.add_biome(BiomeDef {
            name: "forest".into(),
            color: [0.13, 0.4, 0.15],
        });
        let jungle = table.add_biome(BiomeDef {
            name: "jungle".into(),
            color: [0.08, 0.45, 0.2],
        });
        table
            .add_region((0.0, 0.25), (0.0, 1.01), tundra)
            .add_region((0.65, 1.01), (0.0, 0.35), desert)
            .add_region((0.65, 1.01), (0.65, 1.01), jungle)
            .add_region((0.25, 0.65), (0.6, 1.01), forest)
            .add_region((0.25, 1.01), (0.0, 1.01), grassland);
        table
    }

    /// Looks up the biome id for a signal.
    pub fn lookup(&self, signal: BiomeSignal) -> BiomeId {
        self.regions
            .iter()
            .find(|r| {
                signal.temperature >= r.temperature.0
                    && signal.temperature < r.temperature.1
                    && signal.humidity >= r.humidity.0
                    && signal.humidity < r.humidity.1
            })
            .map_or(self.fallback, |r| r.biome)
    }

    /// Looks up the biome definition for a signal.
    pub fn classify(&self, signal: BiomeSignal) -> &BiomeDef {
        self.get(self.lookup(signal))
    }

    /// Returns the definition for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this table.
    pub fn get(&self, id: BiomeId) -> &BiomeDef {
        &self.biomes[id.0 as usize]
    }

    /// Number of registered biomes, fallback included.
    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Always `false`: a table holds at least its fallback.
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }
}

impl Default for BiomeTable {
    fn default() -> Self {
        Self::earthlike()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_clamps() {
        let s = BiomeSignal::new(-0.2, 1.7);
        assert_eq!(s.temperature, 0.0);
        assert_eq!(s.humidity, 1.0);
    }

    #[test]
    fn test_cold_is_tundra() {
        let table = BiomeTable::earthlike();
        assert_eq!(table.classify(BiomeSignal::new(0.1, 0.9)).name, "tundra");
        assert_eq!(table.classify(BiomeSignal::new(0.0, 0.0)).name, "tundra");
    }

    #[test]
    fn test_hot_dry_is_desert_and_hot_wet_is_jungle() {
        let table = BiomeTable::earthlike();
        assert_eq!(table.classify(BiomeSignal::new(0.9, 0.1)).name, "desert");
        assert_eq!(table.classify(BiomeSignal::new(1.0, 1.0)).name, "jungle");
    }

    #[test]
    fn test_temperate_wet_is_forest() {
        let table = BiomeTable::earthlike();
        assert_eq!(table.classify(BiomeSignal::new(0.5, 0.8)).name, "forest");
    }

    #[test]
    fn test_first_region_wins() {
        let mut table = BiomeTable::new(BiomeDef {
            name: "void".into(),
            color: [0.0; 3],
        });
        let a = table.add_biome(BiomeDef {
            name: "a".into(),
            color: [1.0; 3],
        });
        let b = table.add_biome(BiomeDef {
            name: "b".into(),
            color: [0.5; 3],
        });
        table
            .add_region((0.0, 1.0), (0.0, 1.0), a)
            .add_region((0.0, 1.0), (0.0, 1.0), b);
        assert_eq!(table.lookup(BiomeSignal::NEUTRAL), a);
    }

    #[test]
    fn test_unmatched_falls_back() {
        let table = BiomeTable::new(BiomeDef {
            name: "void".into(),
            color: [0.0; 3],
        });
        assert_eq!(table.classify(BiomeSignal::NEUTRAL).name, "void");
        assert_eq!(table.len(), 1);
    }
}
