//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use terra_terrain::{Archetype, DecorationRule, PropId};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Planet shape and LOD settings.
    pub planet: PlanetConfig,
    /// Decoration rules, evaluated in order.
    pub decorations: Vec<DecorationRule>,
    /// Displacement backend selection.
    pub backend: BackendConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Headless flyby settings.
    pub demo: DemoConfig,
}

/// Persisted planet parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetConfig {
    /// Terrain preset.
    pub archetype: Archetype,
    /// Overwrite radius, height, sea level and noise scale with the archetype preset on load.
    pub use_archetype_preset: bool,
    /// Base sphere radius.
    pub radius: f64,
    /// Vertices per chunk edge.
    pub resolution: u32,
    /// Frequency of the first noise octave.
    pub noise_scale: f64,
    /// Number of noise octaves (1-8).
    pub octaves: u32,
    /// Amplitude falloff between octaves (0-1).
    pub persistence: f64,
    /// Frequency growth between octaves.
    pub lacunarity: f64,
    /// World units per unit of normalized height.
    pub height_multiplier: f64,
    /// Normalized sea level (-1 to 1).
    pub sea_level: f64,
    /// Noise domain offset.
    pub seed_offset: [f64; 3],
    /// Planet origin in world space.
    pub center: [f64; 3],
    /// Deepest quadtree level.
    pub max_lod: u8,
    /// Subdivision distance per depth, `max_lod + 1` entries, non-increasing.
    pub detail_distances: Vec<f64>,
    /// Decoration placement attempts per finest-level chunk.
    pub max_props_per_chunk: u32,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            archetype: Archetype::Terrestrial,
            use_archetype_preset: true,
            radius: 1000.0,
            resolution: 17,
            noise_scale: 2.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            height_multiplier: 40.0,
            sea_level: 0.0,
            seed_offset: [0.0; 3],
            center: [0.0; 3],
            max_lod: 5,
            detail_distances: vec![3000.0, 1500.0, 750.0, 375.0, 190.0, 95.0],
            max_props_per_chunk: 24,
        }
    }
}

/// Which displacement backend to run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BackendKind {
    /// Multi-threaded CPU noise.
    #[default]
    Cpu,
    /// wgpu compute shaders; falls back to the CPU if no adapter is found.
    Gpu,
}

/// Displacement backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend selection.
    pub kind: BackendKind,
    /// CPU worker threads (0 = one per logical CPU).
    pub worker_threads: usize,
    /// Noise permutation seed for the CPU backend.
    pub noise_seed: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Headless flyby configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of update ticks to simulate.
    pub ticks: u32,
    /// Starting viewer distance from the planet center, in planet radii.
    pub start_distance: f64,
    /// Final viewer altitude above the base sphere.
    pub end_altitude: f64,
    /// Raise the terrain under the viewer every this many ticks (0 = never).
    pub edit_interval: u32,
    /// Brush radius for edits.
    pub edit_radius: f64,
    /// Brush strength for edits.
    pub edit_strength: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            ticks: 120,
            start_distance: 4.0,
            end_altitude: 20.0,
            edit_interval: 30,
            edit_radius: 2.0,
            edit_strength: 0.3,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            planet: PlanetConfig::default(),
            decorations: default_decorations(),
            backend: BackendConfig::default(),
            debug: DebugConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

fn default_decorations() -> Vec<DecorationRule> {
    vec![
        DecorationRule {
            prop: PropId(1),
            name: "pine".to_string(),
            temperature: (0.2, 0.6),
            humidity: (0.4, 1.0),
            max_slope_degrees: 30.0,
            min_altitude: 2.0,
            scale_range: (0.8, 1.4),
            sink_depth: 0.2,
            align_to_terrain: 0.1,
            spawn_probability: 0.4,
            clump_scale: Some(40.0),
        },
        DecorationRule {
            prop: PropId(2),
            name: "palm".to_string(),
            temperature: (0.65, 1.0),
            humidity: (0.5, 1.0),
            max_slope_degrees: 25.0,
            min_altitude: 0.5,
            scale_range: (0.9, 1.2),
            sink_depth: 0.1,
            align_to_terrain: 0.2,
            spawn_probability: 0.3,
            clump_scale: None,
        },
        DecorationRule {
            prop: PropId(3),
            name: "cactus".to_string(),
            temperature: (0.6, 1.0),
            humidity: (0.0, 0.35),
            max_slope_degrees: 20.0,
            min_altitude: 1.0,
            scale_range: (0.7, 1.1),
            sink_depth: 0.1,
            align_to_terrain: 0.0,
            spawn_probability: 0.15,
            clump_scale: None,
        },
        DecorationRule {
            prop: PropId(4),
            name: "rock".to_string(),
            max_slope_degrees: 60.0,
            scale_range: (0.3, 1.5),
            sink_depth: 0.3,
            align_to_terrain: 0.9,
            spawn_probability: 0.2,
            ..DecorationRule::default()
        },
    ]
}

/// Default location of `config.ron`: the platform config directory plus `terra`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("terra"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).map_err(ConfigError::read(&config_path))?;
            let config: Config =
                ron::from_str(&contents).map_err(ConfigError::parse(&config_path))?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::write(config_dir))?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(false)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::write(&config_path))?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents =
            std::fs::read_to_string(&config_path).map_err(ConfigError::read(&config_path))?;
        let new_config: Config =
            ron::from_str(&contents).map_err(ConfigError::parse(&config_path))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
