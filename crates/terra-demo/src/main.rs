//! Headless flyby: loads the config, builds a planet and moves a viewer from
//! orbit down to the surface, editing the terrain on the way.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use glam::DVec3;
use terra_config::{BackendConfig, BackendKind, CliArgs, Config, DemoConfig, default_config_dir};
use terra_planet::{ChunkEvent, EditOutcome, PlanetSettings, PlanetSurface};
use terra_terrain::{CpuDisplacement, NoiseDisplacementPort};

/// Ticks between checks of `config.ron` for changes.
const RELOAD_INTERVAL: u32 = 60;

fn main() {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".terra"));

    let file_config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    let mut config = file_config.clone();
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    terra_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    tracing::info!("Config directory: {}", config_dir.display());

    let settings = match PlanetSettings::from_config(&config.planet) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Invalid planet configuration: {e}");
            std::process::exit(1);
        }
    };

    let port = build_backend(&config.backend);
    let mut surface = match PlanetSurface::new(settings, config.decorations.clone(), port) {
        Ok(surface) => surface,
        Err(e) => {
            tracing::error!("Failed to build planet: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Planet: {:?}, radius {}, sea radius {}, atmosphere x{}, backend {}",
        surface.generation_params().archetype,
        surface.generation_params().radius,
        surface.generation_params().sea_radius(),
        surface.settings().atmosphere_scale,
        surface.backend_name()
    );

    fly(&mut surface, &config, &file_config, &args, &config_dir);
    report(&surface);
}

fn build_backend(config: &BackendConfig) -> Arc<dyn NoiseDisplacementPort> {
    if config.kind == BackendKind::Gpu {
        #[cfg(feature = "gpu")]
        match terra_terrain::GpuDisplacement::new() {
            Ok(gpu) => return Arc::new(gpu),
            Err(e) => tracing::warn!("{e}, falling back to the CPU backend"),
        }
        #[cfg(not(feature = "gpu"))]
        tracing::warn!("Built without the `gpu` feature, using the CPU backend");
    }
    Arc::new(CpuDisplacement::with_seed(config.noise_seed).with_workers(config.worker_threads))
}

/// Viewer distance from the planet center at `tick`, shrinking geometrically
/// from `start_distance` radii to `end_altitude` above the base sphere.
fn flyby_distance(demo: &DemoConfig, radius: f64, tick: u32) -> f64 {
    let start = demo.start_distance.max(1.0) * radius;
    let end = radius + demo.end_altitude.max(0.0);
    if demo.ticks <= 1 {
        return end;
    }
    let t = f64::from(tick.min(demo.ticks - 1)) / f64::from(demo.ticks - 1);
    start * (end / start).powf(t)
}

/// The leaf vertex closest in direction to `viewer`, in world space.
fn surface_point_below(surface: &PlanetSurface, viewer: DVec3) -> Option<DVec3> {
    let center = surface.settings().center;
    let dir = (viewer - center).try_normalize()?;
    surface
        .leaves()
        .into_iter()
        .filter_map(|id| surface.chunk(id))
        .flat_map(|chunk| chunk.mesh().vertices.iter().copied())
        .max_by(|a, b| {
            let da = a.normalize_or_zero().dot(dir);
            let db = b.normalize_or_zero().dot(dir);
            da.total_cmp(&db)
        })
        .map(|v| center + v)
}

fn fly(
    surface: &mut PlanetSurface,
    config: &Config,
    file_config: &Config,
    args: &CliArgs,
    config_dir: &Path,
) {
    let demo = &config.demo;
    let heading = DVec3::new(0.3, 0.5, 1.0).normalize();
    let mut file_config = file_config.clone();
    let mut totals = BTreeMap::<&'static str, usize>::new();

    for tick in 0..demo.ticks {
        if tick > 0 && tick % RELOAD_INTERVAL == 0 {
            reload(surface, &mut file_config, args, config_dir);
        }

        let radius = surface.generation_params().radius;
        let viewer =
            surface.settings().center + heading * flyby_distance(demo, radius, tick);
        let stats = surface.update(viewer);
        if stats.changed() {
            tracing::info!(
                "tick {tick}: altitude {:.1}, +{} -{} chunks ({} splits, {} merges), {} live",
                (viewer - surface.settings().center).length() - radius,
                stats.created,
                stats.destroyed,
                stats.subdivisions,
                stats.merges,
                surface.chunk_count()
            );
        } else {
            tracing::debug!("tick {tick}: {} nodes evaluated", stats.evaluated);
        }

        if demo.edit_interval > 0
            && tick > 0
            && tick % demo.edit_interval == 0
            && let Some(point) = surface_point_below(surface, viewer)
        {
            match surface.edit_terrain(point, true, demo.edit_radius, demo.edit_strength) {
                EditOutcome::Applied { chunks } => {
                    tracing::info!("tick {tick}: raised terrain on {} chunk(s)", chunks.len());
                }
                EditOutcome::OutOfRange => tracing::info!("tick {tick}: edit out of range"),
                EditOutcome::Failed(e) => tracing::warn!("tick {tick}: edit failed: {e}"),
            }
        }

        for event in surface.drain_events() {
            let kind = match event {
                ChunkEvent::Created(_) => "created",
                ChunkEvent::Destroyed(_) => "destroyed",
                ChunkEvent::Shown(_) => "shown",
                ChunkEvent::Hidden(_) => "hidden",
                ChunkEvent::MeshUpdated(_) => "mesh_updated",
            };
            *totals.entry(kind).or_default() += 1;
        }
    }

    for (kind, count) in &totals {
        tracing::info!("events {kind}: {count}");
    }
}

fn reload(surface: &mut PlanetSurface, file_config: &mut Config, args: &CliArgs, dir: &Path) {
    let changed = match file_config.reload(dir) {
        Ok(Some(changed)) => changed,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!("Config reload failed: {e}");
            return;
        }
    };
    *file_config = changed.clone();
    let mut config = changed;
    config.apply_cli_overrides(args);

    match PlanetSettings::from_config(&config.planet) {
        Ok(settings) if &settings != surface.settings() => match surface.reconfigure(settings) {
            Ok(()) => tracing::info!("Planet regenerated from reloaded config"),
            Err(e) => tracing::warn!("Reloaded planet settings rejected: {e}"),
        },
        Ok(_) => {}
        Err(e) => tracing::warn!("Reloaded planet settings rejected: {e}"),
    }
}

fn report(surface: &PlanetSurface) {
    let leaves = surface.leaves();
    let mut biomes = BTreeMap::<String, usize>::new();
    let mut decorations = 0;
    let mut deepest = 0;
    for &id in &leaves {
        let Some(chunk) = surface.chunk(id) else {
            continue;
        };
        deepest = deepest.max(chunk.depth());
        decorations += chunk.decorations().len();
        for biome in surface.classify_chunk(id).unwrap_or_default() {
            let name = &surface.biome_table().get(biome).name;
            *biomes.entry(name.clone()).or_default() += 1;
        }
    }

    tracing::info!(
        "Final: {} chunks, {} leaves, deepest LOD {deepest}, {decorations} decorations",
        surface.chunk_count(),
        leaves.len()
    );
    for (name, count) in &biomes {
        tracing::info!("biome {name}: {count} vertices");
    }
}
