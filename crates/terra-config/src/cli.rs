//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use terra_terrain::Archetype;

use crate::{BackendKind, Config};

/// Backend choice on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// CPU noise.
    Cpu,
    /// GPU compute.
    Gpu,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Cpu => BackendKind::Cpu,
            BackendArg::Gpu => BackendKind::Gpu,
        }
    }
}

/// Terra command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "terra", about = "Adaptive cube-sphere planet terrain")]
pub struct CliArgs {
    /// Planet archetype (terrestrial, oceanic, desert, icy).
    #[arg(long, value_parser = parse_archetype)]
    pub archetype: Option<Archetype>,

    /// Vertices per chunk edge.
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Deepest quadtree level. Detail distances are halved per extra level.
    #[arg(long)]
    pub max_lod: Option<u8>,

    /// Displacement backend.
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Number of simulated ticks.
    #[arg(long)]
    pub ticks: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_archetype(s: &str) -> Result<Archetype, String> {
    Archetype::ALL
        .into_iter()
        .find(|a| format!("{a:?}").eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown archetype `{s}`"))
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(archetype) = args.archetype {
            self.planet.archetype = archetype;
        }
        if let Some(resolution) = args.resolution {
            self.planet.resolution = resolution;
        }
        if let Some(max_lod) = args.max_lod {
            self.planet.max_lod = max_lod;
            resize_detail_distances(&mut self.planet.detail_distances, max_lod);
        }
        if let Some(backend) = args.backend {
            self.backend.kind = backend.into();
        }
        if let Some(ticks) = args.ticks {
            self.demo.ticks = ticks;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

/// Truncate, or extend by halving the last entry, to `max_lod + 1` entries.
fn resize_detail_distances(distances: &mut Vec<f64>, max_lod: u8) {
    let len = max_lod as usize + 1;
    if distances.is_empty() {
        distances.push(1000.0);
    }
    distances.truncate(len);
    while distances.len() < len {
        let last = distances[distances.len() - 1];
        distances.push(last * 0.5);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_args() -> CliArgs {
        CliArgs {
            archetype: None,
            resolution: None,
            max_lod: None,
            backend: None,
            ticks: None,
            log_level: None,
            config: None,
        }
    }

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            archetype: Some(Archetype::Oceanic),
            resolution: Some(9),
            backend: Some(BackendArg::Gpu),
            ..no_args()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.planet.archetype, Archetype::Oceanic);
        assert_eq!(config.planet.resolution, 9);
        assert_eq!(config.backend.kind, BackendKind::Gpu);
        // Non-overridden fields retain defaults
        assert_eq!(config.demo.ticks, 120);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&no_args());
        assert_eq!(config, original);
    }

    #[test]
    fn test_max_lod_override_keeps_distances_consistent() {
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs {
            max_lod: Some(2),
            ..no_args()
        });
        assert_eq!(config.planet.detail_distances, vec![3000.0, 1500.0, 750.0]);

        config.apply_cli_overrides(&CliArgs {
            max_lod: Some(4),
            ..no_args()
        });
        assert_eq!(
            config.planet.detail_distances,
            vec![3000.0, 1500.0, 750.0, 375.0, 187.5]
        );
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = CliArgs::parse_from([
            "terra",
            "--archetype",
            "desert",
            "--backend",
            "cpu",
            "--ticks",
            "10",
        ]);
        assert_eq!(args.archetype, Some(Archetype::Desert));
        assert_eq!(args.backend, Some(BackendArg::Cpu));
        assert_eq!(args.ticks, Some(10));
        assert!(args.config.is_none());
    }

    #[test]
    fn test_unknown_archetype_rejected() {
        assert!(CliArgs::try_parse_from(["terra", "--archetype", "gas-giant"]).is_err());
    }
}
