//! Configuration for the terra planet terrain system.
//!
//! Settings persist to disk as `config.ron`, can be overridden from the
//! command line via clap, and support hot-reload detection.

mod cli;
mod config;
mod error;

pub use cli::{BackendArg, CliArgs};
pub use config::{
    BackendConfig, BackendKind, Config, DebugConfig, DemoConfig, PlanetConfig, default_config_dir,
};
pub use error::ConfigError;
