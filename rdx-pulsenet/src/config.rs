//! Defines all configuration structures for the Pulsenet engine.
//!
//! These structs are designed to be deserialized from a configuration file
//! (e.g., a TOML file) using `serde`. Every search bound the engine enforces
//! lives here, so a caller that hits `NoCycleFound` or `WatchNeverFires` can
//! widen the bound without touching code.

use config::{Config, Environment, File};
use serde::Deserialize;

/// The top-level configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PulsenetConfig {
    /// Number of button presses to tally.
    #[serde(default = "default_presses")]
    pub presses: u64,

    /// The node whose first LOW delivery the terminator searches for.
    #[serde(default = "default_target")]
    pub target: String,

    /// Maximum number of presses the extrapolator simulates before giving up
    /// on finding a repeated state.
    #[serde(default = "default_cycle_search_limit")]
    pub cycle_search_limit: u64,

    /// Maximum number of presses the terminator scans.
    #[serde(default = "default_watch_search_limit")]
    pub watch_search_limit: u64,

    /// Maximum number of events a single drain may process.
    #[serde(default = "default_drain_step_ceiling")]
    pub drain_step_ceiling: u64,

    /// Filter directive handed to the tracing subscriber (e.g. "debug").
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl PulsenetConfig {
    /// Loads the configuration from an optional TOML file, layered with
    /// `PULSENET_*` environment variables. Missing keys fall back to their
    /// defaults.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }
        let config = builder
            .add_source(Environment::with_prefix("PULSENET"))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

// --- Default value functions for serde ---

fn default_presses() -> u64 {
    1000
}

fn default_target() -> String {
    "rx".to_string()
}

fn default_cycle_search_limit() -> u64 {
    100_000
}

fn default_watch_search_limit() -> u64 {
    1_000_000
}

fn default_drain_step_ceiling() -> u64 {
    1_000_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PulsenetConfig {
    fn default() -> Self {
        Self {
            presses: default_presses(),
            target: default_target(),
            cycle_search_limit: default_cycle_search_limit(),
            watch_search_limit: default_watch_search_limit(),
            drain_step_ceiling: default_drain_step_ceiling(),
            log_level: default_log_level(),
        }
    }
}
