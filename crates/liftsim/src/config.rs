// Simulation configuration: built-in defaults, optional TOML file, CLI overrides

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use lift_rl_core::AgentConfig;
use lift_rl_env::ElevatorEnvConfig;

/// Driver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Seed for the scenario and policy random sources; entropy when absent
    pub seed: Option<u64>,
    /// Stop after this many ticks; run until quit when absent
    pub max_steps: Option<usize>,
    /// Wall-clock time between ticks
    pub tick_interval_ms: u64,
    /// Log running statistics every this many ticks (0 disables)
    pub log_interval: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_steps: None,
            tick_interval_ms: 1000,
            log_interval: 10,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Building, cost model and feature scales
    pub env: ElevatorEnvConfig,
    /// Learning rates and discount
    pub agent: AgentConfig,
    /// Driver settings
    pub run: RunConfig,
}

impl SimConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse configuration")
    }

    /// Load from `path`, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::from_toml(&text).with_context(|| format!("In {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.env.building.validate()?;
        self.env.costs.validate()?;
        self.env.scales.validate()?;
        self.agent.validate()?;
        if self.run.tick_interval_ms == 0 {
            bail!("tick_interval_ms must be positive");
        }
        if self.run.max_steps == Some(0) {
            bail!("max_steps must be positive when set");
        }
        Ok(())
    }
}
