use anyhow::{anyhow, bail, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Tunable constants of the posterior engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Monte Carlo draws per arm.
    pub sample_size: usize,
    pub histogram_bins: usize,
    /// Points of the analytic curve, at `i / grid_points`.
    pub grid_points: usize,
    /// Height of the taller analytic curve after display normalization.
    pub display_ceiling: f64,
    /// Decay rate of the heuristic superiority formula.
    pub heuristic_scale: f64,
    /// Fixed seed for reproducible sampling; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_size: 10_000,
            histogram_bins: 50,
            grid_points: 100,
            display_ceiling: 0.8,
            heuristic_scale: 10.0,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| anyhow!("Could not open config file: {} ({})", path.display(), e))?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| anyhow!("Could not parse config file {}: {}", path.display(), e))?;
        debug!("Loaded engine config: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            bail!("sample_size must be at least 1");
        }
        if self.histogram_bins == 0 {
            bail!("histogram_bins must be at least 1");
        }
        if self.grid_points == 0 {
            bail!("grid_points must be at least 1");
        }
        if !(self.display_ceiling.is_finite() && self.display_ceiling > 0.0) {
            bail!("display_ceiling must be positive, got {}", self.display_ceiling);
        }
        if !(self.heuristic_scale.is_finite() && self.heuristic_scale > 0.0) {
            bail!("heuristic_scale must be positive, got {}", self.heuristic_scale);
        }
        Ok(())
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
