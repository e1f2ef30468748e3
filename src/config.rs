//! Configuration types for portfolio scheduling.

use std::path::PathBuf;

use prometheus::Registry;
use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, Result};
use crate::scheduler::RebalanceKnobs;
use crate::slot::SlotSpec;
use crate::time_dist::{TimeDistribution, TimeScale};

/// Configuration for a portfolio scheduler.
///
/// This struct can be deserialized from TOML, YAML, JSON, or environment variables
/// using figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortfolioConfig {
    /// Slots in round-robin order.
    #[serde(default)]
    pub slots: Vec<SlotSpec>,

    /// Spacing of the time menu offered to controllers (default: uniform)
    #[serde(default)]
    pub time_scale: TimeScale,

    /// Time menu granularity in seconds (default: 20)
    #[serde(default = "default_granularity")]
    pub granularity: u32,

    /// Cap on any single time limit a controller may assign (default: 100)
    #[serde(default = "default_max_time_per_slot")]
    pub max_time_per_slot: u32,

    /// Reallocation knobs for the adaptive scheduler.
    #[serde(default)]
    pub rebalance: RebalanceKnobs,

    /// Global option keys that configure the scheduler itself and must not
    /// leak into per-slot engine options.
    #[serde(default = "default_scheduler_keys")]
    pub scheduler_keys: Vec<String>,

    /// Token-frequency model files, by slot position. Missing entries start
    /// from an empty model.
    #[serde(default)]
    pub model_files: Vec<PathBuf>,

    /// Metric name prefix (default: "portfolio")
    #[serde(default = "default_metrics_prefix")]
    pub metrics_prefix: String,

    /// Prometheus registry for metrics exposition.
    /// Not serializable - must be set programmatically.
    #[serde(skip)]
    pub prometheus_registry: Option<Registry>,
}

fn default_granularity() -> u32 {
    20
}

fn default_max_time_per_slot() -> u32 {
    100
}

fn default_scheduler_keys() -> Vec<String> {
    vec!["portfolio.slots".to_string(), "analysis.usePortfolio".to_string()]
}

fn default_metrics_prefix() -> String {
    "portfolio".to_string()
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            time_scale: TimeScale::default(),
            granularity: default_granularity(),
            max_time_per_slot: default_max_time_per_slot(),
            rebalance: RebalanceKnobs::default(),
            scheduler_keys: default_scheduler_keys(),
            model_files: Vec::new(),
            metrics_prefix: default_metrics_prefix(),
            prometheus_registry: None,
        }
    }
}

impl PortfolioConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check values that deserialize fine but cannot drive a scheduler.
    pub fn validate(&self) -> Result<()> {
        if self.granularity == 0 {
            return Err(PortfolioError::InvalidConfig(
                "granularity must be positive".to_string(),
            ));
        }
        if self.max_time_per_slot == 0 {
            return Err(PortfolioError::InvalidConfig(
                "max_time_per_slot must be positive".to_string(),
            ));
        }
        if self.rebalance.sample_size == 0 {
            return Err(PortfolioError::InvalidConfig(
                "rebalance.sample_size must be positive".to_string(),
            ));
        }
        if self.rebalance.max_path_length == 0 {
            return Err(PortfolioError::InvalidConfig(
                "rebalance.max_path_length must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The time menu described by `time_scale`, `max_time_per_slot` and `granularity`.
    pub fn time_menu(&self) -> Result<TimeDistribution> {
        TimeDistribution::new(self.time_scale, self.max_time_per_slot, self.granularity)
    }
}
