//! Builder pattern for constructing portfolio schedulers.
//!
//! The builder supports multiple configuration sources using figment:
//! - Default values
//! - Config files (TOML, YAML, JSON)
//! - Environment variables
//! - Programmatic overrides
//! - CLI arguments via clap

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use prometheus::Registry;
use tracing::info;

use crate::config::PortfolioConfig;
use crate::controller::Controller;
use crate::error::Result;
use crate::metrics::PortfolioMetrics;
use crate::model::{PathSampler, StatisticalModel, TokenFrequencyModel};
use crate::portfolio::Portfolio;
use crate::scheduler::{AdaptiveScheduler, BaseScheduler, RebalanceKnobs};
use crate::slot::{SlotId, SlotSpec};
use crate::time_dist::TimeScale;

/// Builder for portfolio schedulers.
///
/// Configuration sources are merged in the following order (later sources override earlier):
/// 1. Default values
/// 2. Config files (in order added)
/// 3. Environment variables
/// 4. Programmatic overrides
/// 5. CLI arguments
///
/// # Examples
///
/// ```ignore
/// use portfolio_rs::{PortfolioBuilder, RandomController};
///
/// let scheduler = PortfolioBuilder::new()
///     .file("portfolio.toml")
///     .env_prefix("PORTFOLIO")
///     .slot("predicate.toml", Some("reuse-own-precision_40"))
///     .slot("value.toml", None)
///     .build_controlled(RandomController::new())?;
/// ```
pub struct PortfolioBuilder {
    figment: Figment,
    slots: Vec<SlotSpec>,
    prometheus_registry: Option<Registry>,
}

impl Default for PortfolioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PortfolioBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioBuilder")
            .field("figment", &self.figment)
            .field("slots", &self.slots)
            .field(
                "prometheus_registry",
                &self.prometheus_registry.as_ref().map(|_| "<Registry>"),
            )
            .finish()
    }
}

impl PortfolioBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(PortfolioConfig::default())),
            slots: Vec::new(),
            prometheus_registry: None,
        }
    }

    /// Add a configuration file.
    ///
    /// Supports TOML, YAML, and JSON formats (detected by extension).
    /// Files are merged in the order they are added.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        self.figment = match extension.to_lowercase().as_str() {
            "yaml" | "yml" => self.figment.merge(Yaml::file(path)),
            "json" => self.figment.merge(Json::file(path)),
            _ => self.figment.merge(Toml::file(path)),
        };
        self
    }

    /// Add environment variables with a prefix.
    ///
    /// Variables are read as `{PREFIX}_{KEY}`, e.g. `PORTFOLIO_GRANULARITY`.
    /// Nested keys use a double underscore: `PORTFOLIO_REBALANCE__SAMPLE_SIZE`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.figment = self
            .figment
            .merge(Env::prefixed(&format!("{}_", prefix)).split("__"));
        self
    }

    /// Append a slot. Slots run in the order they are added.
    ///
    /// Programmatic slots replace any slot list from files or the environment.
    pub fn slot(mut self, config: impl AsRef<Path>, annotation: Option<&str>) -> Self {
        self.slots.push(SlotSpec {
            config: config.as_ref().to_path_buf(),
            annotation: annotation.map(str::to_string),
        });
        self.figment = self
            .figment
            .merge(Serialized::default("slots", &self.slots));
        self
    }

    pub fn slots(self, specs: impl IntoIterator<Item = SlotSpec>) -> Self {
        specs.into_iter().fold(self, |builder, spec| {
            builder.slot(&spec.config, spec.annotation.as_deref())
        })
    }

    /// Set the spacing of the time menu.
    pub fn time_scale(mut self, scale: TimeScale) -> Self {
        self.figment = self.figment.merge(Serialized::default("time_scale", scale));
        self
    }

    /// Set the time menu granularity in seconds.
    ///
    /// Default is 20.
    pub fn granularity(mut self, seconds: u32) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("granularity", seconds));
        self
    }

    /// Cap any single time limit a controller may assign.
    ///
    /// Default is 100.
    pub fn max_time_per_slot(mut self, seconds: u32) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("max_time_per_slot", seconds));
        self
    }

    /// Set the reallocation knobs. See [`RebalanceKnobs`] for details.
    pub fn rebalance_knobs(mut self, knobs: RebalanceKnobs) -> Self {
        self.figment = self.figment.merge(Serialized::default("rebalance", knobs));
        self
    }

    /// Seed target sampling for reproducible reallocation.
    pub fn seed(mut self, seed: u64) -> Self {
        self.figment = self.figment.merge(Serialized::default(
            "rebalance",
            BTreeMap::from([("seed", seed)]),
        ));
        self
    }

    /// Global option keys withheld from per-slot engine options.
    pub fn scheduler_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        self.figment = self
            .figment
            .merge(Serialized::default("scheduler_keys", keys));
        self
    }

    /// Set the metric name prefix.
    pub fn metrics_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("metrics_prefix", prefix.into()));
        self
    }

    /// Provide an external Prometheus registry for metrics exposition.
    pub fn prometheus_registry(mut self, registry: Registry) -> Self {
        self.prometheus_registry = Some(registry);
        self
    }

    /// Apply CLI argument overrides.
    ///
    /// This method applies any non-None values from the `PortfolioArgs` struct.
    pub fn with_cli_args(mut self, args: &PortfolioArgs) -> Self {
        if !args.portfolio_slot.is_empty() {
            let slots: Vec<SlotSpec> = args
                .portfolio_slot
                .iter()
                .map(|s| SlotSpec::parse_annotated(s))
                .collect();
            self.figment = self.figment.merge(Serialized::default("slots", &slots));
            self.slots = slots;
        }
        if let Some(scale) = args.portfolio_time_scale {
            self.figment = self.figment.merge(Serialized::default("time_scale", scale));
        }
        if let Some(granularity) = args.portfolio_granularity {
            self.figment = self
                .figment
                .merge(Serialized::default("granularity", granularity));
        }
        if let Some(max) = args.portfolio_max_time_per_slot {
            self.figment = self
                .figment
                .merge(Serialized::default("max_time_per_slot", max));
        }
        if let Some(sample_size) = args.portfolio_sample_size {
            self.figment = self.figment.merge(Serialized::default(
                "rebalance",
                BTreeMap::from([("sample_size", sample_size)]),
            ));
        }
        if let Some(seed) = args.portfolio_seed {
            self.figment = self.figment.merge(Serialized::default(
                "rebalance",
                BTreeMap::from([("seed", seed)]),
            ));
        }
        if let Some(ref prefix) = args.portfolio_metrics_prefix {
            self.figment = self
                .figment
                .merge(Serialized::default("metrics_prefix", prefix.clone()));
        }
        self
    }

    /// Extract and validate the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction fails or a value cannot drive a scheduler.
    pub fn build_config(self) -> Result<PortfolioConfig> {
        let mut config: PortfolioConfig = self.figment.extract().map_err(Box::new)?;
        config.validate()?;
        config.prometheus_registry = self.prometheus_registry;
        Ok(config)
    }

    /// Build a controller-driven scheduler over the configured slots.
    pub fn build_controlled<C: Controller>(self, controller: C) -> Result<BaseScheduler<C>> {
        let config = self.build_config()?;
        let portfolio = Portfolio::from_specs(&config.slots)?;
        let metrics = metrics_for(&config)?;
        info!(slots = portfolio.len(), "built controlled portfolio scheduler");
        Ok(BaseScheduler::new(portfolio, controller, &config)?.with_metrics(metrics))
    }

    /// Build an adaptive round-robin scheduler with the given per-slot models.
    pub fn build_adaptive<S: PathSampler>(
        self,
        models: HashMap<SlotId, Arc<dyn StatisticalModel>>,
        sampler: S,
    ) -> Result<AdaptiveScheduler<S>> {
        let config = self.build_config()?;
        let portfolio = Portfolio::from_specs(&config.slots)?;
        let metrics = metrics_for(&config)?;
        info!(
            slots = portfolio.len(),
            models = models.len(),
            "built adaptive portfolio scheduler"
        );
        Ok(AdaptiveScheduler::new(portfolio, models, sampler, &config)?.with_metrics(metrics))
    }

    /// Build an adaptive scheduler whose models come from `model_files`.
    ///
    /// The i-th file seeds the model of the i-th slot. Slots beyond the list
    /// start with an empty [`TokenFrequencyModel`].
    pub fn build_adaptive_from_files<S: PathSampler>(
        self,
        sampler: S,
    ) -> Result<AdaptiveScheduler<S>> {
        let config = self.build_config()?;
        let knobs = &config.rebalance;

        let mut models: HashMap<SlotId, Arc<dyn StatisticalModel>> = HashMap::new();
        for (position, spec) in config.slots.iter().enumerate() {
            let model = match config.model_files.get(position) {
                Some(file) => {
                    TokenFrequencyModel::load_file(file, knobs.ngram_size, knobs.set_based)?
                }
                None => TokenFrequencyModel::new(knobs.ngram_size, knobs.set_based),
            };
            models.insert(SlotId::from_path(&spec.config), Arc::new(model));
        }

        let portfolio = Portfolio::from_specs(&config.slots)?;
        let metrics = metrics_for(&config)?;
        Ok(AdaptiveScheduler::new(portfolio, models, sampler, &config)?.with_metrics(metrics))
    }
}

fn metrics_for(config: &PortfolioConfig) -> Result<PortfolioMetrics> {
    let metrics = PortfolioMetrics::with_prefix(&config.metrics_prefix);
    if let Some(registry) = &config.prometheus_registry {
        metrics.register(registry)?;
    }
    Ok(metrics)
}

/// CLI arguments for portfolio configuration.
///
/// Use with clap's `Parser` derive macro. These arguments can be applied
/// to a `PortfolioBuilder` using `with_cli_args`.
///
/// # Examples
///
/// ```ignore
/// use clap::Parser;
/// use portfolio_rs::{PortfolioArgs, PortfolioBuilder};
///
/// #[derive(Parser)]
/// struct MyArgs {
///     #[command(flatten)]
///     portfolio: PortfolioArgs,
/// }
///
/// let args = MyArgs::parse();
/// let config = PortfolioBuilder::new()
///     .with_cli_args(&args.portfolio)
///     .build_config()?;
/// ```
#[derive(Debug, Default, Clone, clap::Args)]
pub struct PortfolioArgs {
    /// Slot configuration as `path` or `path::annotation` (repeatable)
    #[arg(long)]
    pub portfolio_slot: Vec<String>,

    /// Time menu spacing
    #[arg(long, value_enum)]
    pub portfolio_time_scale: Option<TimeScale>,

    /// Time menu granularity in seconds
    #[arg(long)]
    pub portfolio_granularity: Option<u32>,

    /// Cap on any single time limit in seconds
    #[arg(long)]
    pub portfolio_max_time_per_slot: Option<u32>,

    /// Targets sampled per reallocation pass
    #[arg(long)]
    pub portfolio_sample_size: Option<usize>,

    /// Seed for reallocation sampling
    #[arg(long)]
    pub portfolio_seed: Option<u64>,

    /// Metric name prefix
    #[arg(long)]
    pub portfolio_metrics_prefix: Option<String>,
}
