//! # portfolio-rs
//!
//! **Many analyses, one time budget**
//!
//! An adaptive algorithm-portfolio scheduler. A portfolio is an ordered set of
//! analysis configurations ("slots"). The scheduler repeatedly picks a slot,
//! gives it a time limit, lets it run, and learns from the progress it reports.
//!
//! ## Features
//!
//! - **Controlled scheduling**: an external [`Controller`] picks every (slot, time limit)
//!   pair from a uniform or exponential time menu
//! - **Adaptive scheduling**: round-robin with Bayesian reallocation of the time budget
//!   between rounds, driven by per-slot [`StatisticalModel`]s
//! - **Annotated slots**: `continue_30`, `reuse-own-precision_45`, ... select state reuse
//!   and an initial time limit
//! - **Isolated engine options**: each slot's engine sees the global options minus
//!   scheduler keys, overlaid with its own configuration file
//! - **Flexible Configuration**: files (TOML/YAML/JSON), environment variables, code, or CLI
//! - **Prometheus metrics**: dispatches, rounds, reallocations and per-slot limits
//!
//! ## Quick Start
//!
//! ```ignore
//! use portfolio_rs::{drive, PortfolioBuilder, RandomController, RunStatus};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scheduler = PortfolioBuilder::new()
//!         .slot("predicate.toml", Some("reuse-own-precision_40"))
//!         .slot("value.toml", Some("continue"))
//!         .build_controlled(RandomController::new())?;
//!
//!     let mut runner = |slot: &mut portfolio_rs::AlgorithmSlot| {
//!         // Run the analysis for at most slot.time_limit() seconds
//!         slot.set_progress(0.5);
//!         Ok(RunStatus::Continue)
//!     };
//!     drive(&mut scheduler, &mut runner, 100)?;
//!
//!     println!("{}", scheduler.report());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Configuration sources are merged in order (later sources override earlier):
//!
//! 1. Default values
//! 2. Config files (via `.file()`)
//! 3. Environment variables (via `.env_prefix()`)
//! 4. Programmatic overrides
//! 5. CLI arguments (via `.with_cli_args()`)
//!
//! ### Config File Example (TOML)
//!
//! ```toml
//! time_scale = "exponential"
//! granularity = 20
//! max_time_per_slot = 100
//!
//! [[slots]]
//! config = "predicate.toml"
//! annotation = "reuse-own-precision_40"
//!
//! [[slots]]
//! config = "value.toml"
//!
//! [rebalance]
//! sample_size = 10
//! max_path_length = 512
//! ```
//!
//! ### Environment Variables
//!
//! With `.env_prefix("PORTFOLIO")`:
//! - `PORTFOLIO_GRANULARITY=10`
//! - `PORTFOLIO_TIME_SCALE=exponential`
//! - `PORTFOLIO_REBALANCE__SAMPLE_SIZE=20`
//!
//! ## Time Limits
//!
//! Every slot limit is at least [`DEFAULT_TIME_LIMIT`] seconds. Controller proposals are
//! capped at `max_time_per_slot`. Reallocation only moves the seconds above the floor.

pub mod builder;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod model;
pub mod portfolio;
pub mod scheduler;
pub mod slot;
pub mod time_dist;

pub use builder::{PortfolioArgs, PortfolioBuilder};
pub use config::PortfolioConfig;
pub use controller::{Controller, Decision, RandomController, ReplayController};
pub use driver::{drive, DriveSummary, RunStatus, SlotRunner};
pub use error::{PortfolioError, Result};
pub use metrics::PortfolioMetrics;
pub use model::{PathSampler, PathStatistic, StatisticalModel, TokenFrequencyModel};
pub use portfolio::Portfolio;
pub use scheduler::{
    AdaptiveScheduler, BaseScheduler, RebalanceKnobs, RebalanceOutcome, ScheduleReport,
    SkipReason, SlotScheduler,
};
pub use slot::{
    AlgorithmSlot, EngineFactory, EngineOptions, ReuseMode, RuntimeEngine, SlotId, SlotSpec,
    TargetId, DEFAULT_TIME_LIMIT,
};
pub use time_dist::{TimeDistribution, TimeScale};
