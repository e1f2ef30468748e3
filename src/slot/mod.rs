//! Algorithm slots.
//!
//! A slot is one configured analysis in the portfolio. It owns its time
//! limit, its cumulative stopwatch, the latest progress measurement and a
//! lazily created engine. Slots are plain data: the scheduler that owns them
//! decides when they run and for how long.

mod annotation;
mod engine;
mod options;
mod stopwatch;
mod types;

pub use annotation::{parse_annotation, ReuseMode, DEFAULT_TIME_LIMIT};
pub use engine::{EngineFactory, RuntimeEngine};
pub use options::EngineOptions;
pub use stopwatch::Stopwatch;
pub use types::{SlotId, SlotSpec, TargetId};

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

/// Progress value meaning "not measured since the last reset".
pub const UNMEASURED: f64 = -1.0;

pub struct AlgorithmSlot {
    id: SlotId,
    config: PathBuf,
    reuse_mode: ReuseMode,
    time_limit: u32,
    stopwatch: Stopwatch,
    progress: f64,
    progressed_targets: Vec<TargetId>,
    engine: Option<Box<dyn RuntimeEngine>>,
    coverage_targets: Option<HashSet<TargetId>>,
    dispatches: u64,
}

impl AlgorithmSlot {
    /// Build a slot from a configuration reference and optional annotation.
    ///
    /// Malformed annotations never fail; see [`parse_annotation`].
    pub fn from_annotation(config: impl Into<PathBuf>, annotation: Option<&str>) -> Self {
        let config = config.into();
        let (reuse_mode, time_limit) = parse_annotation(annotation);
        Self {
            id: SlotId::from_path(&config),
            config,
            reuse_mode,
            time_limit,
            stopwatch: Stopwatch::new(),
            progress: UNMEASURED,
            progressed_targets: Vec::new(),
            engine: None,
            coverage_targets: None,
            dispatches: 0,
        }
    }

    pub fn from_spec(spec: &SlotSpec) -> Self {
        Self::from_annotation(spec.config.clone(), spec.annotation.as_deref())
    }

    pub fn id(&self) -> &SlotId {
        &self.id
    }

    pub fn config_path(&self) -> &Path {
        &self.config
    }

    pub fn reuse_mode(&self) -> ReuseMode {
        self.reuse_mode
    }

    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    /// Set the time limit, raised to [`DEFAULT_TIME_LIMIT`] if lower.
    pub fn adapt_time_limit(&mut self, new_limit: i64) {
        self.time_limit = new_limit.clamp(i64::from(DEFAULT_TIME_LIMIT), i64::from(u32::MAX)) as u32;
    }

    /// Mark progress unmeasured and drop coverage feedback from the last run.
    pub fn reset_progress(&mut self) {
        self.progress = UNMEASURED;
        self.progressed_targets.clear();
    }

    /// Record a progress measurement.
    ///
    /// Values are clamped to `[0, 1]`. Negative or NaN input marks the slot
    /// unmeasured.
    pub fn set_progress(&mut self, progress: f64) {
        self.progress = if progress.is_nan() || progress < 0.0 {
            UNMEASURED
        } else {
            progress.min(1.0)
        };
    }

    /// Latest progress, or [`UNMEASURED`].
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn measured_progress(&self) -> Option<f64> {
        (self.progress >= 0.0).then_some(self.progress)
    }

    /// Pull a fresh progress measurement from the engine, if one exists.
    pub fn refresh_progress(&mut self) -> Option<f64> {
        let fraction = self.engine.as_ref()?.progress_fraction();
        self.set_progress(fraction);
        self.measured_progress()
    }

    /// Targets newly covered during the last run.
    pub fn progressed_targets(&self) -> &[TargetId] {
        &self.progressed_targets
    }

    pub fn record_progressed_targets(&mut self, targets: impl IntoIterator<Item = TargetId>) {
        self.progressed_targets.extend(targets);
    }

    pub fn start_timer(&mut self) {
        self.stopwatch.start();
    }

    pub fn stop_timer(&mut self) {
        self.stopwatch.stop();
    }

    #[cfg(test)]
    pub(crate) fn is_timing(&self) -> bool {
        self.stopwatch.is_running()
    }

    pub fn total_time_spent(&self) -> Duration {
        self.stopwatch.elapsed()
    }

    /// Number of times a scheduler handed out this slot.
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    pub(crate) fn mark_dispatched(&mut self) {
        self.dispatches += 1;
    }

    /// Attach an already constructed engine, replacing any existing one.
    ///
    /// Targets listed by the previous engine are forgotten.
    pub fn set_runtime_handle(&mut self, engine: Box<dyn RuntimeEngine>) {
        self.engine = Some(engine);
        self.coverage_targets = None;
    }

    pub fn runtime_handle(&self) -> Option<&dyn RuntimeEngine> {
        self.engine.as_deref()
    }

    /// Return the slot's engine, creating it on first success.
    ///
    /// Creation builds an isolated option map (see [`EngineOptions::isolated`])
    /// and hands it to `factory`. Failures are logged and reported as `None`;
    /// the next call tries again.
    pub fn get_or_create_runtime_handle(
        &mut self,
        global: &EngineOptions,
        scheduler_keys: &[String],
        factory: &dyn EngineFactory,
    ) -> Option<&dyn RuntimeEngine> {
        if self.engine.is_none() {
            let options = match EngineOptions::isolated(global, scheduler_keys, &self.config) {
                Ok(options) => options,
                Err(e) => {
                    warn!(%e, slot = %self.id, "failed to load slot options");
                    return None;
                }
            };
            info!(slot = %self.id, options = options.len(), "loaded slot options");

            match factory.create(&self.id, &options) {
                Ok(engine) => {
                    debug!(slot = %self.id, "created runtime engine");
                    self.engine = Some(engine);
                }
                Err(e) => {
                    warn!(%e, slot = %self.id, "failed to create runtime engine");
                    return None;
                }
            }
        }
        self.engine.as_deref()
    }

    /// Targets the slot's engine still has open.
    ///
    /// Re-read from the engine on every call so covered targets drop out. If
    /// the engine cannot list them right now, the last listed set is returned.
    pub fn try_get_coverage_targets(&mut self) -> Option<&HashSet<TargetId>> {
        if let Some(open) = self.engine.as_ref().and_then(|e| e.coverage_targets()) {
            self.coverage_targets = Some(open);
        }
        self.coverage_targets.as_ref()
    }

    pub fn wants_engine_reuse(&self) -> bool {
        self.reuse_mode.wants_engine_reuse()
    }

    pub fn wants_own_precision_reuse(&self) -> bool {
        self.reuse_mode.wants_own_precision_reuse()
    }

    pub fn wants_predecessor_precision_reuse(&self) -> bool {
        self.reuse_mode.wants_predecessor_precision_reuse()
    }

    pub fn wants_precision_reuse(&self) -> bool {
        self.reuse_mode.wants_precision_reuse()
    }
}

impl fmt::Debug for AlgorithmSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmSlot")
            .field("id", &self.id)
            .field("reuse_mode", &self.reuse_mode)
            .field("time_limit", &self.time_limit)
            .field("progress", &self.progress)
            .field("total_time_spent", &self.stopwatch.elapsed())
            .field("has_engine", &self.engine.is_some())
            .finish()
    }
}
