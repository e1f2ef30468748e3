//! Seams to the analysis engine the scheduler drives.
//!
//! The engine itself is external. A slot only needs to create one lazily and
//! ask it for its coverage targets and an estimate of progress.

use std::collections::HashSet;

use crate::error::Result;
use crate::slot::{EngineOptions, SlotId, TargetId};

/// A constructed analysis engine bound to one slot.
pub trait RuntimeEngine {
    /// The targets this engine tries to cover, or `None` if they cannot be
    /// determined yet.
    fn coverage_targets(&self) -> Option<HashSet<TargetId>>;

    /// Fraction of the engine's work completed so far, in `[0, 1]`.
    fn progress_fraction(&self) -> f64;
}

/// Builds engines from a slot's isolated option map.
pub trait EngineFactory {
    fn create(&self, slot: &SlotId, options: &EngineOptions) -> Result<Box<dyn RuntimeEngine>>;
}

impl<F> EngineFactory for F
where
    F: Fn(&SlotId, &EngineOptions) -> Result<Box<dyn RuntimeEngine>>,
{
    fn create(&self, slot: &SlotId, options: &EngineOptions) -> Result<Box<dyn RuntimeEngine>> {
        self(slot, options)
    }
}
