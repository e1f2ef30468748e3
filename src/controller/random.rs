//! Uniform random controller.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{Controller, Decision};
use crate::slot::SlotId;
use crate::time_dist::TimeDistribution;

/// Picks a uniformly random (slot, menu entry) pair on every decision.
///
/// Never exhausts once initialized with at least one slot and one menu entry.
/// Feedback is ignored.
#[derive(Debug)]
pub struct RandomController {
    identifiers: Vec<SlotId>,
    menu: Vec<u32>,
    rng: SmallRng,
}

impl RandomController {
    pub fn new() -> Self {
        Self::from_rng(SmallRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(SmallRng::seed_from_u64(seed))
    }

    fn from_rng(rng: SmallRng) -> Self {
        Self {
            identifiers: Vec::new(),
            menu: Vec::new(),
            rng,
        }
    }
}

impl Default for RandomController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for RandomController {
    fn init(&mut self, identifiers: &[SlotId], time_menu: &TimeDistribution) {
        self.identifiers = identifiers.to_vec();
        self.menu = time_menu.offers().to_vec();
    }

    fn has_next_decision(&mut self) -> bool {
        !self.identifiers.is_empty() && !self.menu.is_empty()
    }

    fn next_decision(&mut self) -> Option<Decision> {
        if !self.has_next_decision() {
            return None;
        }
        let k = self.rng.gen_range(0..self.identifiers.len() * self.menu.len());
        let slot = self.identifiers[k / self.menu.len()].clone();
        let time_limit = self.menu[k % self.menu.len()];
        Some(Decision { slot, time_limit })
    }

    fn report_progress(&mut self, _progress: f64, _time_limit: u32) {}
}
