//! External decision sources for the controlled scheduler.
//!
//! A controller picks which slot runs next and for how long, then learns from
//! the progress the previous run reported. Transport to out-of-process
//! controllers is left to implementations of [`Controller`].

mod random;
mod replay;

pub use random::RandomController;
pub use replay::ReplayController;

use crate::slot::{SlotId, TargetId};
use crate::time_dist::TimeDistribution;

/// A scheduling decision: run `slot` for at most `time_limit` seconds.
///
/// The scheduler clamps `time_limit` to its per-slot maximum and raises it to
/// the slot floor before applying it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub slot: SlotId,
    pub time_limit: u32,
}

impl Decision {
    pub fn new(slot: impl Into<SlotId>, time_limit: u32) -> Self {
        Self {
            slot: slot.into(),
            time_limit,
        }
    }
}

/// The decision-maker behind [`BaseScheduler`](crate::scheduler::BaseScheduler).
pub trait Controller {
    /// Called once with the distinct slot identifiers and the time menu.
    fn init(&mut self, identifiers: &[SlotId], time_menu: &TimeDistribution);

    fn has_next_decision(&mut self) -> bool;

    /// The next decision, or `None` if the controller is exhausted.
    fn next_decision(&mut self) -> Option<Decision>;

    /// Feedback about the previously dispatched slot.
    ///
    /// `progress` is `-1.0` if the slot never reported a measurement.
    fn report_progress(&mut self, progress: f64, time_limit: u32);

    /// Targets the previous slot newly covered. Ignored by default.
    fn report_coverage(&mut self, _covered: &[TargetId]) {}
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn init(&mut self, identifiers: &[SlotId], time_menu: &TimeDistribution) {
        (**self).init(identifiers, time_menu)
    }

    fn has_next_decision(&mut self) -> bool {
        (**self).has_next_decision()
    }

    fn next_decision(&mut self) -> Option<Decision> {
        (**self).next_decision()
    }

    fn report_progress(&mut self, progress: f64, time_limit: u32) {
        (**self).report_progress(progress, time_limit)
    }

    fn report_coverage(&mut self, covered: &[TargetId]) {
        (**self).report_coverage(covered)
    }
}
