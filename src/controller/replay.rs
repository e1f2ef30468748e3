//! Scripted controller that replays a fixed decision list.

use std::collections::VecDeque;

use super::{Controller, Decision};
use crate::slot::{SlotId, TargetId};
use crate::time_dist::TimeDistribution;

/// Replays decisions in order and records all feedback it receives.
///
/// Useful for tests and for re-running a schedule captured from another
/// controller.
#[derive(Debug, Default)]
pub struct ReplayController {
    pending: VecDeque<Decision>,
    identifiers: Vec<SlotId>,
    menu: Vec<u32>,
    progress_reports: Vec<(f64, u32)>,
    coverage_reports: Vec<Vec<TargetId>>,
}

impl ReplayController {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            pending: decisions.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Identifiers received in `init`.
    pub fn identifiers(&self) -> &[SlotId] {
        &self.identifiers
    }

    /// Time menu received in `init`.
    pub fn menu(&self) -> &[u32] {
        &self.menu
    }

    /// `(progress, time_limit)` pairs in the order they were reported.
    pub fn progress_reports(&self) -> &[(f64, u32)] {
        &self.progress_reports
    }

    pub fn coverage_reports(&self) -> &[Vec<TargetId>] {
        &self.coverage_reports
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl Controller for ReplayController {
    fn init(&mut self, identifiers: &[SlotId], time_menu: &TimeDistribution) {
        self.identifiers = identifiers.to_vec();
        self.menu = time_menu.offers().to_vec();
    }

    fn has_next_decision(&mut self) -> bool {
        !self.pending.is_empty()
    }

    fn next_decision(&mut self) -> Option<Decision> {
        self.pending.pop_front()
    }

    fn report_progress(&mut self, progress: f64, time_limit: u32) {
        self.progress_reports.push((progress, time_limit));
    }

    fn report_coverage(&mut self, covered: &[TargetId]) {
        self.coverage_reports.push(covered.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_then_exhausts() {
        let mut controller = ReplayController::new([
            Decision::new("a.toml", 20),
            Decision::new("b.toml", 40),
        ]);

        assert!(controller.has_next_decision());
        assert_eq!(controller.next_decision(), Some(Decision::new("a.toml", 20)));
        assert_eq!(controller.next_decision(), Some(Decision::new("b.toml", 40)));
        assert!(!controller.has_next_decision());
        assert_eq!(controller.next_decision(), None);
    }

    #[test]
    fn test_records_feedback() {
        let mut controller = ReplayController::new([]);
        controller.report_progress(0.5, 20);
        controller.report_coverage(&[TargetId(3)]);

        assert_eq!(controller.progress_reports(), &[(0.5, 20)]);
        assert_eq!(controller.coverage_reports(), &[vec![TargetId(3)]]);
    }
}
