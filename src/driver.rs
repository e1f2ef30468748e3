//! A cooperative run loop over any [`SlotScheduler`].
//!
//! The loop times each dispatch on the slot's stopwatch and stops when the
//! runner reports completion, the scheduler has nothing left, or the dispatch
//! budget is spent.

use tracing::{debug, info};

use crate::error::Result;
use crate::scheduler::SlotScheduler;
use crate::slot::{AlgorithmSlot, SlotId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The slot used its time; keep scheduling.
    Continue,
    /// The slot produced a final answer.
    Done,
}

/// Runs one dispatched slot for at most its time limit.
///
/// Runners write back progress through [`AlgorithmSlot::set_progress`] or
/// [`AlgorithmSlot::refresh_progress`] before returning.
pub trait SlotRunner {
    fn run(&mut self, slot: &mut AlgorithmSlot) -> Result<RunStatus>;
}

impl<F> SlotRunner for F
where
    F: FnMut(&mut AlgorithmSlot) -> Result<RunStatus>,
{
    fn run(&mut self, slot: &mut AlgorithmSlot) -> Result<RunStatus> {
        self(slot)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriveSummary {
    pub dispatches: u64,
    /// The slot whose run returned [`RunStatus::Done`], if any.
    pub finished_by: Option<SlotId>,
}

/// Drive `scheduler` until a runner finishes or `max_dispatches` is reached.
///
/// # Errors
///
/// Propagates scheduler protocol errors and runner failures. The failing
/// slot's stopwatch is stopped before returning.
pub fn drive<S, R>(scheduler: &mut S, runner: &mut R, max_dispatches: u64) -> Result<DriveSummary>
where
    S: SlotScheduler + ?Sized,
    R: SlotRunner + ?Sized,
{
    let mut dispatches = 0;
    while dispatches < max_dispatches && scheduler.has_next() {
        let slot = scheduler.next()?;
        dispatches += 1;

        slot.start_timer();
        let status = runner.run(slot);
        slot.stop_timer();

        if status? == RunStatus::Done {
            info!(slot = %slot.id(), dispatches, "slot finished the task");
            return Ok(DriveSummary {
                dispatches,
                finished_by: Some(slot.id().clone()),
            });
        }
        debug!(slot = %slot.id(), progress = slot.progress(), "slot yielded");
    }

    Ok(DriveSummary {
        dispatches,
        finished_by: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortfolioConfig;
    use crate::controller::{Decision, ReplayController};
    use crate::error::PortfolioError;
    use crate::portfolio::Portfolio;
    use crate::scheduler::BaseScheduler;
    use crate::slot::SlotSpec;

    fn scheduler(decisions: Vec<Decision>) -> BaseScheduler<ReplayController> {
        let portfolio =
            Portfolio::from_specs(&[SlotSpec::new("a.toml"), SlotSpec::new("b.toml")]).unwrap();
        BaseScheduler::new(
            portfolio,
            ReplayController::new(decisions),
            &PortfolioConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_stops_when_controller_exhausts() {
        let mut scheduler = scheduler(vec![Decision::new("a.toml", 20), Decision::new("b.toml", 20)]);
        let mut runner = |slot: &mut AlgorithmSlot| -> crate::Result<RunStatus> {
            slot.set_progress(0.1);
            Ok(RunStatus::Continue)
        };

        let summary = drive(&mut scheduler, &mut runner, 10).unwrap();
        assert_eq!(summary.dispatches, 2);
        assert!(summary.finished_by.is_none());
    }

    #[test]
    fn test_stops_on_done() {
        let mut scheduler = scheduler(vec![
            Decision::new("a.toml", 20),
            Decision::new("b.toml", 20),
            Decision::new("a.toml", 20),
        ]);
        let mut runner = |slot: &mut AlgorithmSlot| -> crate::Result<RunStatus> {
            if slot.id().as_str() == "b.toml" {
                Ok(RunStatus::Done)
            } else {
                Ok(RunStatus::Continue)
            }
        };

        let summary = drive(&mut scheduler, &mut runner, 10).unwrap();
        assert_eq!(summary.dispatches, 2);
        assert_eq!(summary.finished_by.unwrap().as_str(), "b.toml");
        assert_eq!(scheduler.controller().remaining(), 1);
    }

    #[test]
    fn test_dispatch_budget() {
        let mut scheduler = scheduler(vec![Decision::new("a.toml", 20); 5]);
        let mut runner = |_: &mut AlgorithmSlot| -> crate::Result<RunStatus> { Ok(RunStatus::Continue) };

        let summary = drive(&mut scheduler, &mut runner, 3).unwrap();
        assert_eq!(summary.dispatches, 3);
    }

    #[test]
    fn test_runner_error_stops_timer() {
        let mut scheduler = scheduler(vec![Decision::new("a.toml", 20)]);
        let mut runner = |_: &mut AlgorithmSlot| -> crate::Result<RunStatus> {
            Err(PortfolioError::Engine("crashed".into()))
        };

        assert!(drive(&mut scheduler, &mut runner, 3).is_err());
        let slot = scheduler.current().unwrap();
        assert_eq!(slot.dispatches(), 1);
        assert!(!slot.is_timing());
        assert_eq!(slot.total_time_spent(), slot.total_time_spent());
    }
}
