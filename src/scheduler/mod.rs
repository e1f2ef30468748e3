//! Slot schedulers.
//!
//! Two strategies share the [`SlotScheduler`] interface:
//!
//! - [`BaseScheduler`] asks an external [`Controller`](crate::Controller) for
//!   every decision and feeds back the previous slot's progress.
//! - [`AdaptiveScheduler`] cycles through slots round-robin and reallocates
//!   time limits between rounds (see [`RebalanceKnobs`]).
//!
//! Schedulers are single-threaded and cooperative: the caller runs the slot
//! returned by `next()` for at most its time limit, writes back progress, and
//! asks again.

mod adaptive;
mod allocation;
mod base;
mod knobs;
mod report;

pub use adaptive::{AdaptiveScheduler, RebalanceOutcome, SkipReason};
pub use allocation::{distributable_budget, limits_from_votes, prior_mask, progress_prior};
pub use base::BaseScheduler;
pub use knobs::RebalanceKnobs;
pub use report::{ScheduleReport, SlotReport};

use crate::error::Result;
use crate::portfolio::Portfolio;
use crate::slot::AlgorithmSlot;

pub trait SlotScheduler {
    /// Whether another slot can be dispatched.
    fn has_next(&mut self) -> bool;

    /// Select the next slot, apply its time limit and mark it current.
    fn next(&mut self) -> Result<&mut AlgorithmSlot>;

    /// The slot returned by the most recent `next()`.
    fn current(&self) -> Option<&AlgorithmSlot>;

    fn current_mut(&mut self) -> Option<&mut AlgorithmSlot>;

    fn portfolio(&self) -> &Portfolio;

    fn portfolio_mut(&mut self) -> &mut Portfolio;

    /// Per-slot totals so far, suitable for printing at the end of a run.
    fn report(&self) -> ScheduleReport;
}
