//! End-of-run schedule summary.

use std::fmt;
use std::time::Duration;

use crate::portfolio::Portfolio;
use crate::slot::SlotId;

#[derive(Clone, Debug, PartialEq)]
pub struct SlotReport {
    pub id: SlotId,
    pub time_limit: u32,
    pub time_spent: Duration,
    pub dispatches: u64,
}

/// Per-slot time and dispatch totals for a scheduler.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleReport {
    pub strategy: &'static str,
    pub dispatches: u64,
    pub rounds: u64,
    pub rebalances_applied: u64,
    pub slots: Vec<SlotReport>,
}

impl ScheduleReport {
    pub(crate) fn from_portfolio(strategy: &'static str, portfolio: &Portfolio) -> Self {
        let slots: Vec<SlotReport> = portfolio
            .iter()
            .map(|slot| SlotReport {
                id: slot.id().clone(),
                time_limit: slot.time_limit(),
                time_spent: slot.total_time_spent(),
                dispatches: slot.dispatches(),
            })
            .collect();
        Self {
            strategy,
            dispatches: slots.iter().map(|s| s.dispatches).sum(),
            rounds: 0,
            rebalances_applied: 0,
            slots,
        }
    }

    pub fn total_time_spent(&self) -> Duration {
        self.slots.iter().map(|s| s.time_spent).sum()
    }
}

impl fmt::Display for ScheduleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Portfolio schedule ({})", self.strategy)?;
        writeln!(f, "  slots: {}", self.slots.len())?;
        writeln!(f, "  dispatches: {}", self.dispatches)?;
        if self.rounds > 0 {
            writeln!(
                f,
                "  rounds: {} ({} reallocations applied)",
                self.rounds, self.rebalances_applied
            )?;
        }
        for slot in &self.slots {
            writeln!(
                f,
                "  {}: limit {}s, spent {:.3}s over {} dispatches",
                slot.id,
                slot.time_limit,
                slot.time_spent.as_secs_f64(),
                slot.dispatches
            )?;
        }
        write!(f, "  total time: {:.3}s", self.total_time_spent().as_secs_f64())
    }
}
