//! Controller-driven scheduling.

use tracing::{debug, error};

use super::{ScheduleReport, SlotScheduler};
use crate::config::PortfolioConfig;
use crate::controller::Controller;
use crate::error::{PortfolioError, Result};
use crate::metrics::PortfolioMetrics;
use crate::portfolio::Portfolio;
use crate::slot::AlgorithmSlot;
use crate::time_dist::TimeDistribution;

/// Delegates every choice of slot and time limit to a [`Controller`].
///
/// Before each decision the previously dispatched slot's progress and time
/// limit are reported back, so the controller can learn from them. Proposed
/// limits are capped at `max_time_per_slot` and raised to the slot floor.
#[derive(Debug)]
pub struct BaseScheduler<C> {
    portfolio: Portfolio,
    controller: C,
    time_menu: TimeDistribution,
    max_time_per_slot: u32,
    current: Option<usize>,
    metrics: PortfolioMetrics,
}

impl<C: Controller> BaseScheduler<C> {
    /// Build the scheduler and initialize the controller with the distinct
    /// slot identifiers and the configured time menu.
    pub fn new(portfolio: Portfolio, mut controller: C, config: &PortfolioConfig) -> Result<Self> {
        config.validate()?;
        let time_menu = config.time_menu()?;
        controller.init(portfolio.identifiers(), &time_menu);

        let metrics = PortfolioMetrics::with_prefix(&config.metrics_prefix);
        for slot in &portfolio {
            metrics.set_slot_time_limit(slot.id(), slot.time_limit());
        }

        Ok(Self {
            portfolio,
            controller,
            time_menu,
            max_time_per_slot: config.max_time_per_slot,
            current: None,
            metrics,
        })
    }

    /// Replace the scheduler's metrics, e.g. with ones registered for exposition.
    pub fn with_metrics(mut self, metrics: PortfolioMetrics) -> Self {
        for slot in &self.portfolio {
            metrics.set_slot_time_limit(slot.id(), slot.time_limit());
        }
        self.metrics = metrics;
        self
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn time_menu(&self) -> &TimeDistribution {
        &self.time_menu
    }

    pub fn metrics(&self) -> &PortfolioMetrics {
        &self.metrics
    }
}

impl<C: Controller> SlotScheduler for BaseScheduler<C> {
    fn has_next(&mut self) -> bool {
        self.controller.has_next_decision()
    }

    /// # Errors
    ///
    /// [`PortfolioError::UnknownSlot`] if the controller names a slot outside
    /// the portfolio. This is a protocol violation; callers should abort.
    /// [`PortfolioError::ControllerExhausted`] if called after `has_next`
    /// returned false.
    fn next(&mut self) -> Result<&mut AlgorithmSlot> {
        if let Some(previous) = self.current.and_then(|p| self.portfolio.get(p)) {
            self.controller
                .report_progress(previous.progress(), previous.time_limit());
            self.controller.report_coverage(previous.progressed_targets());
        }

        let decision = self
            .controller
            .next_decision()
            .ok_or(PortfolioError::ControllerExhausted)?;

        let Some(position) = self.portfolio.position(&decision.slot) else {
            self.metrics.record_protocol_violation();
            error!(slot = %decision.slot, "controller returned unknown slot");
            return Err(PortfolioError::UnknownSlot(decision.slot.to_string()));
        };

        let time_limit = decision.time_limit.min(self.max_time_per_slot);
        self.current = Some(position);

        let slot = &mut self.portfolio[position];
        slot.adapt_time_limit(i64::from(time_limit));
        slot.mark_dispatched();
        self.metrics.record_dispatch(slot.id(), slot.time_limit());
        debug!(
            slot = %slot.id(),
            proposed = decision.time_limit,
            time_limit = slot.time_limit(),
            "dispatching slot"
        );
        Ok(slot)
    }

    fn current(&self) -> Option<&AlgorithmSlot> {
        self.current.and_then(|p| self.portfolio.get(p))
    }

    fn current_mut(&mut self) -> Option<&mut AlgorithmSlot> {
        self.current.and_then(|p| self.portfolio.get_mut(p))
    }

    fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    fn portfolio_mut(&mut self) -> &mut Portfolio {
        &mut self.portfolio
    }

    fn report(&self) -> ScheduleReport {
        ScheduleReport::from_portfolio("controlled", &self.portfolio)
    }
}
