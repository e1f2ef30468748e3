//! Round-robin scheduling with Bayesian reallocation of time budgets.
//!
//! Slots run in input order. Whenever a full round completes, the scheduler
//! redistributes the seconds above the per-slot floor among the slots,
//! favouring slots that progressed fastest and whose models find sampled
//! paths to open coverage targets familiar. Progress is then reset so every
//! round is judged on fresh measurements.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::allocation::{distributable_budget, limits_from_votes, prior_mask, progress_prior};
use super::{RebalanceKnobs, ScheduleReport, SlotScheduler};
use crate::config::PortfolioConfig;
use crate::error::Result;
use crate::metrics::PortfolioMetrics;
use crate::model::{posterior, PathSampler, StatisticalModel};
use crate::portfolio::Portfolio;
use crate::slot::{AlgorithmSlot, SlotId, TargetId};

/// Why a reallocation pass left all limits unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    /// No round has completed yet.
    FirstRound,
    /// A slot has not reported progress since the last reset.
    MissingProgress(SlotId),
    /// A slot's engine cannot list its coverage targets.
    MissingCoverageTargets(SlotId),
    /// There are not more distributable seconds than slots.
    InsufficientBudget { budget: i64, slots: usize },
    /// A slot with positive prior has no model to score paths with.
    MissingModel(SlotId),
    /// No slot has any coverage target to sample.
    NoTargets,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FirstRound => write!(f, "no completed round yet"),
            SkipReason::MissingProgress(id) => write!(f, "slot {} has no progress measurement", id),
            SkipReason::MissingCoverageTargets(id) => {
                write!(f, "slot {} has no coverage targets", id)
            }
            SkipReason::InsufficientBudget { budget, slots } => {
                write!(f, "budget of {}s cannot be split among {} slots", budget, slots)
            }
            SkipReason::MissingModel(id) => write!(f, "slot {} has no statistical model", id),
            SkipReason::NoTargets => write!(f, "no coverage targets to sample"),
        }
    }
}

/// Result of one reallocation pass.
#[derive(Clone, Debug, PartialEq)]
pub enum RebalanceOutcome {
    /// New limits in portfolio order.
    Applied { budget: i64, limits: Vec<u32> },
    Skipped(SkipReason),
}

impl RebalanceOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RebalanceOutcome::Applied { .. })
    }
}

/// Round-robin scheduler that reallocates time limits between rounds.
pub struct AdaptiveScheduler<S> {
    portfolio: Portfolio,
    models: Vec<Option<Arc<dyn StatisticalModel>>>,
    sampler: S,
    knobs: RebalanceKnobs,
    rng: SmallRng,
    cursor: usize,
    in_cycle: usize,
    round: u64,
    current: Option<usize>,
    rebalances_applied: u64,
    last_outcome: Option<RebalanceOutcome>,
    metrics: PortfolioMetrics,
}

impl<S: PathSampler> AdaptiveScheduler<S> {
    /// Build the scheduler. `models` are matched to slots by identifier;
    /// slots without a model can still run but block reallocation while
    /// they hold a positive prior.
    pub fn new(
        portfolio: Portfolio,
        models: HashMap<SlotId, Arc<dyn StatisticalModel>>,
        sampler: S,
        config: &PortfolioConfig,
    ) -> Result<Self> {
        config.validate()?;

        let models = portfolio
            .iter()
            .map(|slot| models.get(slot.id()).cloned())
            .collect();
        let rng = match config.rebalance.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let metrics = PortfolioMetrics::with_prefix(&config.metrics_prefix);
        for slot in &portfolio {
            metrics.set_slot_time_limit(slot.id(), slot.time_limit());
        }

        Ok(Self {
            portfolio,
            models,
            sampler,
            knobs: config.rebalance.clone(),
            rng,
            cursor: 0,
            in_cycle: 0,
            round: 0,
            current: None,
            rebalances_applied: 0,
            last_outcome: None,
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

    /// Install or replace the model for every slot with this identifier.
    pub fn set_model(&mut self, id: &SlotId, model: Arc<dyn StatisticalModel>) {
        for (slot, entry) in self.portfolio.iter().zip(self.models.iter_mut()) {
            if slot.id() == id {
                *entry = Some(Arc::clone(&model));
            }
        }
    }

    /// Completed rounds.
    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn knobs(&self) -> &RebalanceKnobs {
        &self.knobs
    }

    pub fn last_outcome(&self) -> Option<&RebalanceOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn metrics(&self) -> &PortfolioMetrics {
        &self.metrics
    }

    /// Run one reallocation pass over the current measurements.
    ///
    /// Limits change only if every precondition holds; otherwise all limits
    /// are left as they were. Called automatically at each round boundary.
    pub fn rebalance(&mut self) -> RebalanceOutcome {
        let outcome = self.compute_rebalance();
        match &outcome {
            RebalanceOutcome::Applied { budget, limits } => {
                self.rebalances_applied += 1;
                self.metrics.record_rebalance(true);
                for slot in &self.portfolio {
                    self.metrics.set_slot_time_limit(slot.id(), slot.time_limit());
                }
                debug!(round = self.round, budget, ?limits, "reallocated time limits");
            }
            RebalanceOutcome::Skipped(SkipReason::FirstRound) => {
                self.metrics.record_rebalance(false);
            }
            RebalanceOutcome::Skipped(reason) => {
                self.metrics.record_rebalance(false);
                warn!(round = self.round, %reason, "cannot update time limits");
            }
        }
        self.last_outcome = Some(outcome.clone());
        outcome
    }

    fn compute_rebalance(&mut self) -> RebalanceOutcome {
        if self.round == 0 {
            return RebalanceOutcome::Skipped(SkipReason::FirstRound);
        }

        let slots = self.portfolio.len();
        let mut observations = Vec::with_capacity(slots);
        let mut targets = BTreeSet::new();
        for slot in self.portfolio.iter_mut() {
            let id = slot.id().clone();
            let Some(progress) = slot.measured_progress() else {
                return RebalanceOutcome::Skipped(SkipReason::MissingProgress(id));
            };
            observations.push((progress, slot.time_limit()));
            match slot.try_get_coverage_targets() {
                Some(covered) => targets.extend(covered.iter().copied()),
                None => return RebalanceOutcome::Skipped(SkipReason::MissingCoverageTargets(id)),
            }
        }

        let limits: Vec<u32> = observations.iter().map(|&(_, limit)| limit).collect();
        let budget = distributable_budget(&limits);
        if budget <= slots as i64 {
            return RebalanceOutcome::Skipped(SkipReason::InsufficientBudget { budget, slots });
        }

        let prior = progress_prior(&observations);
        let mask = prior_mask(&prior);

        let votes = if mask.len() == 1 {
            let mut votes = vec![0.0; slots];
            votes[mask[0]] = 1.0;
            votes
        } else {
            let mut masked_models = Vec::with_capacity(mask.len());
            for &position in &mask {
                match &self.models[position] {
                    Some(model) => masked_models.push(Arc::clone(model)),
                    None => {
                        let id = self.portfolio[position].id().clone();
                        return RebalanceOutcome::Skipped(SkipReason::MissingModel(id));
                    }
                }
            }
            if targets.is_empty() {
                return RebalanceOutcome::Skipped(SkipReason::NoTargets);
            }
            let targets: Vec<TargetId> = targets.into_iter().collect();
            self.vote(&prior, &mask, &masked_models, &targets)
        };

        let new_limits = limits_from_votes(&votes, budget);
        for (slot, limit) in self.portfolio.iter_mut().zip(new_limits) {
            slot.adapt_time_limit(limit);
        }

        RebalanceOutcome::Applied {
            budget,
            limits: self.portfolio.iter().map(AlgorithmSlot::time_limit).collect(),
        }
    }

    /// Average posterior over `sample_size` sampled paths.
    fn vote(
        &mut self,
        prior: &[f64],
        mask: &[usize],
        models: &[Arc<dyn StatisticalModel>],
        targets: &[TargetId],
    ) -> Vec<f64> {
        let vocabulary_size = models
            .iter()
            .flat_map(|model| model.vocabulary())
            .collect::<std::collections::HashSet<_>>()
            .len();

        let samples = self.knobs.sample_size.max(1);
        let max_len = self.knobs.max_path_length;
        let mut votes = vec![0.0; prior.len()];
        let mut logits = vec![0.0; mask.len()];

        for _ in 0..samples {
            let target = targets[self.rng.gen_range(0..targets.len())];
            let mut path = self.sampler.path_to(target, max_len);
            path.truncate(max_len);

            for (logit, (&position, model)) in logits.iter_mut().zip(mask.iter().zip(models)) {
                *logit = prior[position].ln() + model.score(&path, vocabulary_size);
            }
            for (&position, p) in mask.iter().zip(posterior(&logits)) {
                votes[position] += p;
            }
        }

        for vote in &mut votes {
            *vote /= samples as f64;
        }
        votes
    }
}

impl<S: PathSampler> SlotScheduler for AdaptiveScheduler<S> {
    /// Always true; the caller decides when to stop.
    fn has_next(&mut self) -> bool {
        true
    }

    fn next(&mut self) -> Result<&mut AlgorithmSlot> {
        let slots = self.portfolio.len();
        if self.in_cycle == slots {
            info!(round = self.round, report = %self.report(), "round complete");
            self.round += 1;
            self.metrics.record_round();
            info!(round = self.round, "starting next round");
            self.rebalance();
            for slot in self.portfolio.iter_mut() {
                slot.reset_progress();
            }
            self.in_cycle = 0;
        }

        let position = self.cursor;
        self.cursor = (self.cursor + 1) % slots;
        self.in_cycle += 1;
        self.current = Some(position);

        let slot = &mut self.portfolio[position];
        slot.mark_dispatched();
        self.metrics.record_dispatch(slot.id(), slot.time_limit());
        debug!(slot = %slot.id(), time_limit = slot.time_limit(), "dispatching slot");
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
        let mut report = ScheduleReport::from_portfolio("adaptive", &self.portfolio);
        report.rounds = self.round;
        report.rebalances_applied = self.rebalances_applied;
        report
    }
}

impl<S> fmt::Debug for AdaptiveScheduler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveScheduler")
            .field("portfolio", &self.portfolio)
            .field("knobs", &self.knobs)
            .field("round", &self.round)
            .field("in_cycle", &self.in_cycle)
            .field("last_outcome", &self.last_outcome)
            .finish()
    }
}
