//! Portfolio Simulation Example
//!
//! Runs three simulated analyses through the adaptive scheduler and prints how
//! the time budget moves towards the analysis that progresses fastest.
//! Nothing actually sleeps: each dispatch advances a virtual clock by the
//! slot's time limit.
//!
//! Run: cargo run --example portfolio_simulation -- --portfolio-seed 7

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use clap::Parser;
use portfolio_rs::{
    drive, AlgorithmSlot, PortfolioArgs, PortfolioBuilder, RunStatus, RuntimeEngine, SlotId,
    SlotScheduler, StatisticalModel, TargetId, TokenFrequencyModel,
};

#[derive(Parser)]
struct Args {
    #[command(flatten)]
    portfolio: PortfolioArgs,

    /// Number of dispatches to simulate
    #[arg(long, default_value_t = 30)]
    dispatches: u64,
}

/// Simulated analysis whose progress is advanced by the runner.
struct SimulatedAnalysis {
    progress: Rc<RefCell<f64>>,
}

impl RuntimeEngine for SimulatedAnalysis {
    fn coverage_targets(&self) -> Option<HashSet<TargetId>> {
        Some((0..20).map(TargetId).collect())
    }

    fn progress_fraction(&self) -> f64 {
        *self.progress.borrow()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let analyses = [
        ("predicate.toml", "reuse-own-precision_30", 0.004),
        ("value.toml", "continue_30", 0.012),
        ("bmc.toml", "_30", 0.002),
    ];

    let mut models: HashMap<SlotId, Arc<dyn StatisticalModel>> = HashMap::new();
    for (name, _, _) in &analyses {
        let mut model = TokenFrequencyModel::default();
        model.learn_path(&["assume".to_string(), "loop".to_string()]);
        models.insert(SlotId::from(*name), Arc::new(model));
    }

    let mut builder = PortfolioBuilder::new();
    for (name, annotation, _) in &analyses {
        builder = builder.slot(name, Some(*annotation));
    }
    let mut scheduler = builder
        .with_cli_args(&args.portfolio)
        .build_adaptive(models, |t: TargetId, _: usize| {
            vec!["assume".to_string(), format!("edge-{}", t.0)]
        })?;

    let progress: HashMap<&str, Rc<RefCell<f64>>> = analyses
        .iter()
        .map(|(name, _, _)| (*name, Rc::new(RefCell::new(0.0))))
        .collect();
    for slot in scheduler.portfolio_mut().iter_mut() {
        let cell = progress
            .get(slot.id().as_str())
            .ok_or("slot without simulated analysis")?;
        slot.set_runtime_handle(Box::new(SimulatedAnalysis {
            progress: Rc::clone(cell),
        }));
    }

    let mut virtual_seconds = 0u64;
    let mut runner = |slot: &mut AlgorithmSlot| -> portfolio_rs::Result<RunStatus> {
        let limit = slot.time_limit();
        virtual_seconds += u64::from(limit);

        // Progress grows linearly with granted seconds
        let rate = analyses
            .iter()
            .find(|(name, _, _)| slot.id().as_str() == *name)
            .map_or(0.0, |(_, _, rate)| *rate);
        let cell = &progress[slot.id().as_str()];
        let next = (*cell.borrow() + rate * f64::from(limit)).min(1.0);
        *cell.borrow_mut() = next;
        slot.refresh_progress();

        println!(
            "t={:>5}s  {:<16} limit {:>3}s  progress {:.2}",
            virtual_seconds,
            slot.id(),
            limit,
            next
        );
        Ok(if next >= 1.0 {
            RunStatus::Done
        } else {
            RunStatus::Continue
        })
    };

    let summary = drive(&mut scheduler, &mut runner, args.dispatches)?;
    if let Some(winner) = &summary.finished_by {
        println!("\n{} finished after {} dispatches", winner, summary.dispatches);
    }
    println!("\n{}", scheduler.report());
    Ok(())
}
