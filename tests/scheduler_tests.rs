//! End-to-end tests for both scheduling strategies through the public API.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

use portfolio_rs::{
    drive, AlgorithmSlot, Controller, Decision, EngineOptions, PortfolioBuilder, PortfolioConfig,
    PortfolioError, RandomController, RebalanceOutcome, ReplayController, RunStatus,
    RuntimeEngine, SlotId, SlotScheduler, StatisticalModel, TargetId, TimeDistribution,
    TimeScale, TokenFrequencyModel, DEFAULT_TIME_LIMIT,
};
use tempfile::TempDir;

/// Engine whose progress is shared with the test so runs can advance it.
struct SimulatedEngine {
    targets: HashSet<TargetId>,
    progress: Rc<RefCell<f64>>,
}

impl RuntimeEngine for SimulatedEngine {
    fn coverage_targets(&self) -> Option<HashSet<TargetId>> {
        Some(self.targets.clone())
    }

    fn progress_fraction(&self) -> f64 {
        *self.progress.borrow()
    }
}

fn write_slot_files(dir: &TempDir, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "[analysis]\nname = \"{}\"", name).unwrap();
            path.display().to_string()
        })
        .collect()
}

#[test]
fn test_controlled_feedback_round_trip() {
    let mut scheduler = PortfolioBuilder::new()
        .slot("a.toml", None)
        .slot("b.toml", None)
        .build_controlled(ReplayController::new([
            Decision::new("a.toml", 40),
            Decision::new("b.toml", 500),
            Decision::new("a.toml", 5),
        ]))
        .unwrap();

    let mut progress = [0.3, 0.6, 0.9].into_iter();
    let mut runner = |slot: &mut AlgorithmSlot| -> portfolio_rs::Result<RunStatus> {
        slot.set_progress(progress.next().unwrap_or(1.0));
        Ok(RunStatus::Continue)
    };
    let summary = drive(&mut scheduler, &mut runner, 10).unwrap();

    assert_eq!(summary.dispatches, 3);
    // Proposals are capped at 100 and floored at the default limit
    assert_eq!(
        scheduler.controller().progress_reports(),
        &[(0.3, 40), (0.6, 100)]
    );
    assert_eq!(scheduler.current().unwrap().time_limit(), DEFAULT_TIME_LIMIT);
}

#[test]
fn test_controlled_unknown_slot_aborts() {
    let mut scheduler = PortfolioBuilder::new()
        .slot("a.toml", None)
        .build_controlled(ReplayController::new([
            Decision::new("a.toml", 20),
            Decision::new("ghost.toml", 20),
        ]))
        .unwrap();

    let mut runner =
        |_: &mut AlgorithmSlot| -> portfolio_rs::Result<RunStatus> { Ok(RunStatus::Continue) };
    let err = drive(&mut scheduler, &mut runner, 10).unwrap_err();

    assert!(matches!(err, PortfolioError::UnknownSlot(_)));
    assert_eq!(scheduler.report().dispatches, 1);
}

#[test]
fn test_random_controller_sees_exponential_menu() {
    let mut scheduler = PortfolioBuilder::new()
        .slot("a.toml", None)
        .slot("b.toml", None)
        .time_scale(TimeScale::Exponential)
        .build_controlled(RandomController::with_seed(11))
        .unwrap();

    let allowed: HashSet<u32> = [20, 40, 80, 100].into_iter().collect();
    for _ in 0..50 {
        let slot = scheduler.next().unwrap();
        assert!(allowed.contains(&slot.time_limit()));
    }
}

#[test]
fn test_adaptive_rebalance_with_uniform_models() {
    let model: Arc<dyn StatisticalModel> = Arc::new(TokenFrequencyModel::default());
    let models: HashMap<SlotId, Arc<dyn StatisticalModel>> = ["a", "b", "c"]
        .iter()
        .map(|id| (SlotId::from(*id), Arc::clone(&model)))
        .collect();

    let mut scheduler = PortfolioBuilder::new()
        .slot("a", Some("_20"))
        .slot("b", Some("_20"))
        .slot("c", Some("_20"))
        .seed(17)
        .build_adaptive(models, |t: TargetId, _: usize| vec![t.to_string()])
        .unwrap();

    for slot in scheduler.portfolio_mut().iter_mut() {
        slot.set_runtime_handle(Box::new(SimulatedEngine {
            targets: [TargetId(1), TargetId(2)].into_iter().collect(),
            progress: Rc::new(RefCell::new(0.0)),
        }));
    }

    // Three dispatches complete round one; the fourth crosses the boundary.
    for progress in [0.8, 0.2, 0.5] {
        scheduler.next().unwrap().set_progress(progress);
    }
    let first = scheduler.next().unwrap();
    assert_eq!(first.id().as_str(), "a");
    assert_eq!(first.time_limit(), 26);

    let limits: Vec<u32> = scheduler.portfolio().iter().map(|s| s.time_limit()).collect();
    assert_eq!(limits, vec![26, 14, 20]);
    // Reallocation preserves the distributable budget
    assert_eq!(limits.iter().map(|l| l - DEFAULT_TIME_LIMIT).sum::<u32>(), 30);

    let report = scheduler.report();
    assert_eq!(report.rounds, 1);
    assert_eq!(report.rebalances_applied, 1);
}

#[test]
fn test_adaptive_rebalance_count() {
    let mut scheduler = PortfolioBuilder::new()
        .slot("a", Some("_20"))
        .slot("b", Some("_20"))
        .seed(1)
        .build_adaptive(HashMap::new(), |_: TargetId, _: usize| -> Vec<String> { Vec::new() })
        .unwrap();

    // N = kP + 1 calls cross k round boundaries
    for _ in 0..(3 * 2 + 1) {
        scheduler.next().unwrap();
    }
    assert_eq!(scheduler.round(), 3);
    assert_eq!(
        scheduler.metrics().rebalances_applied.get() + scheduler.metrics().rebalances_skipped.get(),
        3
    );
    // No progress was ever reported, so every pass is skipped
    assert!(matches!(
        scheduler.last_outcome(),
        Some(RebalanceOutcome::Skipped(_))
    ));
}

#[test]
fn test_adaptive_with_real_engines() {
    let dir = TempDir::new().unwrap();
    let paths = write_slot_files(&dir, &["fast.toml", "slow.toml"]);

    let mut global = EngineOptions::new();
    global.set("portfolio.slots", paths.join(","));
    global.set("log.level", "info");

    let progress: HashMap<String, Rc<RefCell<f64>>> = paths
        .iter()
        .map(|p| (p.clone(), Rc::new(RefCell::new(0.0))))
        .collect();
    let factory = |slot: &SlotId, options: &EngineOptions| -> portfolio_rs::Result<Box<dyn RuntimeEngine>> {
        assert!(!options.contains_key("portfolio.slots"));
        assert_eq!(options.get("log.level"), Some("info"));
        Ok(Box::new(SimulatedEngine {
            targets: [TargetId(1), TargetId(2), TargetId(3)].into_iter().collect(),
            progress: Rc::clone(&progress[slot.as_str()]),
        }))
    };

    let mut fast = TokenFrequencyModel::default();
    fast.learn_path(&["loop".to_string()]);
    let models: HashMap<SlotId, Arc<dyn StatisticalModel>> = paths
        .iter()
        .map(|p| {
            (
                SlotId::from(p.as_str()),
                Arc::new(fast.clone()) as Arc<dyn StatisticalModel>,
            )
        })
        .collect();

    let mut scheduler = PortfolioBuilder::new()
        .slot(&paths[0], Some("continue_30"))
        .slot(&paths[1], Some("_30"))
        .seed(4)
        .build_adaptive(models, |_: TargetId, _: usize| vec!["loop".to_string()])
        .unwrap();
    let keys = PortfolioConfig::default().scheduler_keys;

    let mut runner = |slot: &mut AlgorithmSlot| -> portfolio_rs::Result<RunStatus> {
        if slot
            .get_or_create_runtime_handle(&global, &keys, &factory)
            .is_none()
        {
            return Err(PortfolioError::Engine("engine unavailable".into()));
        }
        let step = if slot.id().as_str().ends_with("fast.toml") {
            0.4
        } else {
            0.1
        };
        let cell = &progress[slot.id().as_str()];
        let next = (*cell.borrow() + step).min(1.0);
        *cell.borrow_mut() = next;
        slot.refresh_progress();
        Ok(RunStatus::Continue)
    };

    drive(&mut scheduler, &mut runner, 5).unwrap();

    let limits: Vec<u32> = scheduler.portfolio().iter().map(|s| s.time_limit()).collect();
    // Fast slot's higher progress rate earns it more of the 40 second budget
    assert!(limits[0] > limits[1], "limits {:?}", limits);
    assert_eq!(limits.iter().map(|l| l - DEFAULT_TIME_LIMIT).sum::<u32>(), 40);
    assert!(scheduler.portfolio()[0].wants_engine_reuse());
}

#[test]
fn test_controller_trait_object() {
    let mut controller: Box<dyn Controller> = Box::new(RandomController::with_seed(2));
    let menu = TimeDistribution::new(TimeScale::Uniform, 60, 20).unwrap();
    controller.init(&[SlotId::from("a")], &menu);

    let decision = controller.next_decision().unwrap();
    assert_eq!(decision.slot.as_str(), "a");
    assert!([20, 40, 60].contains(&decision.time_limit));
}
