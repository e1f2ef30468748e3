//! Prometheus-backed scheduler metrics.
//!
//! Metric names use a configurable `{prefix}_` (default: "portfolio"). Counters
//! work without a registry; registration is only needed for exposition.

use prometheus::{IntCounter, IntGaugeVec, Opts, Registry};

use crate::slot::SlotId;

/// Prometheus metrics for a portfolio scheduler.
#[derive(Clone)]
pub struct PortfolioMetrics {
    /// Slots handed out by `next()`
    pub dispatches: IntCounter,

    /// Completed round-robin rounds
    pub rounds: IntCounter,

    /// Reallocation passes that changed limits
    pub rebalances_applied: IntCounter,

    /// Reallocation passes aborted by a precondition
    pub rebalances_skipped: IntCounter,

    /// Controller decisions naming unknown slots
    pub protocol_violations: IntCounter,

    /// Current time limit per slot, labelled by slot id
    pub slot_time_limit: IntGaugeVec,
}

impl Default for PortfolioMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PortfolioMetrics {
    /// Create metrics with default prefix "portfolio".
    pub fn new() -> Self {
        Self::with_prefix("portfolio")
    }

    /// Create metrics with a custom prefix.
    ///
    /// The prefix is sanitized to be a valid Prometheus metric name: invalid
    /// characters are replaced with underscores.
    pub fn with_prefix(prefix: &str) -> Self {
        let prefix = sanitize_prefix(prefix);
        Self {
            dispatches: counter(&prefix, "dispatches", "Slots handed out by the scheduler"),
            rounds: counter(&prefix, "rounds", "Completed round-robin rounds"),
            rebalances_applied: counter(
                &prefix,
                "rebalances_applied",
                "Reallocation passes that changed time limits",
            ),
            rebalances_skipped: counter(
                &prefix,
                "rebalances_skipped",
                "Reallocation passes aborted by a precondition",
            ),
            protocol_violations: counter(
                &prefix,
                "protocol_violations",
                "Controller decisions naming unknown slots",
            ),
            slot_time_limit: IntGaugeVec::new(
                Opts::new(
                    format!("{}_slot_time_limit", prefix),
                    "Current time limit per slot in seconds",
                ),
                &["slot"],
            )
            .expect("metric creation should not fail"),
        }
    }

    /// Register all metrics with a Registry for exposition.
    ///
    /// # Errors
    ///
    /// Returns an error if any metric fails to register (e.g., duplicate names).
    pub fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.dispatches.clone()))?;
        registry.register(Box::new(self.rounds.clone()))?;
        registry.register(Box::new(self.rebalances_applied.clone()))?;
        registry.register(Box::new(self.rebalances_skipped.clone()))?;
        registry.register(Box::new(self.protocol_violations.clone()))?;
        registry.register(Box::new(self.slot_time_limit.clone()))?;
        Ok(())
    }

    #[inline]
    pub fn record_dispatch(&self, slot: &SlotId, time_limit: u32) {
        self.dispatches.inc();
        self.set_slot_time_limit(slot, time_limit);
    }

    #[inline]
    pub fn record_round(&self) {
        self.rounds.inc();
    }

    #[inline]
    pub fn record_rebalance(&self, applied: bool) {
        if applied {
            self.rebalances_applied.inc();
        } else {
            self.rebalances_skipped.inc();
        }
    }

    #[inline]
    pub fn record_protocol_violation(&self) {
        self.protocol_violations.inc();
    }

    #[inline]
    pub fn set_slot_time_limit(&self, slot: &SlotId, time_limit: u32) {
        self.slot_time_limit
            .with_label_values(&[slot.as_str()])
            .set(i64::from(time_limit));
    }
}

fn sanitize_prefix(prefix: &str) -> String {
    // Valid chars: [a-zA-Z_:] for first char, [a-zA-Z0-9_:] for rest
    prefix
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let valid = if i == 0 {
                c.is_ascii_alphabetic() || c == '_' || c == ':'
            } else {
                c.is_ascii_alphanumeric() || c == '_' || c == ':'
            };
            if valid {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn counter(prefix: &str, name: &str, help: &str) -> IntCounter {
    IntCounter::with_opts(Opts::new(format!("{}_{}", prefix, name), help))
        .expect("metric creation should not fail")
}

impl std::fmt::Debug for PortfolioMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioMetrics")
            .field("dispatches", &self.dispatches.get())
            .field("rounds", &self.rounds.get())
            .field("rebalances_applied", &self.rebalances_applied.get())
            .field("rebalances_skipped", &self.rebalances_skipped.get())
            .field("protocol_violations", &self.protocol_violations.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = PortfolioMetrics::new();
        assert_eq!(metrics.dispatches.get(), 0);
        assert_eq!(metrics.rounds.get(), 0);
    }

    #[test]
    fn test_counter_increments() {
        let metrics = PortfolioMetrics::new();
        let slot = SlotId::from("a.toml");

        metrics.record_dispatch(&slot, 20);
        assert_eq!(metrics.dispatches.get(), 1);
        assert_eq!(
            metrics.slot_time_limit.with_label_values(&["a.toml"]).get(),
            20
        );

        metrics.record_rebalance(true);
        metrics.record_rebalance(false);
        metrics.record_rebalance(false);
        assert_eq!(metrics.rebalances_applied.get(), 1);
        assert_eq!(metrics.rebalances_skipped.get(), 2);
    }

    #[test]
    fn test_registry_integration() {
        let metrics = PortfolioMetrics::new();
        let registry = Registry::new();

        metrics
            .register(&registry)
            .expect("registration should succeed");

        metrics.record_round();
        metrics.set_slot_time_limit(&SlotId::from("b.toml"), 15);

        let families = registry.gather();
        assert!(families.iter().any(|f| f.get_name() == "portfolio_rounds"));
        assert!(families
            .iter()
            .any(|f| f.get_name() == "portfolio_slot_time_limit"));
    }

    #[test]
    fn test_custom_prefix_sanitized() {
        let metrics = PortfolioMetrics::with_prefix("my-app");
        let registry = Registry::new();
        metrics.register(&registry).unwrap();
        metrics.dispatches.inc();

        let families = registry.gather();
        assert!(families.iter().any(|f| f.get_name() == "my_app_dispatches"));
        assert!(!families.iter().any(|f| f.get_name() == "portfolio_dispatches"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = Registry::new();
        PortfolioMetrics::new().register(&registry).unwrap();
        assert!(PortfolioMetrics::new().register(&registry).is_err());
    }

    #[test]
    fn test_metrics_clone_shares_counters() {
        let metrics = PortfolioMetrics::new();
        let cloned = metrics.clone();
        metrics.record_protocol_violation();
        assert_eq!(cloned.protocol_violations.get(), 1);
    }
}
