//! Metrics for portfolio scheduling.
//!
//! Counters and gauges are always updated. Exposition is optional: pass a
//! Prometheus registry to the builder if you want to scrape them.
//!
//! # Available Metrics
//!
//! ## Counters
//!
//! - `portfolio_dispatches` - Slots handed out by `next()`
//! - `portfolio_rounds` - Completed round-robin rounds
//! - `portfolio_rebalances_applied` - Reallocation passes that changed limits
//! - `portfolio_rebalances_skipped` - Reallocation passes aborted by a precondition
//! - `portfolio_protocol_violations` - Controller decisions naming unknown slots
//!
//! ## Gauges
//!
//! - `portfolio_slot_time_limit{slot}` - Current time limit per slot
//!
//! # Example
//!
//! ```ignore
//! use prometheus::Registry;
//! use portfolio_rs::PortfolioBuilder;
//!
//! let registry = Registry::new();
//! let scheduler = PortfolioBuilder::new()
//!     .slot("predicate.toml", Some("_20"))
//!     .prometheus_registry(registry.clone())
//!     .build_controlled(controller)?;
//! ```

mod prometheus;

pub use prometheus::PortfolioMetrics;
