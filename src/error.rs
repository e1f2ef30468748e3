//! Error types for portfolio-rs.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when building or driving a portfolio scheduler.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// The controller named a slot that is not part of the portfolio.
    ///
    /// This is an integration bug in the controller, not a runtime condition.
    /// Callers should abort the schedule when they see it.
    #[error("controller returned unknown slot identifier: {0}")]
    UnknownSlot(String),

    /// `next()` was called after the controller ran out of decisions.
    #[error("controller has no further decisions")]
    ControllerExhausted,

    /// A scheduler was requested over an empty slot list.
    #[error("portfolio contains no slots")]
    EmptyPortfolio,

    /// The time menu parameters cannot produce a menu.
    #[error("invalid time distribution: cap {cap}, granularity {granularity}")]
    InvalidTimeDistribution { cap: u32, granularity: u32 },

    /// Semantic configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error extracting configuration from figment.
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// A slot's configuration file could not be read.
    #[error("failed to read slot configuration {path}: {source}")]
    SlotConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A slot's configuration file is not valid TOML.
    #[error("slot configuration {path} is invalid: {source}")]
    SlotConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A token-frequency model file could not be read or written.
    #[error("model file {path}: {source}")]
    ModelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A token-frequency model file has a malformed line.
    #[error("model file {path}, line {line}: {message}")]
    ModelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// The engine factory could not create a runtime handle.
    #[error("engine error: {0}")]
    Engine(String),

    /// Metric registration failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type alias for portfolio operations.
pub type Result<T> = std::result::Result<T, PortfolioError>;
