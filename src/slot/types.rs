//! Identity types shared across the portfolio.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Stable identity of a slot, derived from its configuration reference.
///
/// Two configuration references that render to the same string share an id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(id: impl Into<String>) -> Self {
        SlotId(id.into())
    }

    /// Derive the id from a configuration path.
    pub fn from_path(path: &Path) -> Self {
        SlotId(path.display().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlotId {
    fn from(s: &str) -> Self {
        SlotId(s.to_string())
    }
}

impl From<String> for SlotId {
    fn from(s: String) -> Self {
        SlotId(s)
    }
}

/// A goal or location an analysis tries to reach.
///
/// Targets are the unit sampled by the reallocation step.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// One entry of the scheduler input: a configuration reference and its
/// optional annotation (`[<mode-token>]['_' <int>]`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub config: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl SlotSpec {
    pub fn new(config: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
            annotation: None,
        }
    }

    pub fn annotated(config: impl Into<PathBuf>, annotation: impl Into<String>) -> Self {
        Self {
            config: config.into(),
            annotation: Some(annotation.into()),
        }
    }

    /// Parse the `path::annotation` form used on command lines.
    ///
    /// The annotation is everything after the last `::`. A trailing `::` yields
    /// an empty annotation, which parses to the defaults.
    pub fn parse_annotated(s: &str) -> Self {
        match s.rsplit_once("::") {
            Some((path, annotation)) => Self::annotated(path, annotation),
            None => Self::new(s),
        }
    }
}
