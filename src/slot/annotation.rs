//! Annotation grammar for slot inputs.
//!
//! ```text
//! annotation := [<mode-token>] ['_' <int>]
//! ```
//!
//! The mode token is the text before the first `_`, matched case-insensitively.
//! The limit is the text after the first `_`. Malformed input never fails: an
//! unknown token becomes [`ReuseMode::None`] and a missing, unparseable or
//! non-positive limit becomes [`DEFAULT_TIME_LIMIT`].

use serde::{Deserialize, Serialize};

/// Minimum (and default) per-slot time limit in seconds.
pub const DEFAULT_TIME_LIMIT: u32 = 10;

/// What state carries over between consecutive dispatches of the same slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReuseMode {
    /// Start from scratch every time.
    #[default]
    None,
    /// Resume the previous engine run.
    Continue,
    /// Reuse the slot's own precision.
    ReuseOwnPrecision,
    /// Reuse the precision of the previously dispatched slot.
    ReusePredPrecision,
    /// Reuse both own and predecessor precision.
    ReuseBoth,
    /// Keep the engine and reuse own precision.
    ReuseEngineOwn,
    /// Keep the engine and reuse predecessor precision.
    ReuseEnginePred,
    /// Keep the engine and reuse both precisions.
    ReuseEngineBoth,
}

impl ReuseMode {
    /// Map an annotation mode token. Unknown tokens map to `None`.
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "continue" => ReuseMode::Continue,
            "reuse-own-precision" => ReuseMode::ReuseOwnPrecision,
            "reuse-pred-precision" => ReuseMode::ReusePredPrecision,
            "reuse-precisions" => ReuseMode::ReuseBoth,
            "reuse-cpa-own-precision" => ReuseMode::ReuseEngineOwn,
            "reuse-cpa-pred-precision" => ReuseMode::ReuseEnginePred,
            "reuse-cpa-precisions" => ReuseMode::ReuseEngineBoth,
            _ => ReuseMode::None,
        }
    }

    pub fn wants_engine_reuse(self) -> bool {
        match self {
            ReuseMode::Continue
            | ReuseMode::ReuseEngineOwn
            | ReuseMode::ReuseEnginePred
            | ReuseMode::ReuseEngineBoth => true,
            ReuseMode::None
            | ReuseMode::ReuseOwnPrecision
            | ReuseMode::ReusePredPrecision
            | ReuseMode::ReuseBoth => false,
        }
    }

    pub fn wants_own_precision_reuse(self) -> bool {
        match self {
            ReuseMode::ReuseOwnPrecision
            | ReuseMode::ReuseBoth
            | ReuseMode::ReuseEngineOwn
            | ReuseMode::ReuseEngineBoth => true,
            ReuseMode::None
            | ReuseMode::Continue
            | ReuseMode::ReusePredPrecision
            | ReuseMode::ReuseEnginePred => false,
        }
    }

    pub fn wants_predecessor_precision_reuse(self) -> bool {
        match self {
            ReuseMode::ReusePredPrecision
            | ReuseMode::ReuseBoth
            | ReuseMode::ReuseEnginePred
            | ReuseMode::ReuseEngineBoth => true,
            ReuseMode::None
            | ReuseMode::Continue
            | ReuseMode::ReuseOwnPrecision
            | ReuseMode::ReuseEngineOwn => false,
        }
    }

    pub fn wants_precision_reuse(self) -> bool {
        self.wants_own_precision_reuse() || self.wants_predecessor_precision_reuse()
    }
}

/// Parse an optional annotation into its reuse mode and initial time limit.
pub fn parse_annotation(annotation: Option<&str>) -> (ReuseMode, u32) {
    let Some(annotation) = annotation else {
        return (ReuseMode::None, DEFAULT_TIME_LIMIT);
    };

    let (token, limit) = match annotation.split_once('_') {
        Some((token, limit)) => (token, Some(limit)),
        None => (annotation, None),
    };

    // Limits must be positive and fit a signed 32-bit integer
    let limit = limit
        .and_then(|l| l.parse::<i32>().ok())
        .and_then(|l| u32::try_from(l).ok())
        .filter(|&l| l > 0)
        .unwrap_or(DEFAULT_TIME_LIMIT);

    (ReuseMode::from_token(token), limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_and_limit() {
        assert_eq!(
            parse_annotation(Some("reuse-own-precision_45")),
            (ReuseMode::ReuseOwnPrecision, 45)
        );
        assert_eq!(
            parse_annotation(Some("reuse-cpa-precisions_30")),
            (ReuseMode::ReuseEngineBoth, 30)
        );
    }

    #[test]
    fn test_limit_only() {
        assert_eq!(parse_annotation(Some("_45")), (ReuseMode::None, 45));
        assert_eq!(
            parse_annotation(Some("_2147483647")),
            (ReuseMode::None, 2_147_483_647)
        );
    }

    #[test]
    fn test_mode_only() {
        assert_eq!(
            parse_annotation(Some("continue")),
            (ReuseMode::Continue, DEFAULT_TIME_LIMIT)
        );
        assert_eq!(
            parse_annotation(Some("CONTINUE")),
            (ReuseMode::Continue, DEFAULT_TIME_LIMIT)
        );
    }

    #[test]
    fn test_malformed_degrades_to_defaults() {
        for input in [
            "bogus",
            "_-5",
            "",
            "_",
            "_0",
            "continue_abc",
            "_12x",
            "_3000000000",
            "_2147483648",
        ] {
            let (mode, limit) = parse_annotation(Some(input));
            assert_eq!(limit, DEFAULT_TIME_LIMIT, "input {:?}", input);
            if input != "continue_abc" {
                assert_eq!(mode, ReuseMode::None, "input {:?}", input);
            }
        }
        assert_eq!(
            parse_annotation(None),
            (ReuseMode::None, DEFAULT_TIME_LIMIT)
        );
    }

    #[test]
    fn test_limit_uses_first_separator() {
        // Everything after the first '_' is the limit, so this is unparseable.
        assert_eq!(
            parse_annotation(Some("continue_3_4")),
            (ReuseMode::Continue, DEFAULT_TIME_LIMIT)
        );
    }

    #[test]
    fn test_reuse_queries() {
        assert!(ReuseMode::Continue.wants_engine_reuse());
        assert!(!ReuseMode::Continue.wants_precision_reuse());

        assert!(ReuseMode::ReuseBoth.wants_own_precision_reuse());
        assert!(ReuseMode::ReuseBoth.wants_predecessor_precision_reuse());
        assert!(!ReuseMode::ReuseBoth.wants_engine_reuse());

        assert!(ReuseMode::ReuseEnginePred.wants_engine_reuse());
        assert!(ReuseMode::ReuseEnginePred.wants_predecessor_precision_reuse());
        assert!(!ReuseMode::ReuseEnginePred.wants_own_precision_reuse());

        assert!(!ReuseMode::None.wants_engine_reuse());
        assert!(!ReuseMode::None.wants_precision_reuse());
    }
}
