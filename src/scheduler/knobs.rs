//! Configuration knobs for budget reallocation.
//!
//! Defaults match typical portfolios of a handful of slots. Most users won't
//! need to modify these values.

use serde::{Deserialize, Serialize};

/// Knobs for the adaptive scheduler's reallocation step.
///
/// # Reallocation
///
/// At each round boundary the scheduler draws `sample_size` coverage targets,
/// samples a path of at most `max_path_length` tokens to each, and lets every
/// eligible slot's model vote on how likely it is to cover it:
///
/// ```text
/// logit_i = ln(prior_i) + ln P(path | slot_i)
/// vote_i  = mean over samples of softmax(logit)_i
/// limit_i = floor + round(vote_i * budget)
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceKnobs {
    /// Coverage targets sampled per reallocation pass.
    /// Default: 10
    pub sample_size: usize,

    /// Upper bound on sampled path length in tokens.
    /// Default: 512
    pub max_path_length: usize,

    /// Seed for target sampling. `None` seeds from OS entropy.
    /// Default: None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// N-gram length for token-frequency models built from configuration.
    /// Default: 1
    pub ngram_size: usize,

    /// Count each n-gram once per path.
    /// Default: true
    pub set_based: bool,
}

impl Default for RebalanceKnobs {
    fn default() -> Self {
        Self {
            sample_size: 10,
            max_path_length: 512,
            seed: None,
            ngram_size: 1,
            set_based: true,
        }
    }
}

impl RebalanceKnobs {
    /// Create knobs with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_max_path_length(mut self, max_path_length: usize) -> Self {
        self.max_path_length = max_path_length;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_ngrams(mut self, ngram_size: usize, set_based: bool) -> Self {
        self.ngram_size = ngram_size;
        self.set_based = set_based;
        self
    }
}
