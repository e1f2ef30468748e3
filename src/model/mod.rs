//! Statistical path models used by the reallocation step.
//!
//! A model scores a tokenized path by how familiar its tokens are to one
//! slot. Scores are Laplace-smoothed log-likelihoods, so they combine with a
//! log-prior and normalize through [`posterior`].

mod frequency;

pub use frequency::{TokenFrequencyModel, EMPTY_TOKEN};

use crate::slot::TargetId;

/// Counts a model reports for one scored path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathStatistic {
    /// Paths the model has learned from.
    pub seen_paths: u64,
    /// Tokens counted across all learned paths.
    pub seen_tokens: u64,
    /// One entry per scored token of the path, with its learned count.
    pub token_counts: Vec<(String, u64)>,
}

pub trait StatisticalModel {
    /// Tokens this model has counts for.
    fn vocabulary(&self) -> Vec<&str>;

    fn statistic(&self, path: &[String]) -> PathStatistic;

    /// Log-likelihood of `path` given a shared vocabulary size.
    fn score(&self, path: &[String], vocabulary_size: usize) -> f64 {
        log_likelihood(&self.statistic(path), vocabulary_size)
    }
}

/// Produces tokenized paths to coverage targets.
///
/// Paths are at most `max_len` tokens long. Implementations are usually
/// randomized walks over the program being analyzed.
pub trait PathSampler {
    fn path_to(&mut self, target: TargetId, max_len: usize) -> Vec<String>;
}

impl<F> PathSampler for F
where
    F: FnMut(TargetId, usize) -> Vec<String>,
{
    fn path_to(&mut self, target: TargetId, max_len: usize) -> Vec<String> {
        self(target, max_len)
    }
}

/// Laplace-smoothed log-likelihood: `Σ ln((count + 1) / (seen_tokens + V))`.
pub fn log_likelihood(statistic: &PathStatistic, vocabulary_size: usize) -> f64 {
    let norm = (statistic.seen_tokens + vocabulary_size as u64).max(1) as f64;
    statistic
        .token_counts
        .iter()
        .map(|(_, count)| ((*count + 1) as f64 / norm).ln())
        .sum()
}

/// Numerically stable `ln Σ exp(x)`. Empty input yields negative infinity.
pub fn log_sum_exp(logits: &[f64]) -> f64 {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    logits.iter().map(|x| (x - max).exp()).sum::<f64>().ln() + max
}

/// Normalize logits into probabilities.
///
/// Falls back to uniform if no logit is finite.
pub fn posterior(logits: &[f64]) -> Vec<f64> {
    let ln_total = log_sum_exp(logits);
    if !ln_total.is_finite() {
        let uniform = 1.0 / logits.len().max(1) as f64;
        return vec![uniform; logits.len()];
    }
    logits.iter().map(|x| (x - ln_total).exp()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_log_likelihood_laplace() {
        let statistic = PathStatistic {
            seen_paths: 2,
            seen_tokens: 6,
            token_counts: vec![("a".into(), 2), ("z".into(), 0)],
        };
        // V = 4, norm = 10
        let expected = (3.0f64 / 10.0).ln() + (1.0f64 / 10.0).ln();
        assert!((log_likelihood(&statistic, 4) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_log_likelihood_empty_model() {
        let statistic = PathStatistic {
            token_counts: vec![("a".into(), 0)],
            ..PathStatistic::default()
        };
        // Should not divide by zero
        assert_eq!(log_likelihood(&statistic, 0), 0.0);
    }

    #[test]
    fn test_log_sum_exp_stable() {
        let value = log_sum_exp(&[1000.0, 1000.0]);
        assert!((value - (1000.0 + 2f64.ln())).abs() < 1e-9);
        assert_eq!(log_sum_exp(&[]), f64::NEG_INFINITY);
    }

    #[test]
    fn test_posterior_uniform_fallback() {
        let p = posterior(&[f64::NEG_INFINITY, f64::NEG_INFINITY]);
        assert_eq!(p, vec![0.5, 0.5]);
    }

    #[test]
    fn test_closure_sampler() {
        let mut sampler = |target: TargetId, max_len: usize| vec![target.to_string(); max_len.min(2)];
        assert_eq!(sampler.path_to(TargetId(4), 8), vec!["T4", "T4"]);
    }

    proptest! {
        #[test]
        fn prop_posterior_sums_to_one(logits in prop::collection::vec(-500.0f64..500.0, 1..12)) {
            let p = posterior(&logits);
            let total: f64 = p.iter().sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
            prop_assert!(p.iter().all(|&x| (0.0..=1.0).contains(&x)));
        }

        #[test]
        fn prop_posterior_shift_invariant(
            logits in prop::collection::vec(-50.0f64..50.0, 1..8),
            shift in -100.0f64..100.0,
        ) {
            let shifted: Vec<f64> = logits.iter().map(|x| x + shift).collect();
            for (a, b) in posterior(&logits).iter().zip(posterior(&shifted)) {
                prop_assert!((a - b).abs() < 1e-9);
            }
        }

        #[test]
        fn prop_posterior_matches_naive_softmax(
            logits in prop::collection::vec(-20.0f64..20.0, 1..10),
        ) {
            let exps: Vec<f64> = logits.iter().map(|x| x.exp()).collect();
            let total: f64 = exps.iter().sum();
            for (p, e) in posterior(&logits).iter().zip(&exps) {
                prop_assert!((p - e / total).abs() < 1e-9);
            }
        }
    }
}
