//! Arithmetic of the budget reallocation step.

use crate::slot::DEFAULT_TIME_LIMIT;

/// Normalized progress rate per slot: `progress_i / limit_i`.
///
/// If no slot made progress the prior is uniform.
pub fn progress_prior(observations: &[(f64, u32)]) -> Vec<f64> {
    let rates: Vec<f64> = observations
        .iter()
        .map(|&(progress, limit)| {
            if limit == 0 {
                0.0
            } else {
                progress.max(0.0) / f64::from(limit)
            }
        })
        .collect();

    let total: f64 = rates.iter().sum();
    if total <= 0.0 {
        let uniform = 1.0 / observations.len().max(1) as f64;
        return vec![uniform; observations.len()];
    }
    rates.into_iter().map(|r| r / total).collect()
}

/// Positions with a strictly positive prior.
pub fn prior_mask(prior: &[f64]) -> Vec<usize> {
    prior
        .iter()
        .enumerate()
        .filter(|(_, &p)| p > 0.0)
        .map(|(i, _)| i)
        .collect()
}

/// Seconds above the per-slot floor, summed over all slots.
pub fn distributable_budget(limits: &[u32]) -> i64 {
    limits
        .iter()
        .map(|&limit| i64::from(limit) - i64::from(DEFAULT_TIME_LIMIT))
        .sum()
}

/// `floor + round(vote * budget)` per slot.
pub fn limits_from_votes(votes: &[f64], budget: i64) -> Vec<i64> {
    votes
        .iter()
        .map(|&vote| i64::from(DEFAULT_TIME_LIMIT) + (vote * budget as f64).round() as i64)
        .collect()
}
