//! Time menus offered to controllers.
//!
//! A [`TimeDistribution`] is the ascending list of time limits (seconds) a
//! controller may propose for a slot. Two policies are supported:
//!
//! - **Uniform**: `d, 2d, 3d, ...` up to the cap `M`
//! - **Exponential**: `d, 2d, 4d, ...` saturating at `M`

use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, Result};

/// Spacing policy for the time menu.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TimeScale {
    /// Evenly spaced offers: `d, 2d, 3d, ...` while `<= M`.
    #[default]
    Uniform,
    /// Doubling offers: `min(M, d * 2^k)` until the cap is reached.
    Exponential,
}

/// Ordered, strictly increasing menu of time limits, all `<= cap`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeDistribution {
    scale: TimeScale,
    cap: u32,
    granularity: u32,
    offers: Vec<u32>,
}

impl TimeDistribution {
    /// Build the menu for `scale` with cap `M = cap` and granularity `d = granularity`.
    ///
    /// # Errors
    ///
    /// Returns [`PortfolioError::InvalidTimeDistribution`] if either parameter is zero.
    pub fn new(scale: TimeScale, cap: u32, granularity: u32) -> Result<Self> {
        if cap == 0 || granularity == 0 {
            return Err(PortfolioError::InvalidTimeDistribution { cap, granularity });
        }

        let offers = match scale {
            TimeScale::Uniform => uniform(cap, granularity),
            TimeScale::Exponential => exponential(cap, granularity),
        };

        Ok(Self {
            scale,
            cap,
            granularity,
            offers,
        })
    }

    /// The offered time limits in ascending order.
    pub fn offers(&self) -> &[u32] {
        &self.offers
    }

    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn granularity(&self) -> u32 {
        self.granularity
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

/// `d, 2d, ..., floor(M/d) * d`.
pub fn uniform(cap: u32, granularity: u32) -> Vec<u32> {
    if granularity == 0 {
        return Vec::new();
    }
    (1..=cap / granularity).map(|k| k * granularity).collect()
}

/// `min(M, d * 2^k)` for `k = 0, 1, ...`, stopping once the cap is reached.
///
/// The saturated value appears exactly once, so the menu is strictly increasing.
pub fn exponential(cap: u32, granularity: u32) -> Vec<u32> {
    if granularity == 0 {
        return Vec::new();
    }

    let mut offers = Vec::new();
    let mut value = u64::from(granularity);
    loop {
        let offer = value.min(u64::from(cap)) as u32;
        offers.push(offer);
        if offer == cap {
            break;
        }
        value *= 2;
    }
    offers
}
