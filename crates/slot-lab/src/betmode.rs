//! Bet modes and quota-exact distribution plans

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::error::{ConfigError, ConfigResult};

/// Allowed deviation of the quota sum from 1.0
pub const QUOTA_TOLERANCE: f64 = 1e-6;

/// A named wager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetMode {
    pub name: String,
    /// Stake as a multiple of the base bet
    pub cost: f64,
    /// Target return-to-player
    pub rtp: f64,
    /// Win cap, in base-bet multiples
    pub max_win: f64,
    #[serde(default)]
    pub auto_close_disabled: bool,
    #[serde(default)]
    pub is_feature: bool,
    #[serde(default)]
    pub is_buybonus: bool,
    pub distributions: Vec<Distribution>,
}

impl BetMode {
    pub fn new(name: impl Into<String>, cost: f64, rtp: f64, max_win: f64) -> Self {
        Self {
            name: name.into(),
            cost,
            rtp,
            max_win,
            auto_close_disabled: false,
            is_feature: false,
            is_buybonus: false,
            distributions: Vec::new(),
        }
    }

    /// Builder: append a distribution
    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distributions.push(distribution);
        self
    }

    pub fn quota_sum(&self) -> f64 {
        self.distributions.iter().map(|d| d.quota).sum()
    }

    pub fn distribution(&self, criteria: &str) -> Option<&Distribution> {
        self.distributions.iter().find(|d| d.criteria == criteria)
    }

    /// Quotas must each lie in (0, 1] and sum to 1.0
    pub fn validate(&self) -> ConfigResult<()> {
        if self.distributions.is_empty() {
            return Err(ConfigError::EmptyBetMode(self.name.clone()));
        }
        if !(self.cost > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "bet mode '{}' cost must be positive",
                self.name
            )));
        }
        if !(self.max_win > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "bet mode '{}' max_win must be positive",
                self.name
            )));
        }
        for dist in &self.distributions {
            if !(dist.quota > 0.0 && dist.quota <= 1.0) {
                return Err(ConfigError::InvalidQuota {
                    mode: self.name.clone(),
                    criteria: dist.criteria.clone(),
                    quota: dist.quota,
                });
            }
        }
        let sum = self.quota_sum();
        if (sum - 1.0).abs() > QUOTA_TOLERANCE {
            return Err(ConfigError::QuotaSum {
                mode: self.name.clone(),
                sum,
            });
        }
        Ok(())
    }
}

/// Fixed assignment of simulation indices to distributions.
///
/// Each distribution receives `quota / quota_sum × N` simulations (largest
/// remainder rounding so the counts sum to exactly N). Assignments are shuffled with the plan
/// seed, so the distribution of a simulation is known before any board is
/// drawn.
#[derive(Debug, Clone)]
pub struct DistributionPlan {
    assignments: Vec<u32>,
    counts: Vec<u64>,
}

impl DistributionPlan {
    pub fn new(bet_mode: &BetMode, num_sims: u64, seed: u64) -> Self {
        let counts = Self::allocate(bet_mode, num_sims);

        let mut assignments = Vec::with_capacity(num_sims as usize);
        for (index, &count) in counts.iter().enumerate() {
            assignments.extend(std::iter::repeat_n(index as u32, count as usize));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        assignments.shuffle(&mut rng);

        Self {
            assignments,
            counts,
        }
    }

    fn allocate(bet_mode: &BetMode, num_sims: u64) -> Vec<u64> {
        let quota_sum = bet_mode.quota_sum();
        if bet_mode.distributions.is_empty() || !(quota_sum > 0.0) {
            return vec![0; bet_mode.distributions.len()];
        }
        let exact: Vec<f64> = bet_mode
            .distributions
            .iter()
            .map(|d| d.quota / quota_sum * num_sims as f64)
            .collect();
        let mut counts: Vec<u64> = exact
            .iter()
            .map(|e| (e.floor() as u64).min(num_sims))
            .collect();

        // Largest remainder first
        let mut order: Vec<usize> = (0..exact.len()).collect();
        order.sort_by(|&a, &b| {
            let fa = exact[a] - counts[a] as f64;
            let fb = exact[b] - counts[b] as f64;
            fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal)
        });

        let assigned: u64 = counts.iter().sum();
        if assigned < num_sims {
            for &index in order.iter().cycle().take((num_sims - assigned) as usize) {
                counts[index] += 1;
            }
        } else {
            // Rounding overshoot comes off the smallest remainders
            let mut excess = assigned - num_sims;
            for &index in order.iter().rev().cycle() {
                if excess == 0 {
                    break;
                }
                if counts[index] > 0 {
                    counts[index] -= 1;
                    excess -= 1;
                }
            }
        }
        counts
    }

    /// Distribution index for a simulation, `None` past the end of the plan
    pub fn distribution_for(&self, sim: u64) -> Option<usize> {
        self.assignments.get(sim as usize).map(|&i| i as usize)
    }

    /// The distribution a simulation belongs to
    pub fn criteria_for<'m>(&self, bet_mode: &'m BetMode, sim: u64) -> Option<&'m Distribution> {
        self.distribution_for(sim)
            .and_then(|index| bet_mode.distributions.get(index))
    }

    /// Simulations assigned to each distribution, in bet mode order
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
