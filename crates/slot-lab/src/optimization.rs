//! Optimization parameters
//!
//! Weights and tolerances an external optimizer uses to judge batch
//! statistics. Nothing here adjusts reel weights.

use serde::{Deserialize, Serialize};

use crate::betmode::BetMode;
use crate::error::{ConfigError, ConfigResult};
use crate::stats::BatchStats;

/// How simulation statistics are weighed for RTP convergence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationParameters {
    pub rtp_weight: f64,
    pub hit_rate_weight: f64,
    pub avg_win_weight: f64,
    /// Accepted absolute RTP deviation (0.001 = 0.1%)
    pub rtp_tolerance: f64,
    pub max_iterations: u32,
}

impl Default for OptimizationParameters {
    fn default() -> Self {
        Self::golden_fortune()
    }
}

impl OptimizationParameters {
    pub fn golden_fortune() -> Self {
        Self {
            rtp_weight: 1.0,
            hit_rate_weight: 0.5,
            avg_win_weight: 0.3,
            rtp_tolerance: 0.001,
            max_iterations: 1000,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let weights = [
            ("rtp_weight", self.rtp_weight),
            ("hit_rate_weight", self.hit_rate_weight),
            ("avg_win_weight", self.avg_win_weight),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidValue(format!("{} must be non-negative", name)));
            }
        }
        if weights.iter().all(|(_, w)| *w == 0.0) {
            return Err(ConfigError::InvalidValue("all optimization weights are zero".into()));
        }
        if !(self.rtp_tolerance > 0.0) {
            return Err(ConfigError::InvalidValue("rtp_tolerance must be positive".into()));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue("max_iterations must be at least 1".into()));
        }
        Ok(())
    }

    /// Weighted relative deviation of `stats` from `targets`; 0 is a perfect
    /// match. Targets left unset do not contribute.
    pub fn objective(&self, stats: &BatchStats, cost: f64, targets: &OptimizationTargets) -> f64 {
        let deviation = |actual: f64, target: f64| {
            if target == 0.0 {
                actual.abs()
            } else {
                ((actual - target) / target).abs()
            }
        };

        let mut score = self.rtp_weight * deviation(stats.rtp(cost), targets.rtp);
        if let Some(hit_rate) = targets.hit_rate {
            score += self.hit_rate_weight * deviation(stats.hit_rate(), hit_rate);
        }
        if let Some(avg_win) = targets.avg_win {
            score += self.avg_win_weight * deviation(stats.mean_win(), avg_win);
        }
        score
    }

    /// Is the batch RTP within tolerance of `target_rtp`?
    pub fn rtp_converged(&self, stats: &BatchStats, cost: f64, target_rtp: f64) -> bool {
        (stats.rtp(cost) - target_rtp).abs() <= self.rtp_tolerance
    }
}

/// Statistic targets for one bet mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationTargets {
    pub rtp: f64,
    #[serde(default)]
    pub hit_rate: Option<f64>,
    /// Mean win in base-bet multiples
    #[serde(default)]
    pub avg_win: Option<f64>,
}

impl OptimizationTargets {
    pub fn for_bet_mode(bet_mode: &BetMode) -> Self {
        Self {
            rtp: bet_mode.rtp,
            hit_rate: None,
            avg_win: None,
        }
    }

    pub fn with_hit_rate(mut self, hit_rate: f64) -> Self {
        self.hit_rate = Some(hit_rate);
        self
    }

    pub fn with_avg_win(mut self, avg_win: f64) -> Self {
        self.avg_win = Some(avg_win);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stats(total_win: f64, wins: u64, simulations: u64) -> BatchStats {
        BatchStats {
            simulations,
            wins,
            total_win,
            ..BatchStats::default()
        }
    }

    #[test]
    fn test_defaults() {
        let params = OptimizationParameters::default();
        assert_eq!(params.rtp_weight, 1.0);
        assert_eq!(params.hit_rate_weight, 0.5);
        assert_eq!(params.avg_win_weight, 0.3);
        assert_eq!(params.rtp_tolerance, 0.001);
        assert_eq!(params.max_iterations, 1000);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let negative = OptimizationParameters {
            hit_rate_weight: -0.1,
            ..OptimizationParameters::default()
        };
        assert!(negative.validate().is_err());

        let no_tolerance = OptimizationParameters {
            rtp_tolerance: 0.0,
            ..OptimizationParameters::default()
        };
        assert!(no_tolerance.validate().is_err());
    }

    #[test]
    fn test_rtp_convergence() {
        let params = OptimizationParameters::default();
        assert!(params.rtp_converged(&stats(960.5, 300, 1000), 1.0, 0.96));
        assert!(!params.rtp_converged(&stats(950.0, 300, 1000), 1.0, 0.96));
        // Bonus mode: cost 100
        assert!(params.rtp_converged(&stats(96_000.0, 1000, 1000), 100.0, 0.96));
    }

    #[test]
    fn test_objective() {
        let params = OptimizationParameters::default();
        let on_target = stats(960.0, 250, 1000);
        let targets = OptimizationTargets {
            rtp: 0.96,
            hit_rate: None,
            avg_win: None,
        }
        .with_hit_rate(0.25);
        assert_relative_eq!(params.objective(&on_target, 1.0, &targets), 0.0, epsilon = 1e-12);

        let off = stats(480.0, 500, 1000);
        // rtp 50% low (1.0 × 0.5) + hit rate 100% high (0.5 × 1.0)
        assert_relative_eq!(params.objective(&off, 1.0, &targets), 1.0, epsilon = 1e-12);
    }
}
