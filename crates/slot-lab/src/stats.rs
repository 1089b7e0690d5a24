//! Batch statistics fed to optimization tooling
//!
//! One `BatchStats` per worker, merged afterwards.

use serde::{Deserialize, Serialize};

use crate::book::SimulationRecord;

/// Upper bounds (exclusive, in base-bet multiples) of the win bands.
/// Band 0 holds zero wins; the last band is open-ended.
pub const WIN_BANDS: [f64; 9] = [0.0, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 1000.0];

/// Aggregate statistics of a batch of simulations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub simulations: u64,
    pub wins: u64,
    pub total_win: f64,
    pub basegame_win: f64,
    pub freegame_win: f64,
    pub max_win: f64,
    pub freegame_triggers: u64,
    pub wincap_hits: u64,
    /// Simulation count per win band, see [`WIN_BANDS`]
    pub bands: Vec<u64>,
}

impl Default for BatchStats {
    fn default() -> Self {
        Self {
            simulations: 0,
            wins: 0,
            total_win: 0.0,
            basegame_win: 0.0,
            freegame_win: 0.0,
            max_win: 0.0,
            freegame_triggers: 0,
            wincap_hits: 0,
            bands: vec![0; WIN_BANDS.len() + 1],
        }
    }
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Band index for a finalized win
    pub fn band_of(win: f64) -> usize {
        if win <= 0.0 {
            return 0;
        }
        WIN_BANDS
            .iter()
            .skip(1)
            .position(|&upper| win < upper)
            .map(|i| i + 1)
            .unwrap_or(WIN_BANDS.len())
    }

    pub fn record(&mut self, record: &SimulationRecord) {
        let win = record.payout_multiplier;
        self.simulations += 1;
        self.total_win += win;
        self.basegame_win += record.basegame_win;
        self.freegame_win += record.freegame_win;
        self.max_win = self.max_win.max(win);
        if record.is_win() {
            self.wins += 1;
        }
        if record.triggered_freegame {
            self.freegame_triggers += 1;
        }
        if record.wincap {
            self.wincap_hits += 1;
        }
        self.bands[Self::band_of(win)] += 1;
    }

    pub fn merge(&mut self, other: &BatchStats) {
        self.simulations += other.simulations;
        self.wins += other.wins;
        self.total_win += other.total_win;
        self.basegame_win += other.basegame_win;
        self.freegame_win += other.freegame_win;
        self.max_win = self.max_win.max(other.max_win);
        self.freegame_triggers += other.freegame_triggers;
        self.wincap_hits += other.wincap_hits;
        for (mine, theirs) in self.bands.iter_mut().zip(&other.bands) {
            *mine += theirs;
        }
    }

    pub fn mean_win(&self) -> f64 {
        if self.simulations == 0 {
            return 0.0;
        }
        self.total_win / self.simulations as f64
    }

    /// Return to player for a bet mode costing `cost` base bets
    pub fn rtp(&self, cost: f64) -> f64 {
        if self.simulations == 0 || cost <= 0.0 {
            return 0.0;
        }
        self.mean_win() / cost
    }

    pub fn basegame_rtp(&self, cost: f64) -> f64 {
        self.share_rtp(self.basegame_win, cost)
    }

    pub fn freegame_rtp(&self, cost: f64) -> f64 {
        self.share_rtp(self.freegame_win, cost)
    }

    fn share_rtp(&self, win: f64, cost: f64) -> f64 {
        if self.simulations == 0 || cost <= 0.0 {
            return 0.0;
        }
        win / self.simulations as f64 / cost
    }

    pub fn hit_rate(&self) -> f64 {
        if self.simulations == 0 {
            return 0.0;
        }
        self.wins as f64 / self.simulations as f64
    }

    pub fn freegame_frequency(&self) -> f64 {
        if self.simulations == 0 {
            return 0.0;
        }
        self.freegame_triggers as f64 / self.simulations as f64
    }
}
