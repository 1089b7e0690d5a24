//! Per-simulation win accumulation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GameType;

/// Round to whole cents of the base bet
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// The immutable result of [`WinManager::finalize`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalWin {
    /// Cent-rounded win, clamped to the cap
    pub payout: f64,
    /// Accumulated win before rounding and clamping
    pub uncapped: f64,
    /// Clamp applied
    pub capped: bool,
    /// Base game share of `payout`
    pub basegame_win: f64,
    /// Free game share of `payout`; the two shares always sum to it
    pub freegame_win: f64,
}

/// Accumulates one simulation's wins, split by game type.
///
/// Board wins go into `spin_win` and `total_win`; `update_gametype_wins`
/// moves the pending `spin_win` into the phase total, so after every flush
/// the phase totals sum to `total_win`.
#[derive(Debug, Clone, Default)]
pub struct WinManager {
    spin_win: f64,
    total_win: f64,
    gametype_wins: BTreeMap<GameType, f64>,
    finalized: Option<FinalWin>,
}

impl WinManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a board win to the running totals
    pub fn update_wins(&mut self, amount: f64) {
        self.spin_win += amount;
        self.total_win += amount;
    }

    /// Credit the pending board win to `gametype`
    pub fn update_gametype_wins(&mut self, gametype: GameType) {
        *self.gametype_wins.entry(gametype).or_insert(0.0) += self.spin_win;
        self.spin_win = 0.0;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn total_win(&self) -> f64 {
        self.total_win
    }

    /// Win not yet credited to a game type
    pub fn spin_win(&self) -> f64 {
        self.spin_win
    }

    pub fn gametype_win(&self, gametype: GameType) -> f64 {
        self.gametype_wins.get(&gametype).copied().unwrap_or(0.0)
    }

    pub fn gametype_wins(&self) -> &BTreeMap<GameType, f64> {
        &self.gametype_wins
    }

    /// Has the running total reached `max_win`?
    pub fn reached_cap(&self, max_win: f64) -> bool {
        self.total_win >= max_win
    }

    /// Round, clamp to `max_win` and freeze the result.
    ///
    /// Later calls return the frozen record until [`reset`](Self::reset).
    pub fn finalize(&mut self, max_win: f64) -> FinalWin {
        if let Some(done) = self.finalized {
            return done;
        }
        let rounded = round_to_cents(self.total_win);
        let capped = rounded >= max_win;
        let payout = if capped { max_win } else { rounded };

        // Base game is credited first; free games take what is left of the payout
        let basegame_win = round_to_cents(self.gametype_win(GameType::BaseGame)).min(payout);
        let done = FinalWin {
            payout,
            uncapped: self.total_win,
            capped,
            basegame_win,
            freegame_win: round_to_cents(payout - basegame_win).max(0.0),
        };
        self.finalized = Some(done);
        done
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }
}
