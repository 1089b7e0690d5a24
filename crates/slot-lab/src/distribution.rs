//! Distributions: quota-weighted sub-populations of a bet mode
//!
//! A distribution never edits an evaluated win. It only decides which reel
//! sets are drawn from, whether the base board is forced to show scatters,
//! and which finalized outcomes are accepted; anything else is redrawn.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GameType;

/// Tolerance when comparing a finalized win against `win_criteria`
pub const WIN_CRITERIA_EPSILON: f64 = 1e-9;

/// Drawing and forcing rules for one distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionConditions {
    /// Game type → reel set name → weight
    #[serde(default)]
    pub reel_weights: BTreeMap<GameType, BTreeMap<String, u32>>,
    /// Scatter count → weight, used when the base board is forced to trigger
    #[serde(default)]
    pub scatter_triggers: BTreeMap<u8, u32>,
    #[serde(default)]
    pub force_wincap: bool,
    #[serde(default)]
    pub force_freegame: bool,
}

/// A named sub-population of a bet mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    /// Classification tag ("wincap", "freegame", "0", "basegame", ...)
    pub criteria: String,
    /// Fraction of the bet mode's simulations, in (0, 1]
    pub quota: f64,
    /// Exact finalized win this sub-population must produce
    #[serde(default)]
    pub win_criteria: Option<f64>,
    #[serde(default)]
    pub conditions: DistributionConditions,
}

impl Distribution {
    pub fn new(criteria: impl Into<String>, quota: f64) -> Self {
        Self {
            criteria: criteria.into(),
            quota,
            win_criteria: None,
            conditions: DistributionConditions::default(),
        }
    }

    /// Builder: require an exact finalized win
    pub fn with_win_criteria(mut self, win: f64) -> Self {
        self.win_criteria = Some(win);
        self
    }

    /// Builder: reel set weights for one game type
    pub fn with_reel_weights<S: Into<String>>(
        mut self,
        gametype: GameType,
        weights: impl IntoIterator<Item = (S, u32)>,
    ) -> Self {
        self.conditions.reel_weights.insert(
            gametype,
            weights.into_iter().map(|(name, w)| (name.into(), w)).collect(),
        );
        self
    }

    /// Builder: scatter count weights for forced triggers
    pub fn with_scatter_triggers(mut self, triggers: impl IntoIterator<Item = (u8, u32)>) -> Self {
        self.conditions.scatter_triggers = triggers.into_iter().collect();
        self
    }

    /// Builder: force the simulation to end on the win cap
    pub fn force_wincap(mut self) -> Self {
        self.conditions.force_wincap = true;
        self
    }

    /// Builder: force the base game to enter free games
    pub fn force_freegame(mut self) -> Self {
        self.conditions.force_freegame = true;
        self
    }

    /// Reel weights for a game type, falling back to the base game table
    pub fn reel_weights_for(&self, gametype: GameType) -> Option<&BTreeMap<String, u32>> {
        self.conditions
            .reel_weights
            .get(&gametype)
            .or_else(|| self.conditions.reel_weights.get(&GameType::BaseGame))
    }

    /// Every reel set name this distribution can draw from
    pub fn reel_set_names(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .reel_weights
            .values()
            .flat_map(|weights| weights.keys().map(String::as_str))
    }

    /// Does a finalized outcome belong to this sub-population?
    ///
    /// Rejected when the win differs from `win_criteria`, when a forced free
    /// game never happened, or when the cap was hit without being asked for.
    pub fn accepts(&self, final_win: f64, triggered_freegame: bool, wincap_hit: bool) -> bool {
        if let Some(target) = self.win_criteria {
            if (final_win - target).abs() > WIN_CRITERIA_EPSILON {
                return false;
            }
        }
        if self.conditions.force_freegame && !triggered_freegame {
            return false;
        }
        if !self.conditions.force_wincap && wincap_hit {
            return false;
        }
        true
    }
}
