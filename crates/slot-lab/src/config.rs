//! Game configuration
//!
//! `GameConfig` is built once (programmatically or through
//! [`ConfigParser`](crate::parser::ConfigParser)), validated, and then shared
//! read-only by every simulation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::betmode::BetMode;
use crate::distribution::Distribution;
use crate::error::{ConfigError, ConfigResult, DrawError};
use crate::paytable::{PayTable, PaytableEntry, golden_fortune_paylines};
use crate::reels::ReelSet;
use crate::symbols::SymbolSet;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameType {
    #[serde(rename = "basegame")]
    BaseGame,
    #[serde(rename = "freegame")]
    FreeGame,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaseGame => "basegame",
            Self::FreeGame => "freegame",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reel set files of the Golden Fortune preset, by reel set name
pub const GOLDEN_FORTUNE_REEL_FILES: [(&str, &str); 3] = [
    ("BASE", "base_reels.csv"),
    ("FREE", "free_reels.csv"),
    ("FREECAP", "free_reels_wincap.csv"),
];

/// Complete, immutable description of one game
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub game_id: String,
    pub working_name: String,
    pub provider_number: u32,
    /// Maximum payout, in base-bet multiples
    pub wincap: f64,
    /// Evaluation style tag ("lines")
    pub win_type: String,
    pub rtp: f64,
    pub num_reels: usize,
    pub num_rows: Vec<u8>,
    pub paytable: PayTable,
    /// Game type → scatter count → free spins awarded
    pub freespin_triggers: BTreeMap<GameType, BTreeMap<u8, u32>>,
    /// Game type → scatter count at which anticipation starts
    pub anticipation_triggers: BTreeMap<GameType, u8>,
    /// Game type → multiplier value → weight, attached to drawn wilds
    pub wild_multipliers: BTreeMap<GameType, BTreeMap<u32, u32>>,
    pub reel_sets: BTreeMap<String, ReelSet>,
    pub bet_modes: Vec<BetMode>,
}

impl GameConfig {
    /// Golden Fortune: 5×3, 20 lines, WILD/SCATTER, wincap 5000
    pub fn golden_fortune(reel_sets: impl IntoIterator<Item = ReelSet>) -> ConfigResult<Self> {
        let symbols = Self::golden_fortune_symbols();
        let paytable = PayTable::new(
            symbols,
            &Self::golden_fortune_paytable_entries(),
            golden_fortune_paylines(),
        )?;
        let wincap = 5000.0;
        let rtp = 0.96;

        let config = Self {
            game_id: "golden_fortune".into(),
            working_name: "Golden Fortune Slots".into(),
            provider_number: 1,
            wincap,
            win_type: "lines".into(),
            rtp,
            num_reels: 5,
            num_rows: vec![3; 5],
            paytable,
            freespin_triggers: BTreeMap::from([
                (GameType::BaseGame, BTreeMap::from([(3, 10), (4, 15), (5, 20)])),
                (GameType::FreeGame, BTreeMap::from([(3, 5), (4, 10), (5, 15)])),
            ]),
            anticipation_triggers: BTreeMap::from([(GameType::BaseGame, 2), (GameType::FreeGame, 2)]),
            wild_multipliers: BTreeMap::new(),
            reel_sets: reel_sets.into_iter().map(|r| (r.name.clone(), r)).collect(),
            bet_modes: Self::golden_fortune_bet_modes(rtp, wincap),
        };
        config.validate()?;
        Ok(config)
    }

    /// Golden Fortune with its reel sets read from `reel_dir`
    pub fn load_golden_fortune(reel_dir: &Path) -> ConfigResult<Self> {
        let symbols = Self::golden_fortune_symbols();
        let reel_sets = GOLDEN_FORTUNE_REEL_FILES
            .iter()
            .map(|(name, file)| {
                let path = reel_dir.join(file);
                if !path.exists() {
                    return Err(ConfigError::MissingReelFile(path.display().to_string()));
                }
                ReelSet::from_csv_path(*name, &path, &symbols)
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Self::golden_fortune(reel_sets)
    }

    pub fn golden_fortune_symbols() -> SymbolSet {
        SymbolSet::new(
            &[
                "WILD", "GOLD", "GEM", "COIN", "RING", "ACE", "KING", "QUEEN", "JACK", "TEN",
                "SCATTER",
            ],
            &["WILD"],
            &["SCATTER"],
        )
    }

    pub fn golden_fortune_paytable_entries() -> Vec<PaytableEntry> {
        let pays: [(&str, [f64; 3]); 10] = [
            ("WILD", [15.0, 40.0, 100.0]),
            ("GOLD", [8.0, 20.0, 50.0]),
            ("GEM", [6.0, 15.0, 40.0]),
            ("COIN", [4.0, 10.0, 30.0]),
            ("RING", [3.0, 8.0, 25.0]),
            ("ACE", [2.0, 6.0, 20.0]),
            ("KING", [1.5, 4.0, 15.0]),
            ("QUEEN", [1.0, 3.0, 12.0]),
            ("JACK", [0.8, 2.5, 10.0]),
            ("TEN", [0.5, 2.0, 8.0]),
        ];
        pays.iter()
            .flat_map(|(symbol, by_kind)| {
                by_kind
                    .iter()
                    .enumerate()
                    .map(move |(i, &m)| PaytableEntry::new(3 + i as u8, *symbol, m))
            })
            .collect()
    }

    pub fn golden_fortune_bet_modes(rtp: f64, wincap: f64) -> Vec<BetMode> {
        let base_reels = |d: Distribution| d.with_reel_weights(GameType::BaseGame, [("BASE", 1)]);

        let mut base = BetMode::new("base", 1.0, rtp, wincap)
            .with_distribution(
                base_reels(Distribution::new("wincap", 0.001))
                    .with_win_criteria(wincap)
                    .with_reel_weights(GameType::FreeGame, [("FREE", 1), ("FREECAP", 5)])
                    .with_scatter_triggers([(4, 1), (5, 2)])
                    .force_wincap()
                    .force_freegame(),
            )
            .with_distribution(
                base_reels(Distribution::new("freegame", 0.12))
                    .with_reel_weights(GameType::FreeGame, [("FREE", 1)])
                    .with_scatter_triggers([(3, 50), (4, 30), (5, 10)])
                    .force_freegame(),
            )
            .with_distribution(base_reels(Distribution::new("0", 0.45)).with_win_criteria(0.0))
            .with_distribution(base_reels(Distribution::new("basegame", 0.429)));
        base.is_feature = true;

        let mut bonus = BetMode::new("bonus", 100.0, rtp, wincap)
            .with_distribution(
                base_reels(Distribution::new("wincap", 0.002))
                    .with_win_criteria(wincap)
                    .with_reel_weights(GameType::FreeGame, [("FREE", 1), ("FREECAP", 5)])
                    .with_scatter_triggers([(4, 2), (5, 3)])
                    .force_wincap()
                    .force_freegame(),
            )
            .with_distribution(
                base_reels(Distribution::new("freegame", 0.998))
                    .with_reel_weights(GameType::FreeGame, [("FREE", 1)])
                    .with_scatter_triggers([(3, 30), (4, 15), (5, 5)])
                    .force_freegame(),
            );
        bonus.is_buybonus = true;

        vec![base, bonus]
    }

    /// Check the whole configuration before any simulation starts
    pub fn validate(&self) -> ConfigResult<()> {
        if self.num_reels == 0 || self.num_rows.len() != self.num_reels {
            return Err(ConfigError::InvalidValue(format!(
                "num_rows has {} entries for {} reels",
                self.num_rows.len(),
                self.num_reels
            )));
        }
        if self.num_rows.contains(&0) {
            return Err(ConfigError::InvalidValue("every reel needs at least one row".into()));
        }
        if !(self.wincap > 0.0) {
            return Err(ConfigError::InvalidValue(format!("wincap {} must be positive", self.wincap)));
        }
        self.paytable.validate_paylines(self.num_reels, &self.num_rows)?;

        for set in self.reel_sets.values() {
            set.validate(Some(self.num_reels))?;
            let alphabet = self.paytable.symbols.len() as u32;
            if set.strips.iter().flat_map(|s| &s.symbols).any(|&id| id >= alphabet) {
                return Err(ConfigError::MalformedReelSet {
                    name: set.name.clone(),
                    reason: "symbol outside the symbol set".into(),
                });
            }
        }

        if self.bet_modes.is_empty() {
            return Err(ConfigError::InvalidValue("no bet modes configured".into()));
        }
        let mut names = BTreeSet::new();
        for mode in &self.bet_modes {
            if !names.insert(mode.name.as_str()) {
                return Err(ConfigError::InvalidValue(format!("duplicate bet mode '{}'", mode.name)));
            }
            mode.validate()?;
            for dist in &mode.distributions {
                self.validate_distribution(mode, dist)?;
            }
        }

        log::info!(
            "Validated {} ({} reel sets, {} bet modes)",
            self.game_id,
            self.reel_sets.len(),
            self.bet_modes.len()
        );
        Ok(())
    }

    fn validate_distribution(&self, mode: &BetMode, dist: &Distribution) -> ConfigResult<()> {
        let invalid = |reason: String| {
            ConfigError::InvalidValue(format!(
                "bet mode '{}', distribution '{}': {}",
                mode.name, dist.criteria, reason
            ))
        };

        for name in dist.reel_set_names() {
            if !self.reel_sets.contains_key(name) {
                return Err(ConfigError::MissingReelSet(name.to_string()));
            }
        }
        match dist.reel_weights_for(GameType::BaseGame) {
            Some(weights) if weights.values().any(|&w| w > 0) => {}
            _ => return Err(invalid("no basegame reel weights".into())),
        }

        if dist.conditions.force_freegame {
            let min = self
                .min_freespin_trigger(GameType::BaseGame)
                .ok_or_else(|| invalid("forces free games but basegame has no triggers".into()))?;
            if !dist.conditions.scatter_triggers.values().any(|&w| w > 0) {
                return Err(invalid("forces free games without scatter_triggers".into()));
            }
            for &count in dist.conditions.scatter_triggers.keys() {
                if count < min || count as usize > self.num_reels {
                    return Err(invalid(format!(
                        "scatter trigger {} outside {}..={}",
                        count, min, self.num_reels
                    )));
                }
            }
        }
        if let Some(target) = dist.win_criteria {
            if target < 0.0 || target > mode.max_win {
                return Err(invalid(format!("win_criteria {} outside 0..={}", target, mode.max_win)));
            }
        }
        Ok(())
    }

    pub fn bet_mode(&self, name: &str) -> ConfigResult<&BetMode> {
        self.bet_modes
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| ConfigError::UnknownBetMode(name.to_string()))
    }

    pub fn reel_set(&self, name: &str) -> Result<&ReelSet, DrawError> {
        self.reel_sets
            .get(name)
            .ok_or_else(|| DrawError::UnknownReelSet(name.to_string()))
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.paytable.symbols
    }

    /// Smallest scatter count that awards free spins in `gametype`
    pub fn min_freespin_trigger(&self, gametype: GameType) -> Option<u8> {
        self.freespin_triggers
            .get(&gametype)
            .and_then(|t| t.keys().next().copied())
    }

    /// Free spins awarded for `scatters` in `gametype`.
    ///
    /// Counts above the highest configured key use the largest key not
    /// exceeding the count.
    pub fn freespin_award(&self, gametype: GameType, scatters: u8) -> Option<u32> {
        self.freespin_triggers
            .get(&gametype)?
            .range(..=scatters)
            .next_back()
            .map(|(_, &spins)| spins)
    }

    pub fn anticipation_threshold(&self, gametype: GameType) -> u8 {
        self.anticipation_triggers.get(&gametype).copied().unwrap_or(0)
    }
}
