//! Game document parser
//!
//! Reads a game description in JSON or YAML into a validated
//! [`GameConfig`]. Reel sets are referenced by file name and loaded from CSV
//! relative to a reel directory.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let parser = ConfigParser::new();
//! let config = parser.load_path(Path::new("games/golden_fortune.yaml"))?;
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::betmode::BetMode;
use crate::config::{GameConfig, GameType};
use crate::error::{ConfigError, ConfigResult};
use crate::paytable::{PayTable, Payline, PaytableEntry};
use crate::reels::ReelSet;
use crate::symbols::SymbolSet;

/// Game document parser
pub struct ConfigParser {
    pub limits: ConfigLimits,
}

/// Size limits applied before anything is built
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    pub max_symbols: usize,
    pub max_paylines: usize,
    pub max_reels: usize,
    pub max_rows: u8,
    pub max_bet_modes: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_symbols: 50,
            max_paylines: 100,
            max_reels: 10,
            max_rows: 10,
            max_bet_modes: 16,
        }
    }
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParser {
    pub fn new() -> Self {
        Self {
            limits: ConfigLimits::default(),
        }
    }

    pub fn with_limits(limits: ConfigLimits) -> Self {
        Self { limits }
    }

    /// Parse a JSON document; reel files resolve against `reel_dir`
    pub fn parse_json(&self, json: &str, reel_dir: &Path) -> ConfigResult<GameConfig> {
        let doc: GameDocument = serde_json::from_str(json)?;
        self.build(doc, reel_dir)
    }

    /// Parse a YAML document; reel files resolve against `reel_dir`
    pub fn parse_yaml(&self, yaml: &str, reel_dir: &Path) -> ConfigResult<GameConfig> {
        let doc: GameDocument =
            serde_yml::from_str(yaml).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        self.build(doc, reel_dir)
    }

    /// Load a `.json`, `.yaml` or `.yml` file; reel files sit next to it
    pub fn load_path(&self, path: &Path) -> ConfigResult<GameConfig> {
        let text = std::fs::read_to_string(path)?;
        let reel_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => self.parse_yaml(&text, reel_dir)?,
            _ => self.parse_json(&text, reel_dir)?,
        };
        log::info!("Loaded game '{}' from {}", config.game_id, path.display());
        Ok(config)
    }

    /// Check document sizes against the limits
    pub fn check_limits(&self, doc: &GameDocument) -> ConfigResult<()> {
        let too_many = |what: &str, got: usize, max: usize| {
            ConfigError::InvalidValue(format!("Too many {}: {} > {}", what, got, max))
        };

        if doc.grid.reels > self.limits.max_reels {
            return Err(too_many("reels", doc.grid.reels, self.limits.max_reels));
        }
        if let Some(&rows) = doc.grid.rows.iter().max() {
            if rows > self.limits.max_rows {
                return Err(too_many("rows", rows as usize, self.limits.max_rows as usize));
            }
        }
        if doc.paylines.len() > self.limits.max_paylines {
            return Err(too_many("paylines", doc.paylines.len(), self.limits.max_paylines));
        }
        if doc.bet_modes.len() > self.limits.max_bet_modes {
            return Err(too_many("bet modes", doc.bet_modes.len(), self.limits.max_bet_modes));
        }
        let symbols = Self::symbol_set(doc);
        if symbols.len() > self.limits.max_symbols {
            return Err(too_many("symbols", symbols.len(), self.limits.max_symbols));
        }
        Ok(())
    }

    fn build(&self, doc: GameDocument, reel_dir: &Path) -> ConfigResult<GameConfig> {
        self.check_limits(&doc)?;

        let symbols = Self::symbol_set(&doc);
        let mut reel_sets = BTreeMap::new();
        for (name, file) in &doc.reels {
            let path = reel_dir.join(file);
            if !path.exists() {
                return Err(ConfigError::MissingReelFile(path.display().to_string()));
            }
            reel_sets.insert(name.clone(), ReelSet::from_csv_path(name.as_str(), &path, &symbols)?);
        }

        let paylines = doc
            .paylines
            .into_iter()
            .map(|(index, rows)| Payline::new(index, rows))
            .collect();
        let paytable = PayTable::new(symbols, &doc.paytable, paylines)?;

        let num_rows = if doc.grid.rows.len() == 1 {
            vec![doc.grid.rows[0]; doc.grid.reels]
        } else {
            doc.grid.rows
        };

        let config = GameConfig {
            game_id: doc.game.id,
            working_name: doc.game.name,
            provider_number: doc.game.provider_number,
            wincap: doc.game.wincap,
            win_type: doc.game.win_type,
            rtp: doc.game.rtp,
            num_reels: doc.grid.reels,
            num_rows,
            paytable,
            freespin_triggers: doc.freespin_triggers,
            anticipation_triggers: doc.anticipation_triggers,
            wild_multipliers: doc.wild_multipliers,
            reel_sets,
            bet_modes: doc.bet_modes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Paytable symbols in order of appearance, then the special and extra ones
    fn symbol_set(doc: &GameDocument) -> SymbolSet {
        let mut names: Vec<&str> = Vec::new();
        let listed = doc
            .paytable
            .iter()
            .map(|e| e.symbol.as_str())
            .chain(doc.symbols.wild.iter().map(String::as_str))
            .chain(doc.symbols.scatter.iter().map(String::as_str))
            .chain(doc.symbols.extra.iter().map(String::as_str));
        for name in listed {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        let wild: Vec<&str> = doc.symbols.wild.iter().map(String::as_str).collect();
        let scatter: Vec<&str> = doc.symbols.scatter.iter().map(String::as_str).collect();
        SymbolSet::new(&names, &wild, &scatter)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENT SCHEMA
// ═══════════════════════════════════════════════════════════════════════════════

/// Raw game document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDocument {
    pub game: GameSection,
    pub grid: GridSection,
    #[serde(default)]
    pub symbols: SymbolSection,
    pub paytable: Vec<PaytableEntry>,
    /// Line index → row per reel
    pub paylines: BTreeMap<u16, Vec<u8>>,
    #[serde(default)]
    pub freespin_triggers: BTreeMap<GameType, BTreeMap<u8, u32>>,
    #[serde(default)]
    pub anticipation_triggers: BTreeMap<GameType, u8>,
    #[serde(default)]
    pub wild_multipliers: BTreeMap<GameType, BTreeMap<u32, u32>>,
    /// Reel set name → CSV file name
    pub reels: BTreeMap<String, String>,
    pub bet_modes: Vec<BetMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub provider_number: u32,
    pub wincap: f64,
    pub rtp: f64,
    #[serde(default = "default_win_type")]
    pub win_type: String,
}

fn default_win_type() -> String {
    "lines".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSection {
    pub reels: usize,
    /// Rows per reel, or a single value for every reel
    pub rows: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolSection {
    #[serde(default)]
    pub wild: Vec<String>,
    #[serde(default)]
    pub scatter: Vec<String>,
    /// Symbols that appear on reels but not in the paytable
    #[serde(default)]
    pub extra: Vec<String>,
}
