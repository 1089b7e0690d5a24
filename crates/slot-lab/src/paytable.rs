//! Paytable, paylines and line win evaluation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calculations::{Calculations, GameCalculations};
use crate::error::{ConfigError, ConfigResult};
use crate::symbols::{Board, SymbolId, SymbolSet};

/// Smallest run that can pay on a line
pub const MIN_LINE_KIND: u8 = 3;

/// A payline definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payline {
    /// Payline index (1-based, as printed on the game's help screen)
    pub index: u16,
    /// Row per reel (e.g., [0, 1, 2, 1, 0] for a "V" shape)
    pub rows: Vec<u8>,
}

impl Payline {
    pub fn new(index: u16, rows: Vec<u8>) -> Self {
        Self { index, rows }
    }

    /// Create a straight line (same row across all reels)
    pub fn straight(index: u16, row: u8, reel_count: u8) -> Self {
        Self {
            index,
            rows: vec![row; reel_count as usize],
        }
    }
}

/// The 20 lines of the 5×3 Golden Fortune layout
pub fn golden_fortune_paylines() -> Vec<Payline> {
    vec![
        Payline::straight(1, 1, 5), // Middle row
        Payline::straight(2, 0, 5), // Top row
        Payline::straight(3, 2, 5), // Bottom row
        Payline::new(4, vec![0, 1, 2, 1, 0]),
        Payline::new(5, vec![2, 1, 0, 1, 2]),
        Payline::new(6, vec![1, 0, 0, 0, 1]),
        Payline::new(7, vec![1, 2, 2, 2, 1]),
        Payline::new(8, vec![0, 0, 1, 2, 2]),
        Payline::new(9, vec![2, 2, 1, 0, 0]),
        Payline::new(10, vec![1, 2, 1, 0, 1]),
        Payline::new(11, vec![1, 0, 1, 2, 1]),
        Payline::new(12, vec![0, 1, 1, 1, 0]),
        Payline::new(13, vec![2, 1, 1, 1, 2]),
        Payline::new(14, vec![0, 1, 0, 1, 0]),
        Payline::new(15, vec![2, 1, 2, 1, 2]),
        Payline::new(16, vec![1, 1, 0, 1, 1]),
        Payline::new(17, vec![1, 1, 2, 1, 1]),
        Payline::new(18, vec![0, 0, 2, 0, 0]),
        Payline::new(19, vec![2, 2, 0, 2, 2]),
        Payline::new(20, vec![1, 0, 2, 0, 1]),
    ]
}

/// One `(kind, symbol) → multiplier` entry, in file/config form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaytableEntry {
    pub kind: u8,
    pub symbol: String,
    pub multiplier: f64,
}

impl PaytableEntry {
    pub fn new(kind: u8, symbol: impl Into<String>, multiplier: f64) -> Self {
        Self {
            kind,
            symbol: symbol.into(),
            multiplier,
        }
    }
}

/// Immutable paytable plus the payline model it is evaluated against
#[derive(Debug, Clone)]
pub struct PayTable {
    /// Symbol definitions
    pub symbols: SymbolSet,
    /// Payline definitions
    pub paylines: Vec<Payline>,
    pays: BTreeMap<(u8, SymbolId), f64>,
}

impl PayTable {
    /// Build from config entries, rejecting malformed ones
    pub fn new(
        symbols: SymbolSet,
        entries: &[PaytableEntry],
        paylines: Vec<Payline>,
    ) -> ConfigResult<Self> {
        let mut pays = BTreeMap::new();
        for entry in entries {
            let malformed = |reason: &str| ConfigError::MalformedPaytable {
                count: entry.kind,
                symbol: entry.symbol.clone(),
                reason: reason.to_string(),
            };
            if !(MIN_LINE_KIND..=5).contains(&entry.kind) {
                return Err(malformed("symbol count must be 3, 4 or 5"));
            }
            if !entry.multiplier.is_finite() || entry.multiplier < 0.0 {
                return Err(malformed("multiplier must be a non-negative number"));
            }
            let id = symbols
                .id_of(&entry.symbol)
                .ok_or_else(|| malformed("symbol is not defined"))?;
            if symbols.is_scatter(id) {
                return Err(malformed("scatter symbols do not pay on lines"));
            }
            if pays.insert((entry.kind, id), entry.multiplier).is_some() {
                return Err(malformed("duplicate entry"));
            }
        }

        Ok(Self {
            symbols,
            paylines,
            pays,
        })
    }

    /// Multiplier for `kind` of `symbol`, zero when not listed
    pub fn pay(&self, kind: u8, symbol: SymbolId) -> f64 {
        self.pays.get(&(kind, symbol)).copied().unwrap_or(0.0)
    }

    /// Paytable entries back in config form, ordered by symbol then kind
    pub fn entries(&self) -> Vec<PaytableEntry> {
        self.pays
            .iter()
            .map(|(&(kind, id), &multiplier)| {
                PaytableEntry::new(kind, self.symbols.name_of(id), multiplier)
            })
            .collect()
    }

    /// Check every payline against the board geometry
    pub fn validate_paylines(&self, num_reels: usize, num_rows: &[u8]) -> ConfigResult<()> {
        for line in &self.paylines {
            if line.rows.len() != num_reels {
                return Err(ConfigError::InvalidPayline {
                    index: line.index,
                    reason: format!("{} rows for {} reels", line.rows.len(), num_reels),
                });
            }
            for (reel, &row) in line.rows.iter().enumerate() {
                if row >= num_rows[reel] {
                    return Err(ConfigError::InvalidPayline {
                        index: line.index,
                        reason: format!("row {} out of range on reel {}", row, reel),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A win result on a single payline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineWin {
    /// Payline index
    pub line_index: u16,
    /// Winning symbol ID
    pub symbol: SymbolId,
    /// Symbol name
    pub symbol_name: String,
    /// Number of matching symbols
    pub kind: u8,
    /// Win before wild multipliers
    pub base_win: f64,
    /// Final line win
    pub win: f64,
    /// Positions of winning symbols (reel, row)
    pub positions: Vec<(u8, u8)>,
    /// Wild positions included
    pub wild_positions: Vec<(u8, u8)>,
}

/// Evaluator output for one board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinData {
    pub total_win: f64,
    pub line_wins: Vec<LineWin>,
}

impl WinData {
    pub fn is_win(&self) -> bool {
        self.total_win > 0.0
    }
}

/// Board evaluation capability
pub trait BoardEvaluator: Send + Sync {
    /// Evaluate `board` against `paytable`, paying `bet` per line unit
    fn evaluate(&self, board: &Board, paytable: &PayTable, bet: f64) -> WinData;
}

/// Left-to-right payline evaluator
#[derive(Debug, Clone, Default)]
pub struct LinesEvaluator<C = GameCalculations> {
    calculations: C,
}

impl LinesEvaluator<GameCalculations> {
    pub const fn new() -> Self {
        Self {
            calculations: GameCalculations,
        }
    }
}

impl<C: Calculations> LinesEvaluator<C> {
    pub fn with_calculations(calculations: C) -> Self {
        Self { calculations }
    }

    fn evaluate_line(
        &self,
        board: &Board,
        table: &PayTable,
        payline: &Payline,
        bet: f64,
    ) -> Option<LineWin> {
        if payline.rows.len() != board.reel_count() {
            return None;
        }

        let cells = payline
            .rows
            .iter()
            .enumerate()
            .map(|(reel, &row)| board.cell(reel, row as usize).copied())
            .collect::<Option<Vec<_>>>()?;
        let symbols = &table.symbols;

        let wild_run = cells.iter().take_while(|c| symbols.is_wild(c.symbol)).count();
        let base = cells.iter().map(|c| c.symbol).find(|&s| !symbols.is_wild(s));

        let substituted = base
            .filter(|&s| self.calculations.can_substitute(symbols, s))
            .map(|s| {
                let run = cells
                    .iter()
                    .take_while(|c| c.symbol == s || symbols.is_wild(c.symbol))
                    .count();
                (s, run as u8, table.pay(run as u8, s))
            });
        let as_wild = (wild_run > 0).then(|| {
            let wild = cells[0].symbol;
            (wild, wild_run as u8, table.pay(wild_run as u8, wild))
        });

        // A leading wild run pays as whichever reading is worth more
        let (symbol, kind, pay) = match (substituted, as_wild) {
            (Some(s), Some(w)) if w.2 > s.2 => w,
            (Some(s), _) => s,
            (None, Some(w)) => w,
            (None, None) => return None,
        };
        if kind < MIN_LINE_KIND || pay <= 0.0 {
            return None;
        }

        let mut positions = Vec::with_capacity(kind as usize);
        let mut wild_positions = Vec::new();
        let mut multipliers = Vec::new();
        for (reel, cell) in cells.iter().take(kind as usize).enumerate() {
            let pos = (reel as u8, payline.rows[reel]);
            positions.push(pos);
            if symbols.is_wild(cell.symbol) {
                wild_positions.push(pos);
                multipliers.extend(cell.multiplier);
            }
        }

        let base_win = pay * bet;
        Some(LineWin {
            line_index: payline.index,
            symbol,
            symbol_name: symbols.name_of(symbol).to_string(),
            kind,
            base_win,
            win: self.calculations.apply_multiplier(base_win, &multipliers),
            positions,
            wild_positions,
        })
    }
}

impl<C: Calculations> BoardEvaluator for LinesEvaluator<C> {
    fn evaluate(&self, board: &Board, paytable: &PayTable, bet: f64) -> WinData {
        let line_wins: Vec<LineWin> = paytable
            .paylines
            .iter()
            .filter_map(|line| self.evaluate_line(board, paytable, line, bet))
            .collect();
        let total_win = line_wins.iter().map(|w| w.win).sum();

        WinData {
            total_win,
            line_wins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn table() -> PayTable {
        let symbols = SymbolSet::new(
            &["WILD", "GOLD", "TEN", "ACE", "SCATTER"],
            &["WILD"],
            &["SCATTER"],
        );
        let entries = vec![
            PaytableEntry::new(5, "WILD", 100.0),
            PaytableEntry::new(4, "WILD", 40.0),
            PaytableEntry::new(3, "WILD", 15.0),
            PaytableEntry::new(5, "GOLD", 50.0),
            PaytableEntry::new(4, "GOLD", 20.0),
            PaytableEntry::new(3, "GOLD", 8.0),
            PaytableEntry::new(3, "TEN", 0.5),
        ];
        PayTable::new(symbols, &entries, golden_fortune_paylines()).unwrap()
    }

    fn grid(table: &PayTable, rows: [[&str; 5]; 3]) -> Board {
        let id = |n: &str| table.symbols.id_of(n).unwrap();
        let columns = (0..5)
            .map(|reel| (0..3).map(|row| id(rows[row][reel])).collect())
            .collect();
        Board::from_symbols("TEST", columns)
    }

    #[test]
    fn test_payline_straight() {
        let line = Payline::straight(1, 1, 5);
        assert_eq!(line.rows, vec![1, 1, 1, 1, 1]);
        assert_eq!(golden_fortune_paylines().len(), 20);
    }

    #[test]
    fn test_five_wilds_on_line_one() {
        let table = table();
        let board = grid(
            &table,
            [
                ["TEN", "ACE", "TEN", "ACE", "TEN"],
                ["WILD", "WILD", "WILD", "WILD", "WILD"],
                ["ACE", "TEN", "ACE", "TEN", "ACE"],
            ],
        );
        let result = LinesEvaluator::new().evaluate(&board, &table, 1.0);
        let line_one = result.line_wins.iter().find(|w| w.line_index == 1).unwrap();
        assert_relative_eq!(line_one.win, 100.0);
        assert_eq!(line_one.kind, 5);
        assert_eq!(line_one.symbol_name, "WILD");
        assert_eq!(line_one.wild_positions.len(), 5);
    }

    #[test]
    fn test_wild_substitutes_and_best_reading() {
        let table = table();
        // WILD WILD WILD GOLD GOLD on the middle row: 5 GOLD (50) beats 3 WILD (15)
        let board = grid(
            &table,
            [
                ["TEN", "ACE", "ACE", "ACE", "TEN"],
                ["WILD", "WILD", "WILD", "GOLD", "GOLD"],
                ["ACE", "TEN", "TEN", "TEN", "ACE"],
            ],
        );
        let result = LinesEvaluator::new().evaluate(&board, &table, 1.0);
        let line_one = result.line_wins.iter().find(|w| w.line_index == 1).unwrap();
        assert_eq!(line_one.symbol_name, "GOLD");
        assert_eq!(line_one.kind, 5);
        assert_relative_eq!(line_one.win, 50.0);
    }

    #[test]
    fn test_wild_run_beats_cheap_symbol() {
        let table = table();
        // WILD WILD WILD TEN ACE: 3 WILD (15) beats 4 TEN (unpaid) / 3 TEN (0.5)
        let board = grid(
            &table,
            [
                ["ACE", "ACE", "TEN", "ACE", "TEN"],
                ["WILD", "WILD", "WILD", "TEN", "ACE"],
                ["TEN", "TEN", "ACE", "ACE", "ACE"],
            ],
        );
        let result = LinesEvaluator::new().evaluate(&board, &table, 1.0);
        let line_one = result.line_wins.iter().find(|w| w.line_index == 1).unwrap();
        assert_eq!(line_one.symbol_name, "WILD");
        assert_eq!(line_one.kind, 3);
    }

    #[test]
    fn test_scatter_breaks_lines() {
        let table = table();
        let board = grid(
            &table,
            [
                ["TEN", "ACE", "TEN", "ACE", "TEN"],
                ["WILD", "SCATTER", "GOLD", "GOLD", "GOLD"],
                ["ACE", "TEN", "ACE", "TEN", "ACE"],
            ],
        );
        let result = LinesEvaluator::new().evaluate(&board, &table, 1.0);
        assert!(result.line_wins.iter().all(|w| w.line_index != 1));
    }

    #[test]
    fn test_wild_multipliers_sum() {
        let table = table();
        let mut board = grid(
            &table,
            [
                ["TEN", "ACE", "TEN", "ACE", "TEN"],
                ["GOLD", "WILD", "WILD", "ACE", "ACE"],
                ["ACE", "TEN", "ACE", "TEN", "ACE"],
            ],
        );
        board.reels[1][1].multiplier = Some(2);
        board.reels[2][1].multiplier = Some(3);
        let result = LinesEvaluator::new().evaluate(&board, &table, 1.0);
        let line_one = result.line_wins.iter().find(|w| w.line_index == 1).unwrap();
        assert_relative_eq!(line_one.base_win, 8.0);
        assert_relative_eq!(line_one.win, 40.0);
    }

    #[test]
    fn test_malformed_entries_rejected() {
        let symbols = SymbolSet::new(&["GOLD", "SCATTER"], &[], &["SCATTER"]);
        let bad_kind = [PaytableEntry::new(2, "GOLD", 1.0)];
        assert!(PayTable::new(symbols.clone(), &bad_kind, vec![]).is_err());

        let negative = [PaytableEntry::new(3, "GOLD", -1.0)];
        assert!(PayTable::new(symbols.clone(), &negative, vec![]).is_err());

        let unknown = [PaytableEntry::new(3, "RUBY", 1.0)];
        assert!(PayTable::new(symbols.clone(), &unknown, vec![]).is_err());

        let scatter = [PaytableEntry::new(3, "SCATTER", 1.0)];
        assert!(PayTable::new(symbols, &scatter, vec![]).is_err());
    }

    #[test]
    fn test_payline_geometry_validation() {
        let table = table();
        assert!(table.validate_paylines(5, &[3; 5]).is_ok());
        assert!(table.validate_paylines(4, &[3; 4]).is_err());
        assert!(table.validate_paylines(5, &[2; 5]).is_err());
    }
}
