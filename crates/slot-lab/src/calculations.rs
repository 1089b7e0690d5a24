//! Game-specific calculation rules
//!
//! The evaluator asks these rules whether a wild may stand in for a symbol
//! and how wild multipliers combine, so a game can swap them without
//! touching the line scan.

use crate::symbols::{SymbolId, SymbolSet};

/// Calculation capability consumed by board evaluators
pub trait Calculations: Send + Sync {
    /// Can a wild substitute for `symbol`?
    fn can_substitute(&self, symbols: &SymbolSet, symbol: SymbolId) -> bool;

    /// Apply the multipliers collected on a winning line.
    ///
    /// Multipliers are summed and the sum is floored at 1, so an empty list
    /// (or a list summing to zero) leaves the win unchanged.
    fn apply_multiplier(&self, win_amount: f64, multipliers: &[u32]) -> f64 {
        if multipliers.is_empty() {
            return win_amount;
        }
        let total: u32 = multipliers.iter().sum();
        win_amount * total.max(1) as f64
    }
}

/// Default rules: wilds substitute for everything except scatters
#[derive(Debug, Clone, Copy, Default)]
pub struct GameCalculations;

impl Calculations for GameCalculations {
    fn can_substitute(&self, symbols: &SymbolSet, symbol: SymbolId) -> bool {
        !symbols.is_scatter(symbol)
    }
}
