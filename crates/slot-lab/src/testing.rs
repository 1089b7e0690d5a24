//! Shared fixtures for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::RngCore;

use crate::config::GameConfig;
use crate::draw::BoardDrawer;
use crate::error::DrawError;
use crate::reels::ReelSet;
use crate::symbols::{Board, SymbolSet};

/// BASE/FREE share one mixed strip; FREECAP is wilds only
pub fn reel_sets() -> Vec<ReelSet> {
    let symbols = GameConfig::golden_fortune_symbols();
    let strip = vec!["GOLD", "TEN", "SCATTER", "ACE", "KING", "WILD", "QUEEN", "JACK"];
    let mut sets: Vec<ReelSet> = ["BASE", "FREE"]
        .iter()
        .map(|name| ReelSet::from_names(*name, &vec![strip.clone(); 5], &symbols).unwrap())
        .collect();
    sets.push(ReelSet::from_names("FREECAP", &vec![vec!["WILD"]; 5], &symbols).unwrap());
    sets
}

pub fn golden_fortune() -> GameConfig {
    GameConfig::golden_fortune(reel_sets()).unwrap()
}

/// Board from rows of names (`rows[row][reel]`)
pub fn board(symbols: &SymbolSet, rows: [[&str; 5]; 3]) -> Board {
    let columns = (0..5)
        .map(|reel| {
            (0..3)
                .map(|row| symbols.id_of(rows[row][reel]).unwrap())
                .collect()
        })
        .collect();
    Board::from_symbols("SCRIPTED", columns)
}

/// A board that pays nothing and shows no scatter
pub fn blank(symbols: &SymbolSet) -> Board {
    board(
        symbols,
        [
            ["TEN", "ACE", "TEN", "ACE", "TEN"],
            ["TEN", "ACE", "TEN", "ACE", "TEN"],
            ["TEN", "ACE", "TEN", "ACE", "TEN"],
        ],
    )
}

/// A non-paying board with scatters on reels 0, 2 and 4
pub fn three_scatters(symbols: &SymbolSet) -> Board {
    board(
        symbols,
        [
            ["SCATTER", "ACE", "SCATTER", "ACE", "SCATTER"],
            ["TEN", "ACE", "TEN", "ACE", "TEN"],
            ["TEN", "ACE", "TEN", "ACE", "TEN"],
        ],
    )
}

/// Hands out prepared boards in order, then blanks
pub struct ScriptedDrawer {
    boards: Mutex<VecDeque<Board>>,
    fallback: Board,
}

impl ScriptedDrawer {
    pub fn new(symbols: &SymbolSet, boards: Vec<Board>) -> Self {
        Self {
            boards: Mutex::new(boards.into()),
            fallback: blank(symbols),
        }
    }

    fn next(&self) -> Board {
        self.boards
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl BoardDrawer for ScriptedDrawer {
    fn draw(&self, _: &mut dyn RngCore, _: &ReelSet, _: &[u8]) -> Result<Board, DrawError> {
        Ok(self.next())
    }

    fn draw_with_scatters(
        &self,
        _: &mut dyn RngCore,
        _: &ReelSet,
        _: &[u8],
        _: &SymbolSet,
        _: u8,
    ) -> Result<Board, DrawError> {
        Ok(self.next())
    }
}
