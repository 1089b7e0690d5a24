//! Board drawing from reel strips

use std::collections::BTreeMap;

use rand::prelude::*;

use crate::error::DrawError;
use crate::reels::ReelSet;
use crate::symbols::{Board, Cell, SymbolSet};

/// Whole-board attempts before a forced or filtered draw gives up
pub const MAX_DRAW_ATTEMPTS: u32 = 10_000;

/// Pick a key from a weight table. Keys are walked in order so the same RNG
/// state always selects the same key.
pub fn pick_weighted<K: Clone + Ord>(
    rng: &mut dyn RngCore,
    table: &BTreeMap<K, u32>,
) -> Option<K> {
    let total: u64 = table.values().map(|&w| w as u64).sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.random_range(0..total);
    for (key, &weight) in table {
        if roll < weight as u64 {
            return Some(key.clone());
        }
        roll -= weight as u64;
    }
    None
}

/// Board-drawing capability
pub trait BoardDrawer: Send + Sync {
    /// Draw one board with a random stop on every reel
    fn draw(
        &self,
        rng: &mut dyn RngCore,
        reel_set: &ReelSet,
        num_rows: &[u8],
    ) -> Result<Board, DrawError>;

    /// Draw a board showing exactly `scatters` scatter symbols
    fn draw_with_scatters(
        &self,
        rng: &mut dyn RngCore,
        reel_set: &ReelSet,
        num_rows: &[u8],
        symbols: &SymbolSet,
        scatters: u8,
    ) -> Result<Board, DrawError>;
}

/// Draws the visible window below a uniformly random stop on each strip
#[derive(Debug, Clone, Copy, Default)]
pub struct StripDrawer;

impl StripDrawer {
    fn window(reel_set: &ReelSet, stops: Vec<usize>, num_rows: &[u8]) -> Board {
        let reels = reel_set
            .strips
            .iter()
            .zip(&stops)
            .enumerate()
            .map(|(reel, (strip, &stop))| {
                let rows = num_rows.get(reel).copied().unwrap_or(0) as usize;
                (0..rows).map(|row| Cell::new(strip.symbol_at(stop + row))).collect()
            })
            .collect();

        Board {
            reel_set: reel_set.name.clone(),
            anticipation: vec![0; stops.len()],
            stops,
            reels,
        }
    }

    fn check_strips(reel_set: &ReelSet) -> Result<(), DrawError> {
        match reel_set.strips.iter().position(|s| s.is_empty()) {
            Some(reel) => Err(DrawError::EmptyStrip {
                reel_set: reel_set.name.clone(),
                reel,
            }),
            None => Ok(()),
        }
    }
}

impl BoardDrawer for StripDrawer {
    fn draw(
        &self,
        rng: &mut dyn RngCore,
        reel_set: &ReelSet,
        num_rows: &[u8],
    ) -> Result<Board, DrawError> {
        Self::check_strips(reel_set)?;
        let stops = reel_set
            .strips
            .iter()
            .map(|strip| rng.random_range(0..strip.len()))
            .collect();
        Ok(Self::window(reel_set, stops, num_rows))
    }

    fn draw_with_scatters(
        &self,
        rng: &mut dyn RngCore,
        reel_set: &ReelSet,
        num_rows: &[u8],
        symbols: &SymbolSet,
        scatters: u8,
    ) -> Result<Board, DrawError> {
        Self::check_strips(reel_set)?;
        let unreachable = |attempts| DrawError::ForceUnreachable {
            reel_set: reel_set.name.clone(),
            wanted: scatters,
            attempts,
        };

        // Stops showing exactly one scatter, and stops showing none
        let (single, clean): (Vec<Vec<usize>>, Vec<Vec<usize>>) = reel_set
            .strips
            .iter()
            .enumerate()
            .map(|(reel, strip)| {
                let rows = num_rows.get(reel).copied().unwrap_or(0) as usize;
                let mut single = Vec::new();
                let mut clean = Vec::new();
                for stop in 0..strip.len() {
                    let shown = (0..rows)
                        .filter(|row| symbols.is_scatter(strip.symbol_at(stop + row)))
                        .count();
                    match shown {
                        0 => clean.push(stop),
                        1 => single.push(stop),
                        _ => {}
                    }
                }
                (single, clean)
            })
            .unzip();

        let mut eligible: Vec<usize> = (0..single.len())
            .filter(|&reel| !single[reel].is_empty())
            .collect();
        if eligible.len() < scatters as usize {
            return Err(unreachable(0));
        }

        for _ in 0..MAX_DRAW_ATTEMPTS {
            eligible.shuffle(&mut *rng);
            let forced = &eligible[..scatters as usize];

            let stops = reel_set
                .strips
                .iter()
                .enumerate()
                .map(|(reel, strip)| {
                    let pool = if forced.contains(&reel) {
                        &single[reel]
                    } else {
                        &clean[reel]
                    };
                    if pool.is_empty() {
                        rng.random_range(0..strip.len())
                    } else {
                        pool[rng.random_range(0..pool.len())]
                    }
                })
                .collect();

            // Only a reel with no scatter-free stop can spoil the count
            let board = Self::window(reel_set, stops, num_rows);
            if board.count_scatters(symbols) == scatters {
                return Ok(board);
            }
        }

        Err(unreachable(MAX_DRAW_ATTEMPTS))
    }
}

/// Mark anticipation on every reel that stops after `threshold` scatters have
/// already landed. Values count up from 1 in stopping order; 0 means none.
pub fn apply_anticipation(board: &mut Board, symbols: &SymbolSet, threshold: u8) {
    let mut landed = 0u32;
    let mut order = 0u32;
    for (reel, column) in board.reels.iter().enumerate() {
        board.anticipation[reel] = if threshold > 0 && landed >= threshold as u32 {
            order += 1;
            order
        } else {
            0
        };
        landed += column.iter().filter(|c| symbols.is_scatter(c.symbol)).count() as u32;
    }
}

/// Attach multipliers to every wild on the board
pub fn assign_wild_multipliers(
    rng: &mut dyn RngCore,
    board: &mut Board,
    symbols: &SymbolSet,
    table: &BTreeMap<u32, u32>,
) {
    if table.is_empty() {
        return;
    }
    for column in &mut board.reels {
        for cell in column.iter_mut().filter(|c| symbols.is_wild(c.symbol)) {
            cell.multiplier = pick_weighted(rng, table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    fn symbols() -> SymbolSet {
        SymbolSet::new(&["WILD", "GOLD", "TEN", "SCATTER"], &["WILD"], &["SCATTER"])
    }

    fn reel_set(set: &SymbolSet) -> ReelSet {
        let reel = vec!["GOLD", "TEN", "SCATTER", "GOLD", "TEN", "WILD", "TEN", "GOLD"];
        ReelSet::from_names("BASE", &vec![reel; 5], set).unwrap()
    }

    #[test]
    fn test_pick_weighted_respects_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let table = BTreeMap::from([("A", 0u32), ("B", 3), ("C", 0)]);
        for _ in 0..100 {
            assert_eq!(pick_weighted(&mut rng, &table), Some("B"));
        }
        let empty: BTreeMap<&str, u32> = BTreeMap::new();
        assert_eq!(pick_weighted(&mut rng, &empty), None);
    }

    #[test]
    fn test_pick_weighted_frequencies() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let table = BTreeMap::from([(3u8, 50u32), (4, 30), (5, 20)]);
        let mut counts = BTreeMap::new();
        for _ in 0..10_000 {
            *counts.entry(pick_weighted(&mut rng, &table).unwrap()).or_insert(0u32) += 1;
        }
        assert!((4500..5500).contains(&counts[&3]));
        assert!((2500..3500).contains(&counts[&4]));
    }

    #[test]
    fn test_draw_is_deterministic() {
        let set = symbols();
        let reels = reel_set(&set);
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        let board_a = StripDrawer.draw(&mut a, &reels, &[3; 5]).unwrap();
        let board_b = StripDrawer.draw(&mut b, &reels, &[3; 5]).unwrap();
        assert_eq!(board_a, board_b);
        assert_eq!(board_a.reels.len(), 5);
        assert!(board_a.reels.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn test_forced_scatter_count() {
        let set = symbols();
        let reels = reel_set(&set);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for wanted in 3..=5 {
            let board = StripDrawer
                .draw_with_scatters(&mut rng, &reels, &[3; 5], &set, wanted)
                .unwrap();
            assert_eq!(board.count_scatters(&set), wanted);
        }
    }

    #[test]
    fn test_forced_scatters_one_per_forced_reel() {
        let set = symbols();
        let reels = reel_set(&set);
        let scatter = set.id_of("SCATTER").unwrap();
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let board = StripDrawer
                .draw_with_scatters(&mut rng, &reels, &[3; 5], &set, 3)
                .unwrap();
            let per_reel: Vec<usize> = board
                .reels
                .iter()
                .map(|column| column.iter().filter(|c| c.symbol == scatter).count())
                .collect();
            assert_eq!(per_reel.iter().filter(|&&n| n == 1).count(), 3);
            assert_eq!(per_reel.iter().filter(|&&n| n == 0).count(), 2);
        }
    }

    #[test]
    fn test_forced_scatter_unreachable() {
        let set = symbols();
        let reels = ReelSet::from_names("NOSCAT", &vec![vec!["GOLD", "TEN"]; 5], &set).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let err = StripDrawer
            .draw_with_scatters(&mut rng, &reels, &[3; 5], &set, 3)
            .unwrap_err();
        assert!(matches!(err, DrawError::ForceUnreachable { wanted: 3, .. }));
    }

    #[test]
    fn test_anticipation_after_two_scatters() {
        let set = symbols();
        let s = set.id_of("SCATTER").unwrap();
        let g = set.id_of("GOLD").unwrap();
        let mut board = Board::from_symbols(
            "BASE",
            vec![vec![s, g, g], vec![g, s, g], vec![g, g, g], vec![g, g, g], vec![g, g, g]],
        );
        apply_anticipation(&mut board, &set, 2);
        assert_eq!(board.anticipation, vec![0, 0, 1, 2, 3]);

        let mut quiet = Board::from_symbols("BASE", vec![vec![s, g, g]; 1]);
        apply_anticipation(&mut quiet, &set, 2);
        assert_eq!(quiet.anticipation, vec![0]);
    }

    #[test]
    fn test_wild_multipliers_only_on_wilds() {
        let set = symbols();
        let w = set.id_of("WILD").unwrap();
        let g = set.id_of("GOLD").unwrap();
        let mut board = Board::from_symbols("FREE", vec![vec![w, g, g]; 5]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assign_wild_multipliers(&mut rng, &mut board, &set, &BTreeMap::from([(2, 1), (3, 1)]));
        for column in &board.reels {
            assert!(matches!(column[0].multiplier, Some(2) | Some(3)));
            assert_eq!(column[1].multiplier, None);
        }
    }
}
