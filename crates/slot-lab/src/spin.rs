//! Spin state machine
//!
//! Runs one simulation end to end:
//!
//! ```text
//! Init ─> DrawBoard ─> EvaluateWins ─> CheckFreeSpinTrigger ─┬─> FinalizeWin ─> CheckRepeat ─> Imprint
//!            ^                                               │                      │
//!            │                                  FreeSpinLoop ┘                      │
//!            └──────────────────────────── repeat (same distribution) ──────────────┘
//! ```
//!
//! The distribution is fixed before the first board is drawn. It only
//! steers which reel sets are used and whether the base board is forced to
//! trigger; outcomes it does not accept are redrawn, never edited.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::betmode::BetMode;
use crate::book::{BookEvent, SimulationRecord};
use crate::config::{GameConfig, GameType};
use crate::distribution::Distribution;
use crate::draw::{
    BoardDrawer, MAX_DRAW_ATTEMPTS, StripDrawer, apply_anticipation, assign_wild_multipliers,
    pick_weighted,
};
use crate::error::{DrawError, SpinError};
use crate::paytable::{BoardEvaluator, LinesEvaluator};
use crate::reels::ReelSet;
use crate::symbols::Board;
use crate::win_manager::{FinalWin, WinManager};

/// Wins are evaluated in multiples of this stake
pub const BASE_BET: f64 = 1.0;

/// Default bound on draw attempts per simulation
pub const DEFAULT_MAX_REPEATS: u32 = 10_000;

static DEFAULT_EVALUATOR: LinesEvaluator = LinesEvaluator::new();
static DEFAULT_DRAWER: StripDrawer = StripDrawer;

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS & COUNTERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-run knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinOptions {
    /// Added to the simulation index to form the RNG seed
    pub seed_offset: u64,
    /// Attempts before a distribution is reported as not converging
    pub max_repeats: u32,
}

impl Default for SpinOptions {
    fn default() -> Self {
        Self {
            seed_offset: 0,
            max_repeats: DEFAULT_MAX_REPEATS,
        }
    }
}

/// Free spin progress. `fs` never passes `tot_fs` and `tot_fs` never shrinks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreeSpinCounter {
    fs: u32,
    tot_fs: u32,
}

impl FreeSpinCounter {
    pub fn start(total: u32) -> Self {
        Self { fs: 0, tot_fs: total }
    }

    /// Begin the next spin; false once every awarded spin has been played
    pub fn advance(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        self.fs += 1;
        true
    }

    /// Extend the session without touching spins already played
    pub fn retrigger(&mut self, extra: u32) {
        self.tot_fs = self.tot_fs.saturating_add(extra);
    }

    pub fn is_complete(&self) -> bool {
        self.fs >= self.tot_fs
    }

    pub fn fs(&self) -> u32 {
        self.fs
    }

    pub fn tot_fs(&self) -> u32 {
        self.tot_fs
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GAME STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Executes simulations for one bet mode.
///
/// Holds the shared configuration by reference and owns everything that
/// changes during a simulation, so one instance per worker is enough.
pub struct GameState<'a> {
    config: &'a GameConfig,
    bet_mode: &'a BetMode,
    evaluator: &'a dyn BoardEvaluator,
    drawer: &'a dyn BoardDrawer,
    options: SpinOptions,
    rng: ChaCha8Rng,
    win_manager: WinManager,
    gametype: GameType,
    repeat: bool,
    fs: FreeSpinCounter,
    fs_retrigger_amt: u32,
    triggered_freegame: bool,
    wincap_triggered: bool,
    book: Vec<BookEvent>,
}

impl<'a> GameState<'a> {
    /// Line evaluation and reel-strip drawing
    pub fn new(config: &'a GameConfig, bet_mode: &'a BetMode) -> Self {
        Self::with_components(config, bet_mode, &DEFAULT_EVALUATOR, &DEFAULT_DRAWER)
    }

    pub fn with_components(
        config: &'a GameConfig,
        bet_mode: &'a BetMode,
        evaluator: &'a dyn BoardEvaluator,
        drawer: &'a dyn BoardDrawer,
    ) -> Self {
        Self {
            config,
            bet_mode,
            evaluator,
            drawer,
            options: SpinOptions::default(),
            rng: ChaCha8Rng::seed_from_u64(0),
            win_manager: WinManager::new(),
            gametype: GameType::BaseGame,
            repeat: false,
            fs: FreeSpinCounter::default(),
            fs_retrigger_amt: 0,
            triggered_freegame: false,
            wincap_triggered: false,
            book: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: SpinOptions) -> Self {
        self.options = options;
        self
    }

    pub fn bet_mode(&self) -> &BetMode {
        self.bet_mode
    }

    pub fn win_manager(&self) -> &WinManager {
        &self.win_manager
    }

    pub fn free_spins(&self) -> FreeSpinCounter {
        self.fs
    }

    /// Run simulation `sim` under `distribution` until it produces an
    /// accepted outcome or `max_repeats` attempts are spent.
    pub fn run_spin(
        &mut self,
        sim: u64,
        distribution: &Distribution,
    ) -> Result<SimulationRecord, SpinError> {
        self.reset_seed(sim);
        self.repeat = true;
        let mut attempts = 0;

        while self.repeat {
            if attempts >= self.options.max_repeats {
                log::warn!(
                    "Simulation {} ({}): '{}' not satisfied after {} attempts",
                    sim,
                    self.bet_mode.name,
                    distribution.criteria,
                    attempts
                );
                return Err(SpinError::Convergence {
                    criteria: distribution.criteria.clone(),
                    attempts,
                });
            }
            attempts += 1;

            self.reset_book();
            let board = self.draw_board(distribution)?;
            self.evaluate_board(&board);
            self.win_manager.update_gametype_wins(self.gametype);

            if !self.evaluate_wincap() {
                if let Some(award) = self.check_fs_condition(&board) {
                    self.run_freespin_from_base(distribution, &board, award)?;
                }
            }

            let final_win = self.evaluate_finalwin();
            self.check_repeat(distribution, &final_win);
        }

        Ok(self.imprint(sim, distribution, attempts))
    }

    fn reset_seed(&mut self, sim: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(self.options.seed_offset.wrapping_add(sim));
    }

    fn reset_book(&mut self) {
        self.win_manager.reset();
        self.book.clear();
        self.gametype = GameType::BaseGame;
        self.fs = FreeSpinCounter::default();
        self.fs_retrigger_amt = 0;
        self.triggered_freegame = false;
        self.wincap_triggered = false;
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Drawing
    // ───────────────────────────────────────────────────────────────────────────

    fn draw_board(&mut self, distribution: &Distribution) -> Result<Board, DrawError> {
        let config = self.config;
        let empty = |what: &str| {
            DrawError::EmptyWeights(format!("{} {} ({})", distribution.criteria, what, self.gametype))
        };

        let reel_weights = distribution
            .reel_weights_for(self.gametype)
            .ok_or_else(|| empty("reel weights"))?;
        let name = pick_weighted(&mut self.rng, reel_weights).ok_or_else(|| empty("reel weights"))?;
        let reel_set = config.reel_set(&name)?;

        let mut board = match self.gametype {
            GameType::BaseGame if distribution.conditions.force_freegame => {
                let scatters = pick_weighted(&mut self.rng, &distribution.conditions.scatter_triggers)
                    .ok_or_else(|| empty("scatter triggers"))?;
                self.drawer.draw_with_scatters(
                    &mut self.rng,
                    reel_set,
                    &config.num_rows,
                    config.symbols(),
                    scatters,
                )?
            }
            GameType::BaseGame => self.draw_below_trigger(reel_set)?,
            GameType::FreeGame => self.drawer.draw(&mut self.rng, reel_set, &config.num_rows)?,
        };

        if let Some(table) = config.wild_multipliers.get(&self.gametype) {
            assign_wild_multipliers(&mut self.rng, &mut board, config.symbols(), table);
        }
        apply_anticipation(
            &mut board,
            config.symbols(),
            config.anticipation_threshold(self.gametype),
        );

        self.book.push(BookEvent::Reveal {
            gametype: self.gametype,
            reel_set: board.reel_set.clone(),
            board: board
                .symbol_grid()
                .iter()
                .map(|reel| reel.iter().map(|&s| config.symbols().name_of(s).to_string()).collect())
                .collect(),
            anticipation: board.anticipation.clone(),
        });
        Ok(board)
    }

    /// Unforced base boards stay below the freegame trigger
    fn draw_below_trigger(&mut self, reel_set: &ReelSet) -> Result<Board, DrawError> {
        let config = self.config;
        let Some(trigger) = config.min_freespin_trigger(GameType::BaseGame) else {
            return self.drawer.draw(&mut self.rng, reel_set, &config.num_rows);
        };
        for _ in 0..MAX_DRAW_ATTEMPTS {
            let board = self.drawer.draw(&mut self.rng, reel_set, &config.num_rows)?;
            if board.count_scatters(config.symbols()) < trigger {
                return Ok(board);
            }
        }
        Err(DrawError::TriggerUnavoidable {
            reel_set: reel_set.name.clone(),
            attempts: MAX_DRAW_ATTEMPTS,
        })
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Wins
    // ───────────────────────────────────────────────────────────────────────────

    fn evaluate_board(&mut self, board: &Board) {
        let win_data = self.evaluator.evaluate(board, &self.config.paytable, BASE_BET);
        if win_data.is_win() {
            self.win_manager.update_wins(win_data.total_win);
            self.book.push(BookEvent::WinInfo {
                total_win: win_data.total_win,
                wins: win_data.line_wins,
            });
            self.book.push(BookEvent::SetWin {
                amount: self.win_manager.total_win(),
            });
        }
    }

    /// True once the running total has reached the bet mode's cap
    fn evaluate_wincap(&mut self) -> bool {
        if !self.wincap_triggered && self.win_manager.reached_cap(self.bet_mode.max_win) {
            self.wincap_triggered = true;
            self.book.push(BookEvent::WinCap {
                amount: self.bet_mode.max_win,
            });
        }
        self.wincap_triggered
    }

    fn evaluate_finalwin(&mut self) -> FinalWin {
        let final_win = self.win_manager.finalize(self.bet_mode.max_win);
        self.book.push(BookEvent::FinalWin {
            amount: final_win.payout,
        });
        final_win
    }

    fn check_repeat(&mut self, distribution: &Distribution, final_win: &FinalWin) {
        self.repeat =
            !distribution.accepts(final_win.payout, self.triggered_freegame, final_win.capped);
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Free spins
    // ───────────────────────────────────────────────────────────────────────────

    /// Spins awarded by the scatters on `board`, if any
    fn check_fs_condition(&self, board: &Board) -> Option<u32> {
        let scatters = board.count_scatters(self.config.symbols());
        self.config.freespin_award(self.gametype, scatters)
    }

    fn run_freespin_from_base(
        &mut self,
        distribution: &Distribution,
        board: &Board,
        award: u32,
    ) -> Result<(), DrawError> {
        self.triggered_freegame = true;
        self.fs = FreeSpinCounter::start(award);
        self.book.push(BookEvent::FreeSpinTrigger {
            total_fs: award,
            positions: self.scatter_positions(board),
        });
        self.run_freespin(distribution)
    }

    fn run_freespin(&mut self, distribution: &Distribution) -> Result<(), DrawError> {
        self.gametype = GameType::FreeGame;

        while self.fs.advance() {
            self.book.push(BookEvent::UpdateFreeSpin {
                amount: self.fs.fs(),
                total: self.fs.tot_fs(),
            });

            let board = self.draw_board(distribution)?;
            self.evaluate_board(&board);
            if let Some(extra) = self.check_fs_condition(&board) {
                self.update_fs_retrigger_amt(extra, &board);
            }
            self.win_manager.update_gametype_wins(GameType::FreeGame);

            if self.evaluate_wincap() {
                break;
            }
        }

        self.book.push(BookEvent::FreeSpinEnd {
            amount: self.win_manager.gametype_win(GameType::FreeGame),
        });
        self.gametype = GameType::BaseGame;
        Ok(())
    }

    fn update_fs_retrigger_amt(&mut self, extra: u32, board: &Board) {
        self.fs_retrigger_amt += extra;
        self.fs.retrigger(self.fs_retrigger_amt);
        self.fs_retrigger_amt = 0;
        self.book.push(BookEvent::FreeSpinRetrigger {
            total_fs: self.fs.tot_fs(),
            positions: self.scatter_positions(board),
        });
    }

    fn scatter_positions(&self, board: &Board) -> Vec<(u8, u8)> {
        let symbols = self.config.symbols();
        board.positions_where(|s| symbols.is_scatter(s))
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Output
    // ───────────────────────────────────────────────────────────────────────────

    fn imprint(&mut self, sim: u64, distribution: &Distribution, attempts: u32) -> SimulationRecord {
        let final_win = self.win_manager.finalize(self.bet_mode.max_win);
        SimulationRecord {
            id: sim,
            criteria: distribution.criteria.clone(),
            payout_multiplier: final_win.payout,
            basegame_win: final_win.basegame_win,
            freegame_win: final_win.freegame_win,
            attempts,
            triggered_freegame: self.triggered_freegame,
            wincap: final_win.capped,
            events: std::mem::take(&mut self.book),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;

    use super::*;
    use crate::testing::{self, ScriptedDrawer};

    fn distribution<'c>(config: &'c GameConfig, mode: &str, criteria: &str) -> &'c Distribution {
        config.bet_mode(mode).unwrap().distribution(criteria).unwrap()
    }

    #[test]
    fn test_free_spin_counter() {
        let mut counter = FreeSpinCounter::start(10);
        for _ in 0..7 {
            assert!(counter.advance());
        }
        assert_eq!(counter.fs(), 7);
        counter.retrigger(5);
        assert_eq!(counter.tot_fs(), 15);

        let mut played = 7;
        while counter.advance() {
            played += 1;
            assert!(counter.fs() <= counter.tot_fs());
        }
        assert_eq!(played, 15);
        assert!(!counter.advance());
    }

    #[test]
    fn test_same_index_same_outcome() {
        let config = testing::golden_fortune();
        let mode = config.bet_mode("base").unwrap();
        let dist = distribution(&config, "base", "freegame");

        let mut a = GameState::new(&config, mode);
        let mut b = GameState::new(&config, mode);
        let first = a.run_spin(42, dist).unwrap();
        assert_eq!(first, b.run_spin(42, dist).unwrap());
        // Reused state, same index
        assert_eq!(first, a.run_spin(42, dist).unwrap());
    }

    #[test]
    fn test_seed_offset_changes_outcome() {
        let config = testing::golden_fortune();
        let mode = config.bet_mode("base").unwrap();
        let dist = distribution(&config, "base", "basegame");

        let mut plain = GameState::new(&config, mode);
        let mut shifted = GameState::new(&config, mode).with_options(SpinOptions {
            seed_offset: 1,
            ..SpinOptions::default()
        });
        // Offset 1 at index 6 replays index 7 without offset
        assert_eq!(plain.run_spin(7, dist).unwrap().events, shifted.run_spin(6, dist).unwrap().events);
    }

    #[test]
    fn test_zero_criteria_is_exactly_zero() {
        let config = testing::golden_fortune();
        let mode = config.bet_mode("base").unwrap();
        let dist = distribution(&config, "base", "0");

        let mut state = GameState::new(&config, mode);
        for sim in 0..25 {
            let record = state.run_spin(sim, dist).unwrap();
            assert_eq!(record.payout_multiplier, 0.0);
            assert!(!record.triggered_freegame);
            assert_eq!(record.criteria, "0");
        }
    }

    #[test]
    fn test_wincap_criteria_is_exactly_the_cap() {
        let config = testing::golden_fortune();
        let mode = config.bet_mode("base").unwrap();
        let dist = distribution(&config, "base", "wincap");

        let mut state = GameState::new(&config, mode);
        for sim in 0..5 {
            let record = state.run_spin(sim, dist).unwrap();
            assert_eq!(record.payout_multiplier, mode.max_win);
            assert!(record.wincap);
            assert!(record.triggered_freegame);
            assert!(record.events.iter().any(|e| matches!(e, BookEvent::WinCap { .. })));
            // Game type shares are clamped along with the payout
            assert!(record.freegame_win <= mode.max_win);
            assert_relative_eq!(
                record.basegame_win + record.freegame_win,
                record.payout_multiplier,
                epsilon = 1e-9
            );
            // Wincap ends the free spins early
            let last_update = record
                .events
                .iter()
                .filter_map(|e| match e {
                    BookEvent::UpdateFreeSpin { amount, total } => Some((*amount, *total)),
                    _ => None,
                })
                .last()
                .unwrap();
            assert!(last_update.0 < last_update.1);
        }
    }

    #[test]
    fn test_force_freegame_always_enters_free_games() {
        let config = testing::golden_fortune();
        let mode = config.bet_mode("base").unwrap();
        let dist = distribution(&config, "base", "freegame");
        assert_eq!(dist.conditions.scatter_triggers, BTreeMap::from([(3, 50), (4, 30), (5, 10)]));

        let mut state = GameState::new(&config, mode);
        for sim in 0..25 {
            let record = state.run_spin(sim, dist).unwrap();
            assert!(record.triggered_freegame);
            assert!(record.free_spins_played() >= 10);
            assert!(!record.wincap);
        }
    }

    #[test]
    fn test_unforced_basegame_never_triggers() {
        let config = testing::golden_fortune();
        let mode = config.bet_mode("base").unwrap();
        let dist = distribution(&config, "base", "basegame");

        let mut state = GameState::new(&config, mode);
        for sim in 0..50 {
            let record = state.run_spin(sim, dist).unwrap();
            assert!(!record.triggered_freegame);
            assert_eq!(record.freegame_win, 0.0);
            assert_eq!(record.basegame_win, record.payout_multiplier);
        }
    }

    #[test]
    fn test_retrigger_extends_free_spins() {
        let mut config = testing::golden_fortune();
        config
            .freespin_triggers
            .insert(GameType::FreeGame, BTreeMap::from([(3, 5)]));
        let symbols = config.symbols().clone();

        // Base trigger (10 spins), six blank spins, a retrigger on spin 7
        let mut script = vec![testing::three_scatters(&symbols)];
        script.extend((0..6).map(|_| testing::blank(&symbols)));
        script.push(testing::three_scatters(&symbols));
        let drawer = ScriptedDrawer::new(&symbols, script);

        let mode = config.bet_mode("base").unwrap();
        let dist = distribution(&config, "base", "freegame");
        let mut state = GameState::with_components(&config, mode, &DEFAULT_EVALUATOR, &drawer);
        let record = state.run_spin(0, dist).unwrap();

        assert_eq!(record.free_spins_played(), 15);
        assert!(record.events.contains(&BookEvent::FreeSpinRetrigger {
            total_fs: 15,
            positions: vec![(0, 0), (2, 0), (4, 0)],
        }));
        let totals: Vec<u32> = record
            .events
            .iter()
            .filter_map(|e| match e {
                BookEvent::UpdateFreeSpin { total, .. } => Some(*total),
                _ => None,
            })
            .collect();
        assert!(totals.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(totals[6], 10);
        assert_eq!(totals[7], 15);
        assert_eq!(state.free_spins().fs(), 15);
    }

    #[test]
    fn test_anticipation_on_trigger_board() {
        let config = testing::golden_fortune();
        let symbols = config.symbols().clone();
        let drawer = ScriptedDrawer::new(&symbols, vec![testing::three_scatters(&symbols)]);

        let mode = config.bet_mode("base").unwrap();
        let dist = distribution(&config, "base", "freegame");
        let mut state = GameState::with_components(&config, mode, &DEFAULT_EVALUATOR, &drawer);
        let record = state.run_spin(0, dist).unwrap();

        match &record.events[0] {
            BookEvent::Reveal {
                gametype,
                anticipation,
                ..
            } => {
                assert_eq!(*gametype, GameType::BaseGame);
                assert_eq!(anticipation, &vec![0, 0, 0, 1, 2]);
            }
            other => panic!("expected reveal, got {:?}", other),
        }
    }

    #[test]
    fn test_five_wilds_pay_line_one() {
        let config = testing::golden_fortune();
        let symbols = config.symbols().clone();
        let wilds = testing::board(
            &symbols,
            [
                ["TEN", "ACE", "TEN", "ACE", "TEN"],
                ["WILD", "WILD", "WILD", "WILD", "WILD"],
                ["TEN", "ACE", "TEN", "ACE", "TEN"],
            ],
        );
        let drawer = ScriptedDrawer::new(&symbols, vec![wilds]);

        let mode = config.bet_mode("base").unwrap();
        let dist = distribution(&config, "base", "basegame");
        let mut state = GameState::with_components(&config, mode, &DEFAULT_EVALUATOR, &drawer);
        let record = state.run_spin(0, dist).unwrap();

        let line_one = record
            .events
            .iter()
            .find_map(|e| match e {
                BookEvent::WinInfo { wins, .. } => wins.iter().find(|w| w.line_index == 1).cloned(),
                _ => None,
            })
            .unwrap();
        assert_eq!(line_one.win, 100.0 * mode.cost);
        assert_eq!(line_one.kind, 5);
        assert!(record.payout_multiplier >= 100.0);
        assert_eq!(record.freegame_win, 0.0);
        assert!(state.win_manager().is_finalized());
    }

    #[test]
    fn test_convergence_failure_is_reported() {
        let config = testing::golden_fortune();
        let mode = config.bet_mode("base").unwrap();
        // An all-wild board always pays, so a tiny exact target is unreachable
        let dist = Distribution::new("unreachable", 1.0)
            .with_reel_weights(GameType::BaseGame, [("FREECAP", 1)])
            .with_win_criteria(0.5);

        let mut state = GameState::new(&config, mode).with_options(SpinOptions {
            max_repeats: 5,
            ..SpinOptions::default()
        });
        let err = state.run_spin(3, &dist).unwrap_err();
        assert_eq!(
            err,
            SpinError::Convergence {
                criteria: "unreachable".into(),
                attempts: 5,
            }
        );
    }

    #[test]
    fn test_unknown_reel_set_fails_the_simulation_only() {
        let config = testing::golden_fortune();
        let mode = config.bet_mode("base").unwrap();
        let dist = Distribution::new("broken", 1.0).with_reel_weights(GameType::BaseGame, [("NOPE", 1)]);

        let mut state = GameState::new(&config, mode);
        assert!(matches!(
            state.run_spin(0, &dist),
            Err(SpinError::Draw(DrawError::UnknownReelSet(_)))
        ));
        // The same state keeps working afterwards
        assert!(state.run_spin(0, distribution(&config, "base", "basegame")).is_ok());
    }
}
