//! Simulation records and their event books
//!
//! Each accepted simulation is imprinted as a [`SimulationRecord`]: the
//! finalized win, its game type split, the distribution it belonged to and
//! an ordered list of [`BookEvent`]s for presentation collaborators.

use serde::{Deserialize, Serialize};

use crate::config::GameType;
use crate::paytable::LineWin;

/// One step of a simulation, in the order it happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BookEvent {
    /// A board landed
    Reveal {
        gametype: GameType,
        reel_set: String,
        /// Symbol names, reel-major
        board: Vec<Vec<String>>,
        /// Per-reel anticipation order (0 = none)
        anticipation: Vec<u32>,
    },
    /// Line wins on the last board
    WinInfo { total_win: f64, wins: Vec<LineWin> },
    /// Running total after a board win
    SetWin { amount: f64 },
    /// Base game entered free games
    FreeSpinTrigger {
        total_fs: u32,
        positions: Vec<(u8, u8)>,
    },
    /// A free spin started
    UpdateFreeSpin { amount: u32, total: u32 },
    /// Extra spins awarded during free games
    FreeSpinRetrigger {
        total_fs: u32,
        positions: Vec<(u8, u8)>,
    },
    /// Free games finished
    FreeSpinEnd { amount: f64 },
    /// Running total reached the cap
    WinCap { amount: f64 },
    /// Finalized payout
    FinalWin { amount: f64 },
}

/// One imprinted simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    /// Simulation index
    pub id: u64,
    /// Criteria tag of the distribution that produced it
    pub criteria: String,
    /// Finalized win in base-bet multiples
    pub payout_multiplier: f64,
    pub basegame_win: f64,
    pub freegame_win: f64,
    /// Draw attempts used, including rejected ones
    pub attempts: u32,
    pub triggered_freegame: bool,
    pub wincap: bool,
    pub events: Vec<BookEvent>,
}

impl SimulationRecord {
    pub fn is_win(&self) -> bool {
        self.payout_multiplier > 0.0
    }

    /// Number of free spins played
    pub fn free_spins_played(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, BookEvent::UpdateFreeSpin { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = BookEvent::UpdateFreeSpin { amount: 3, total: 10 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "updateFreeSpin");
        assert_eq!(json["total"], 10);

        let reveal = BookEvent::Reveal {
            gametype: GameType::FreeGame,
            reel_set: "FREE".into(),
            board: vec![vec!["WILD".into()]],
            anticipation: vec![0],
        };
        let back: BookEvent = serde_json::from_str(&serde_json::to_string(&reveal).unwrap()).unwrap();
        assert_eq!(back, reveal);
    }
}
