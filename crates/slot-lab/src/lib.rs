//! # slot-lab — Distribution-driven slot outcome simulation
//!
//! Resolves single simulations of a reel-based slot game and steers large
//! batches toward target statistics through quota-weighted distributions.
//!
//! ## Features
//!
//! - **Distributions**: per bet mode sub-populations with their own reel
//!   weights and forced outcomes (free game entry, win cap, exact win)
//! - **Spin State Machine**: base game, free spins with retriggers, win cap,
//!   bounded repeat-until-accepted loop
//! - **Deterministic**: every simulation index reproduces its draws
//! - **Line Evaluation**: left-to-right paylines with wild substitution
//! - **Config Loading**: JSON/YAML game documents, CSV reel strips
//!
//! ## Architecture
//!
//! ```text
//! GameConfig ──> BetMode ──> DistributionPlan (sim → Distribution)
//!     │                              │
//!     ├── PayTable / Paylines        v
//!     ├── ReelSets            GameState::run_spin
//!     │                         ├── BoardDrawer   (StripDrawer)
//!     │                         ├── BoardEvaluator (LinesEvaluator + Calculations)
//!     │                         └── WinManager
//!     │                              │
//!     v                              v
//! OptimizationParameters <── BatchStats <── SimulationRecord
//! ```

pub mod betmode;
pub mod book;
pub mod calculations;
pub mod config;
pub mod distribution;
pub mod draw;
pub mod error;
pub mod optimization;
pub mod parser;
pub mod paytable;
pub mod reels;
pub mod spin;
pub mod stats;
pub mod symbols;
pub mod win_manager;

#[cfg(test)]
pub(crate) mod testing;

pub use betmode::*;
pub use book::*;
pub use calculations::*;
pub use config::*;
pub use distribution::*;
pub use draw::*;
pub use error::*;
pub use optimization::*;
pub use parser::*;
pub use paytable::*;
pub use reels::*;
pub use spin::*;
pub use stats::*;
pub use symbols::*;
pub use win_manager::*;
