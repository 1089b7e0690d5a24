//! # slot-sim — Batch simulator for slot-lab bet modes
//!
//! Runs millions of independent simulations across a rayon pool and reports
//! aggregate statistics together with per-distribution completion counts, so
//! quota fulfilment problems show up next to the RTP they distort.
//!
//! ```rust,ignore
//! let game = GameConfig::load_golden_fortune(Path::new("crates/slot-lab/reels"))?;
//! let sim = BatchSimulator::new(BatchConfig::default());
//! let report = sim.run_bet_mode(&game, "base", 100_000)?;
//! println!("RTP {:.4}", report.rtp());
//! ```

pub mod batch;
pub mod error;

pub use batch::*;
pub use error::*;
