//! Parallel batch runner
//!
//! A batch of N simulations is split into chunks of `batch_size` indices.
//! Chunks run on a rayon pool, each with its own [`GameState`] and
//! accumulators, and are merged once every chunk is done. Simulation `i`
//! always runs under the distribution the plan assigned to it and with seed
//! `seed_offset + i`, so results do not depend on the thread count.

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use slot_lab::{
    BatchStats, BetMode, DEFAULT_MAX_REPEATS, DistributionPlan, GameConfig, GameState,
    SimulationRecord, SpinError, SpinOptions,
};

use crate::error::{SimError, SimResult};

/// Batch runner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker threads
    pub threads: usize,
    /// Simulations per chunk
    pub batch_size: u64,
    /// Attempts per simulation before it is reported as failed
    pub max_repeats: u32,
    /// Base seed for simulations and the distribution plan
    pub seed_offset: u64,
    /// Keep every record in the report (books)
    pub keep_records: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            batch_size: 50_000,
            max_repeats: DEFAULT_MAX_REPEATS,
            seed_offset: 0,
            keep_records: false,
        }
    }
}

/// Per-distribution bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionOutcome {
    pub criteria: String,
    pub quota: f64,
    /// Simulations the plan assigned
    pub assigned: u64,
    pub completed: u64,
    /// Aborted (no convergence or draw failure)
    pub failed: u64,
    /// Not run because the batch was cancelled
    pub skipped: u64,
    pub stats: BatchStats,
}

impl DistributionOutcome {
    fn new(criteria: &str, quota: f64) -> Self {
        Self {
            criteria: criteria.to_string(),
            quota,
            assigned: 0,
            completed: 0,
            failed: 0,
            skipped: 0,
            stats: BatchStats::new(),
        }
    }

    fn merge(&mut self, other: &DistributionOutcome) {
        self.assigned += other.assigned;
        self.completed += other.completed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.stats.merge(&other.stats);
    }
}

/// One aborted simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimFailure {
    pub sim: u64,
    pub criteria: String,
    pub error: SpinError,
}

/// Result of one bet mode batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub bet_mode: String,
    pub cost: f64,
    pub num_sims: u64,
    pub stats: BatchStats,
    /// In bet mode order
    pub distributions: Vec<DistributionOutcome>,
    /// Sorted by simulation index
    pub failures: Vec<SimFailure>,
    /// Sorted by simulation index; empty unless `keep_records` is set
    pub records: Vec<SimulationRecord>,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn rtp(&self) -> f64 {
        self.stats.rtp(self.cost)
    }

    pub fn completed(&self) -> u64 {
        self.distributions.iter().map(|d| d.completed).sum()
    }

    pub fn failed(&self) -> u64 {
        self.distributions.iter().map(|d| d.failed).sum()
    }

    pub fn skipped(&self) -> u64 {
        self.distributions.iter().map(|d| d.skipped).sum()
    }

    pub fn distribution(&self, criteria: &str) -> Option<&DistributionOutcome> {
        self.distributions.iter().find(|d| d.criteria == criteria)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct Summary<'r> {
            bet_mode: &'r str,
            num_sims: u64,
            rtp: f64,
            hit_rate: f64,
            completed: u64,
            failed: u64,
            skipped: u64,
            distributions: &'r [DistributionOutcome],
        }

        serde_json::to_string_pretty(&Summary {
            bet_mode: &self.bet_mode,
            num_sims: self.num_sims,
            rtp: self.rtp(),
            hit_rate: self.stats.hit_rate(),
            completed: self.completed(),
            failed: self.failed(),
            skipped: self.skipped(),
            distributions: &self.distributions,
        })
    }
}

/// Accumulators for one chunk
struct ChunkResult {
    stats: BatchStats,
    distributions: Vec<DistributionOutcome>,
    failures: Vec<SimFailure>,
    records: Vec<SimulationRecord>,
}

impl ChunkResult {
    fn new(mode: &BetMode) -> Self {
        Self {
            stats: BatchStats::new(),
            distributions: mode
                .distributions
                .iter()
                .map(|d| DistributionOutcome::new(&d.criteria, d.quota))
                .collect(),
            failures: Vec::new(),
            records: Vec::new(),
        }
    }

    fn merge(mut self, other: ChunkResult) -> Self {
        self.stats.merge(&other.stats);
        for (mine, theirs) in self.distributions.iter_mut().zip(&other.distributions) {
            mine.merge(theirs);
        }
        self.failures.extend(other.failures);
        self.records.extend(other.records);
        self
    }
}

/// Runs bet mode batches on a rayon pool
pub struct BatchSimulator {
    config: BatchConfig,
    cancelled: Arc<AtomicBool>,
    processed: Arc<AtomicU64>,
}

impl BatchSimulator {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
            processed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Stop after the simulations in flight; the rest are skipped.
    /// Stays set until [`resume`](Self::resume).
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Shared flag for cancelling from another thread
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Simulations finished (accepted or failed) in the current batch
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Run `num_sims` simulations of bet mode `mode_name`
    pub fn run_bet_mode(
        &self,
        game: &GameConfig,
        mode_name: &str,
        num_sims: u64,
    ) -> SimResult<BatchReport> {
        if self.config.batch_size == 0 {
            return Err(SimError::InvalidConfig("batch_size must be at least 1".into()));
        }
        let mode = game.bet_mode(mode_name)?;
        let plan = DistributionPlan::new(mode, num_sims, self.config.seed_offset);
        self.processed.store(0, Ordering::Relaxed);

        log::info!(
            "Simulating {} × '{}' on {} threads ({} per chunk)",
            num_sims,
            mode.name,
            self.config.threads,
            self.config.batch_size
        );
        let started = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads.max(1))
            .build()?;

        let batch_size = self.config.batch_size;
        let chunks: Vec<Range<u64>> = (0..num_sims)
            .step_by(batch_size as usize)
            .map(|start| start..(start + batch_size).min(num_sims))
            .collect();

        let merged = pool.install(|| {
            chunks
                .par_iter()
                .map(|range| self.run_chunk(game, mode, &plan, range.clone()))
                .reduce(|| ChunkResult::new(mode), ChunkResult::merge)
        });

        let mut report = BatchReport {
            bet_mode: mode.name.clone(),
            cost: mode.cost,
            num_sims,
            stats: merged.stats,
            distributions: merged.distributions,
            failures: merged.failures,
            records: merged.records,
            cancelled: self.is_cancelled(),
            elapsed: started.elapsed(),
        };
        report.failures.sort_by_key(|f| f.sim);
        report.records.sort_by_key(|r| r.id);

        if report.cancelled {
            log::warn!(
                "Batch '{}' cancelled: {} of {} simulations skipped",
                mode.name,
                report.skipped(),
                num_sims
            );
        }
        for outcome in report.distributions.iter().filter(|d| d.failed > 0) {
            log::warn!(
                "Distribution '{}': {} of {} simulations failed",
                outcome.criteria,
                outcome.failed,
                outcome.assigned
            );
        }
        log::info!(
            "Batch '{}' done in {:.2?}: RTP {:.4}, hit rate {:.4}, {} completed, {} failed",
            mode.name,
            report.elapsed,
            report.rtp(),
            report.stats.hit_rate(),
            report.completed(),
            report.failed()
        );
        Ok(report)
    }

    fn run_chunk(
        &self,
        game: &GameConfig,
        mode: &BetMode,
        plan: &DistributionPlan,
        range: Range<u64>,
    ) -> ChunkResult {
        let mut result = ChunkResult::new(mode);
        let mut state = GameState::new(game, mode).with_options(SpinOptions {
            seed_offset: self.config.seed_offset,
            max_repeats: self.config.max_repeats,
        });

        for sim in range.clone() {
            let Some(index) = plan.distribution_for(sim) else {
                continue;
            };
            let distribution = &mode.distributions[index];
            let outcome = &mut result.distributions[index];
            outcome.assigned += 1;

            if self.is_cancelled() {
                outcome.skipped += 1;
                continue;
            }

            match state.run_spin(sim, distribution) {
                Ok(record) => {
                    outcome.completed += 1;
                    outcome.stats.record(&record);
                    result.stats.record(&record);
                    if self.config.keep_records {
                        result.records.push(record);
                    }
                }
                Err(error) => {
                    outcome.failed += 1;
                    result.failures.push(SimFailure {
                        sim,
                        criteria: distribution.criteria.clone(),
                        error,
                    });
                }
            }
            self.processed.fetch_add(1, Ordering::Relaxed);
        }

        log::debug!("Chunk {}..{} of '{}' done", range.start, range.end, mode.name);
        result
    }
}
