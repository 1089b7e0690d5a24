//! Error types for slot-lab

use thiserror::Error;

/// Load-time configuration errors. Any of these halts a run before the first
/// simulation starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Bet mode '{mode}': distribution quotas sum to {sum}, expected 1.0")]
    QuotaSum { mode: String, sum: f64 },

    #[error("Bet mode '{mode}': distribution '{criteria}' has quota {quota} outside (0, 1]")]
    InvalidQuota {
        mode: String,
        criteria: String,
        quota: f64,
    },

    #[error("Bet mode '{0}' has no distributions")]
    EmptyBetMode(String),

    #[error("Unknown bet mode: {0}")]
    UnknownBetMode(String),

    #[error("Reel set '{0}' is not loaded")]
    MissingReelSet(String),

    #[error("Reel file not found: {0}")]
    MissingReelFile(String),

    #[error("Reel file {path}: {source}")]
    ReelFile {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Reel set '{name}': {reason}")]
    MalformedReelSet { name: String, reason: String },

    #[error("Malformed paytable entry ({count}, {symbol}): {reason}")]
    MalformedPaytable {
        count: u8,
        symbol: String,
        reason: String,
    },

    #[error("Payline {index}: {reason}")]
    InvalidPayline { index: u16, reason: String },

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(String),
}

/// Board drawing failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrawError {
    #[error("Reel set '{0}' is not loaded")]
    UnknownReelSet(String),

    #[error("Reel set '{reel_set}' has an empty strip on reel {reel}")]
    EmptyStrip { reel_set: String, reel: usize },

    #[error("Empty weight table for {0}")]
    EmptyWeights(String),

    #[error("Could not place {wanted} scatters on reel set '{reel_set}' after {attempts} attempts")]
    ForceUnreachable {
        reel_set: String,
        wanted: u8,
        attempts: u32,
    },

    #[error("Could not draw a board below the freegame trigger on '{reel_set}' after {attempts} attempts")]
    TriggerUnavoidable { reel_set: String, attempts: u32 },
}

/// Per-simulation failures. These never touch the state of other
/// simulations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpinError {
    #[error("Distribution '{criteria}' did not converge after {attempts} attempts")]
    Convergence { criteria: String, attempts: u32 },

    #[error("Draw error: {0}")]
    Draw(#[from] DrawError),
}

/// Result type alias
pub type ConfigResult<T> = Result<T, ConfigError>;
