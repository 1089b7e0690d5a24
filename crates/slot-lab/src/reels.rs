//! Reel strips and named reel sets
//!
//! Reel sets are stored as CSV: one row per strip position, one column per
//! reel. Strips may differ in length; a shorter strip simply leaves its
//! trailing cells empty.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::symbols::{SymbolId, SymbolSet};

/// A virtual reel strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelStrip {
    /// Symbol IDs in order
    pub symbols: Vec<SymbolId>,
}

impl ReelStrip {
    pub fn new(symbols: Vec<SymbolId>) -> Self {
        Self { symbols }
    }

    /// Get symbol at position (wraps around)
    pub fn symbol_at(&self, position: usize) -> SymbolId {
        self.symbols[position % self.symbols.len()]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// A named set of strips, one per reel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelSet {
    pub name: String,
    pub strips: Vec<ReelStrip>,
}

impl ReelSet {
    pub fn new(name: impl Into<String>, strips: Vec<ReelStrip>) -> Self {
        Self {
            name: name.into(),
            strips,
        }
    }

    /// Build from symbol names, one inner list per reel
    pub fn from_names<S: AsRef<str>>(
        name: impl Into<String>,
        reels: &[Vec<S>],
        symbols: &SymbolSet,
    ) -> ConfigResult<Self> {
        let strips = reels
            .iter()
            .map(|reel| {
                reel.iter()
                    .map(|s| {
                        symbols
                            .id_of(s.as_ref())
                            .ok_or_else(|| ConfigError::UnknownSymbol(s.as_ref().to_string()))
                    })
                    .collect::<ConfigResult<Vec<_>>>()
                    .map(ReelStrip::new)
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self::new(name, strips))
    }

    /// Load a reel set from a CSV file
    pub fn from_csv_path(
        name: impl Into<String>,
        path: &Path,
        symbols: &SymbolSet,
    ) -> ConfigResult<Self> {
        let file = std::fs::File::open(path)?;
        let name = name.into();
        log::debug!("Loading reel set '{}' from {}", name, path.display());
        Self::from_csv_reader(name, file, symbols).map_err(|e| match e {
            ConfigError::ReelFile { source, .. } => ConfigError::ReelFile {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parse CSV rows (strip positions) into per-reel strips
    pub fn from_csv_reader<R: Read>(
        name: impl Into<String>,
        reader: R,
        symbols: &SymbolSet,
    ) -> ConfigResult<Self> {
        let name = name.into();
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut reels: Vec<Vec<SymbolId>> = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(|source| ConfigError::ReelFile {
                path: name.clone(),
                source,
            })?;
            if reels.is_empty() {
                reels.resize(record.len(), Vec::new());
            }
            for (reel, field) in record.iter().enumerate() {
                if field.is_empty() {
                    continue;
                }
                let id = symbols
                    .id_of(field)
                    .ok_or_else(|| ConfigError::UnknownSymbol(field.to_string()))?;
                match reels.get_mut(reel) {
                    Some(strip) => strip.push(id),
                    None => {
                        return Err(ConfigError::MalformedReelSet {
                            name,
                            reason: format!("row has more columns than the first row ({})", reel + 1),
                        });
                    }
                }
            }
        }

        let set = Self::new(name, reels.into_iter().map(ReelStrip::new).collect());
        set.validate(None)?;
        Ok(set)
    }

    /// Non-empty strips, and the expected reel count when one is given
    pub fn validate(&self, num_reels: Option<usize>) -> ConfigResult<()> {
        if let Some(expected) = num_reels {
            if self.strips.len() != expected {
                return Err(ConfigError::MalformedReelSet {
                    name: self.name.clone(),
                    reason: format!("{} reels, expected {}", self.strips.len(), expected),
                });
            }
        }
        if self.strips.is_empty() {
            return Err(ConfigError::MalformedReelSet {
                name: self.name.clone(),
                reason: "no reels".into(),
            });
        }
        if let Some(reel) = self.strips.iter().position(|s| s.is_empty()) {
            return Err(ConfigError::MalformedReelSet {
                name: self.name.clone(),
                reason: format!("reel {} is empty", reel),
            });
        }
        Ok(())
    }

    pub fn reel_count(&self) -> usize {
        self.strips.len()
    }
}
