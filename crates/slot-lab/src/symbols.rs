//! Symbol definitions and the board grid

use serde::{Deserialize, Serialize};

/// Index into a [`SymbolSet`]
pub type SymbolId = u32;

/// Symbol type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolType {
    /// Regular paying symbol
    Regular,
    /// Wild - substitutes for others
    Wild,
    /// Scatter - triggers free games regardless of position
    Scatter,
}

/// A symbol definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique symbol ID
    pub id: SymbolId,
    /// Symbol name (e.g., "GOLD", "WILD", "SCATTER")
    pub name: String,
    /// Symbol type
    pub symbol_type: SymbolType,
}

/// Finite symbol alphabet with its wild and scatter subsets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolSet {
    symbols: Vec<Symbol>,
}

impl SymbolSet {
    /// Build a set from symbol names plus the special subsets.
    ///
    /// A name listed both as wild and scatter is kept as scatter: scatter is
    /// never wild-substitutable.
    pub fn new<S: AsRef<str>>(names: &[S], wild: &[S], scatter: &[S]) -> Self {
        let mut set = Self::default();
        for name in names {
            let name = name.as_ref();
            let symbol_type = if scatter.iter().any(|s| s.as_ref() == name) {
                SymbolType::Scatter
            } else if wild.iter().any(|s| s.as_ref() == name) {
                SymbolType::Wild
            } else {
                SymbolType::Regular
            };
            set.insert(name, symbol_type);
        }
        set
    }

    /// Add a symbol, returning its ID (existing ID if already present)
    pub fn insert(&mut self, name: &str, symbol_type: SymbolType) -> SymbolId {
        if let Some(id) = self.id_of(name) {
            return id;
        }
        let id = self.symbols.len() as SymbolId;
        self.symbols.push(Symbol {
            id,
            name: name.to_string(),
            symbol_type,
        });
        id
    }

    /// Get symbol by ID
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id as usize)
    }

    /// Resolve a symbol name
    pub fn id_of(&self, name: &str) -> Option<SymbolId> {
        self.symbols.iter().find(|s| s.name == name).map(|s| s.id)
    }

    /// Symbol name, or `"?"` for an out-of-range ID
    pub fn name_of(&self, id: SymbolId) -> &str {
        self.get(id).map(|s| s.name.as_str()).unwrap_or("?")
    }

    pub fn is_wild(&self, id: SymbolId) -> bool {
        self.get(id).is_some_and(|s| s.symbol_type == SymbolType::Wild)
    }

    pub fn is_scatter(&self, id: SymbolId) -> bool {
        self.get(id).is_some_and(|s| s.symbol_type == SymbolType::Scatter)
    }

    /// All IDs of a given type
    pub fn ids_of_type(&self, symbol_type: SymbolType) -> Vec<SymbolId> {
        self.symbols
            .iter()
            .filter(|s| s.symbol_type == symbol_type)
            .map(|s| s.id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }
}

/// One visible board position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub symbol: SymbolId,
    /// Multiplier attached to a wild, if the game type assigns one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<u32>,
}

impl Cell {
    pub fn new(symbol: SymbolId) -> Self {
        Self {
            symbol,
            multiplier: None,
        }
    }
}

/// A drawn board, reel-major (`reels[reel][row]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    /// Reel set the board was drawn from
    pub reel_set: String,
    /// Stop position per reel
    pub stops: Vec<usize>,
    /// Visible cells
    pub reels: Vec<Vec<Cell>>,
    /// Anticipation order per reel (0 = none)
    pub anticipation: Vec<u32>,
}

impl Board {
    /// Build a board from raw symbol IDs (mostly for tests and replays)
    pub fn from_symbols(reel_set: impl Into<String>, grid: Vec<Vec<SymbolId>>) -> Self {
        let reel_count = grid.len();
        Self {
            reel_set: reel_set.into(),
            stops: vec![0; reel_count],
            reels: grid
                .into_iter()
                .map(|column| column.into_iter().map(Cell::new).collect())
                .collect(),
            anticipation: vec![0; reel_count],
        }
    }

    pub fn reel_count(&self) -> usize {
        self.reels.len()
    }

    pub fn cell(&self, reel: usize, row: usize) -> Option<&Cell> {
        self.reels.get(reel).and_then(|r| r.get(row))
    }

    /// Positions `(reel, row)` holding a symbol for which `pred` holds
    pub fn positions_where(&self, pred: impl Fn(SymbolId) -> bool) -> Vec<(u8, u8)> {
        let mut positions = Vec::new();
        for (reel, column) in self.reels.iter().enumerate() {
            for (row, cell) in column.iter().enumerate() {
                if pred(cell.symbol) {
                    positions.push((reel as u8, row as u8));
                }
            }
        }
        positions
    }

    /// Count scatters anywhere on the board
    pub fn count_scatters(&self, symbols: &SymbolSet) -> u8 {
        self.positions_where(|s| symbols.is_scatter(s)).len() as u8
    }

    /// Symbol IDs only, reel-major
    pub fn symbol_grid(&self) -> Vec<Vec<SymbolId>> {
        self.reels
            .iter()
            .map(|column| column.iter().map(|c| c.symbol).collect())
            .collect()
    }
}
