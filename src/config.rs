//! Board and engine configuration

use tracing::warn;

use crate::{
    error::GameError, CANONICAL_COLUMNS, CANONICAL_ROWS, CANONICAL_RUN_LENGTH, FINGERPRINT_BITS,
    MAX_DIMENSION, MAX_RUN_LENGTH, MIN_DIMENSION, MIN_RUN_LENGTH, SEARCH_DEPTH,
};

/// The fixed shape of a game: board dimensions and the run length needed to win
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoardConfig {
    rows: usize,
    columns: usize,
    run_length: usize,
}

impl BoardConfig {
    /// Creates a configuration, rejecting values outside the supported bounds
    pub fn new(rows: usize, columns: usize, run_length: usize) -> Result<Self, GameError> {
        check_range("rows", rows, MIN_DIMENSION, MAX_DIMENSION)?;
        check_range("columns", columns, MIN_DIMENSION, MAX_DIMENSION)?;
        check_range("run length", run_length, MIN_RUN_LENGTH, MAX_RUN_LENGTH)?;
        Ok(Self {
            rows,
            columns,
            run_length,
        })
    }

    /// Creates a configuration, clamping every value into the supported bounds
    pub fn clamped(rows: usize, columns: usize, run_length: usize) -> Self {
        let config = Self {
            rows: rows.max(MIN_DIMENSION).min(MAX_DIMENSION),
            columns: columns.max(MIN_DIMENSION).min(MAX_DIMENSION),
            run_length: run_length.max(MIN_RUN_LENGTH).min(MAX_RUN_LENGTH),
        };
        if (config.rows, config.columns, config.run_length) != (rows, columns, run_length) {
            warn!(
                rows,
                columns,
                run_length,
                "board configuration out of range, clamped to {}x{} with run length {}",
                config.rows,
                config.columns,
                config.run_length
            );
        }
        config
    }

    /// The standard 6x7 board with a run length of 4
    pub const fn canonical() -> Self {
        Self {
            rows: CANONICAL_ROWS,
            columns: CANONICAL_COLUMNS,
            run_length: CANONICAL_RUN_LENGTH,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn run_length(&self) -> usize {
        self.run_length
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.columns
    }

    /// Whether the board has the canonical dimensions the evaluation table is defined for
    ///
    /// The run length is not part of the check.
    pub fn is_canonical(&self) -> bool {
        self.rows == CANONICAL_ROWS && self.columns == CANONICAL_COLUMNS
    }

    /// Whether every column fits its own `rows + 1` bit field in the fingerprint
    pub fn supports_fingerprint(&self) -> bool {
        self.columns * (self.rows + 1) <= FINGERPRINT_BITS
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::canonical()
    }
}

fn check_range(what: &'static str, value: usize, min: usize, max: usize) -> Result<(), GameError> {
    if value < min || value > max {
        return Err(GameError::ConfigurationOutOfRange {
            what,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Default number of transposition table entries (a prime, 16 bytes each)
pub const DEFAULT_TABLE_CAPACITY: usize = (1 << 20) - 3;

/// Settings for the computer opponent
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Depth of the alpha-beta search in plies
    pub search_depth: u32,
    /// Seed for the random number generators, `None` seeds from the OS
    pub seed: Option<u64>,
    /// Number of transposition table entries
    pub table_capacity: usize,
}

impl EngineConfig {
    pub fn with_search_depth(mut self, search_depth: u32) -> Self {
        self.search_depth = search_depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_table_capacity(mut self, table_capacity: usize) -> Self {
        self.table_capacity = table_capacity;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_depth: SEARCH_DEPTH,
            seed: None,
            table_capacity: DEFAULT_TABLE_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_out_of_range() {
        assert!(BoardConfig::new(6, 7, 4).is_ok());
        assert_eq!(
            BoardConfig::new(0, 7, 4),
            Err(GameError::ConfigurationOutOfRange {
                what: "rows",
                value: 0,
                min: 1,
                max: 11
            })
        );
        assert!(BoardConfig::new(6, 12, 4).is_err());
        assert!(BoardConfig::new(6, 7, 7).is_err());
    }

    #[test]
    fn clamped_stays_in_bounds() {
        let config = BoardConfig::clamped(0, 40, 9);
        assert_eq!(config.rows(), 1);
        assert_eq!(config.columns(), 11);
        assert_eq!(config.run_length(), 6);
        assert_eq!(BoardConfig::clamped(6, 7, 4), BoardConfig::canonical());
    }

    #[test]
    fn fingerprint_capacity() {
        assert!(BoardConfig::canonical().supports_fingerprint());
        // 8 columns of 8 bits
        assert!(BoardConfig::clamped(7, 8, 4).supports_fingerprint());
        assert!(!BoardConfig::clamped(7, 9, 4).supports_fingerprint());
        assert!(!BoardConfig::clamped(11, 11, 4).supports_fingerprint());
    }
}
