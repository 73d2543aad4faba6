//! Rules engine and computer opponent for generalized connect-N games
//!
//! The board size and the length of the run needed to win are configurable.
//! A [`Position`] tracks the board incrementally (heuristic score and a 64-bit
//! fingerprint are updated in O(1) per move) and a depth-limited alpha-beta
//! search with a transposition table picks moves for the computer.
//!
//! # Basic Usage
//!
//! ```
//! use connect_n::{position::Position, search::Searcher};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! // yellow to move, red threatens to complete the bottom row
//! let position = Position::from_moves("11223")?;
//! let mut searcher = Searcher::new(4);
//! let outcome = searcher.search(&position).expect("search was not cancelled");
//!
//! assert_eq!(outcome.column, 3);
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod error;

pub mod config;

pub mod position;

pub mod transposition_table;

pub mod search;

pub mod bot;

pub mod engine;

pub mod session;

pub mod simulator;

mod test;

pub use config::{BoardConfig, EngineConfig};
pub use error::GameError;
pub use position::{Cell, GameStatus, MoveOutcome, Player, Position};
pub use session::{GameMode, GameSession, Tally};

/// The number of rows of the canonical board
pub const CANONICAL_ROWS: usize = 6;

/// The number of columns of the canonical board
pub const CANONICAL_COLUMNS: usize = 7;

/// The run length needed to win on the canonical board
pub const CANONICAL_RUN_LENGTH: usize = 4;

/// Search depth used for the canonical board
pub const SEARCH_DEPTH: u32 = 11;

/// Inclusive bounds on the number of rows and columns
pub const MIN_DIMENSION: usize = 1;
pub const MAX_DIMENSION: usize = 11;

/// Inclusive bounds on the run length
pub const MIN_RUN_LENGTH: usize = 1;
pub const MAX_RUN_LENGTH: usize = 6;

/// Bits available for the position fingerprint
pub const FINGERPRINT_BITS: usize = 64;

// each column needs rows + 1 bits of fingerprint, the canonical board must fit
const_assert!(CANONICAL_COLUMNS * (CANONICAL_ROWS + 1) <= FINGERPRINT_BITS);
