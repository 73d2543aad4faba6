//! Board representation and rules of connect-N
//!
//! A [`Position`] owns the whole board and is mutated in place: [`Position::apply_move`]
//! and [`Position::undo_move`] are exact inverses, so the search can walk the game
//! tree on a single instance. The heuristic score and the fingerprint are kept up
//! to date incrementally on every move.

use anyhow::{anyhow, Result};

use std::fmt;

use crate::{config::BoardConfig, error::GameError};

/// Score of a position won by yellow
pub const MAX_SCORE: i32 = i32::MAX;
/// Score of a position won by red
pub const MIN_SCORE: i32 = -i32::MAX;

/// Score of an empty canonical board, half the sum of the weight table
pub const EVALUATION_UTILITY: i32 = 138;

/// Positional weights of the canonical board, top row first
///
/// Every cell is part of a number of possible 4-alignments, central cells of
/// many more than edge cells.
const EVALUATION_TABLE: [[i32; 7]; 6] = [
    [3, 4, 5, 7, 5, 4, 3],
    [4, 6, 8, 10, 8, 6, 4],
    [5, 8, 11, 13, 11, 8, 5],
    [5, 8, 11, 13, 11, 8, 5],
    [4, 6, 8, 10, 8, 6, 4],
    [3, 4, 5, 7, 5, 4, 3],
];

// horizontal, vertical, diagonal down-right, diagonal up-right
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    /// Moves first, minimizes the evaluation
    Red,
    /// Moves second, maximizes the evaluation
    Yellow,
}

impl Player {
    pub fn other(self) -> Player {
        match self {
            Player::Red => Player::Yellow,
            Player::Yellow => Player::Red,
        }
    }

    pub fn cell(self) -> Cell {
        match self {
            Player::Red => Cell::Red,
            Player::Yellow => Cell::Yellow,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Player::Red => "Red",
            Player::Yellow => "Yellow",
        }
    }

    // sign of this player's pieces in the evaluation
    fn sign(self) -> i32 {
        match self {
            Player::Red => -1,
            Player::Yellow => 1,
        }
    }

    // digit of this player's pieces in the bijective base-2 column code
    fn fingerprint_digit(self) -> u64 {
        match self {
            Player::Red => 1,
            Player::Yellow => 2,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Red,
    Yellow,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::Red => Some(Player::Red),
            Cell::Yellow => Some(Player::Yellow),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    Won(Player),
    Drawn,
}

/// What a move did to the game
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveResult {
    Ongoing,
    Win,
    Draw,
}

/// The cell a move was placed in, for callers mirroring the board
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub row: usize,
    pub column: usize,
    pub player: Player,
    pub result: MoveResult,
}

/// A connect-N game in progress
///
/// Rows are numbered from the top, so pieces land in the highest free row index
/// of a column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    config: BoardConfig,
    // row-major, top row first
    cells: Vec<Cell>,
    // number of pieces in each column
    heights: Vec<usize>,
    history: Vec<usize>,
    current_player: Player,
    status: GameStatus,
    winning_cells: Vec<(usize, usize)>,
    evaluation: i32,
    fingerprint: u64,
}

impl Position {
    /// Creates an empty board, red to move
    pub fn new(config: BoardConfig) -> Self {
        Self {
            config,
            cells: vec![Cell::Empty; config.cell_count()],
            heights: vec![0; config.columns()],
            history: Vec::with_capacity(config.cell_count()),
            current_player: Player::Red,
            status: GameStatus::Playing,
            winning_cells: Vec::with_capacity(config.run_length()),
            evaluation: EVALUATION_UTILITY,
            fingerprint: 0,
        }
    }

    /// Plays a sequence of 1-indexed column digits on the canonical board
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        Self::from_moves_on(BoardConfig::canonical(), moves)
    }

    /// Plays a sequence of 1-indexed column digits on the given board
    ///
    /// The last move may end the game, any move after that is an error.
    pub fn from_moves_on<S: AsRef<str>>(config: BoardConfig, moves: S) -> Result<Self> {
        let mut position = Self::new(config);

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column) if column >= 1 && column <= config.columns() => {
                    let column = column - 1;
                    if position.is_over() {
                        return Err(anyhow!("Invalid position, game is over"));
                    }
                    if !position.is_legal_move(column) {
                        return Err(anyhow!("Invalid move, column {} full", column + 1));
                    }
                    position.apply_move(column)?;
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(position)
    }

    /// Resets the board to the start of a game
    pub fn init_new_game(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell = Cell::Empty;
        }
        for height in self.heights.iter_mut() {
            *height = 0;
        }
        self.history.clear();
        self.current_player = Player::Red;
        self.status = GameStatus::Playing;
        self.winning_cells.clear();
        self.evaluation = EVALUATION_UTILITY;
        self.fingerprint = 0;
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn rows(&self) -> usize {
        self.config.rows()
    }

    pub fn columns(&self) -> usize {
        self.config.columns()
    }

    pub fn run_length(&self) -> usize {
        self.config.run_length()
    }

    pub fn cell(&self, row: usize, column: usize) -> Cell {
        self.cells[row * self.columns() + column]
    }

    /// A copy of the board, top row first
    pub fn board_snapshot(&self) -> Vec<Vec<Cell>> {
        self.cells
            .chunks(self.columns())
            .map(|row| row.to_vec())
            .collect()
    }

    /// The row a piece dropped into `column` would land in, `None` if the column is full or out of range
    pub fn drop_row(&self, column: usize) -> Option<usize> {
        let height = *self.heights.get(column)?;
        if height < self.rows() {
            Some(self.rows() - 1 - height)
        } else {
            None
        }
    }

    pub fn is_legal_move(&self, column: usize) -> bool {
        !self.is_over() && self.drop_row(column).is_some()
    }

    /// Legal columns from left to right
    pub fn legal_moves(&self) -> Vec<usize> {
        (0..self.columns())
            .filter(|&column| self.is_legal_move(column))
            .collect()
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn moves_played(&self) -> usize {
        self.history.len()
    }

    /// Columns played so far, oldest first
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    pub fn last_move(&self) -> Option<usize> {
        self.history.last().copied()
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status != GameStatus::Playing
    }

    pub fn ended_in_win(&self) -> bool {
        matches!(self.status, GameStatus::Won(_))
    }

    pub fn ended_in_draw(&self) -> bool {
        self.status == GameStatus::Drawn
    }

    pub fn winner(&self) -> Option<Player> {
        match self.status {
            GameStatus::Won(player) => Some(player),
            _ => None,
        }
    }

    /// The `(row, column)` cells of the winning line, empty unless the game was won
    pub fn winning_cells(&self) -> &[(usize, usize)] {
        &self.winning_cells
    }

    /// Drops a piece of the current player into `column`
    pub fn apply_move(&mut self, column: usize) -> Result<MoveOutcome, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let row = self
            .drop_row(column)
            .ok_or(GameError::InvalidMove { column })?;
        let player = self.current_player;

        let index = row * self.columns() + column;
        self.history.push(column);
        self.cells[index] = player.cell();
        self.heights[column] += 1;
        self.update_incremental(row, column, player, true);

        let mut result = MoveResult::Ongoing;
        // no alignment is possible before the first player's run_length-th piece
        if self.history.len() + 1 >= 2 * self.run_length() {
            if let Some(line) = self.winning_line(row, column, player) {
                self.record_win(player, line);
                result = MoveResult::Win;
            }
        }
        if result == MoveResult::Ongoing && self.history.len() == self.config.cell_count() {
            self.status = GameStatus::Drawn;
            result = MoveResult::Draw;
        }

        self.current_player = player.other();
        self.debug_check_incremental();

        Ok(MoveOutcome {
            row,
            column,
            player,
            result,
        })
    }

    /// Takes back the most recent move, returning its column
    pub fn undo_move(&mut self) -> Result<usize, GameError> {
        let column = self.history.pop().ok_or(GameError::EmptyHistory)?;

        self.status = GameStatus::Playing;
        self.winning_cells.clear();
        self.current_player = self.current_player.other();

        self.heights[column] -= 1;
        let row = self.rows() - 1 - self.heights[column];
        let index = row * self.columns() + column;
        debug_assert_eq!(self.cells[index], self.current_player.cell());
        self.update_incremental(row, column, self.current_player, false);
        self.cells[index] = Cell::Empty;

        self.debug_check_incremental();
        Ok(column)
    }

    /// Whether `player` dropping into `column` completes a run, without playing the move
    pub fn is_winning_move(&self, column: usize, player: Player) -> bool {
        match self.drop_row(column) {
            Some(row) => self.winning_line(row, column, player).is_some(),
            None => false,
        }
    }

    /// The score of the position from yellow's point of view
    ///
    /// Won positions score [`MAX_SCORE`] or [`MIN_SCORE`] and draws 0. Otherwise the
    /// running weight-table score is returned, which stays at [`EVALUATION_UTILITY`]
    /// on non-canonical boards.
    pub fn evaluate(&self) -> i32 {
        match self.status {
            GameStatus::Won(Player::Yellow) => MAX_SCORE,
            GameStatus::Won(Player::Red) => MIN_SCORE,
            GameStatus::Drawn => 0,
            GameStatus::Playing => self.evaluation,
        }
    }

    /// The running weight-table score, ignoring whether the game is over
    pub fn heuristic_evaluation(&self) -> i32 {
        self.evaluation
    }

    /// The weight-table score summed over the whole board
    pub fn evaluation_from_scratch(&self) -> i32 {
        if !self.config.is_canonical() {
            return EVALUATION_UTILITY;
        }
        let mut evaluation = EVALUATION_UTILITY;
        for row in 0..self.rows() {
            for column in 0..self.columns() {
                if let Some(player) = self.cell(row, column).player() {
                    evaluation += player.sign() * EVALUATION_TABLE[row][column];
                }
            }
        }
        evaluation
    }

    /// Key of the board for the transposition table
    ///
    /// `None` when the board is too large for every column to get its own bit field.
    pub fn fingerprint(&self) -> Option<u64> {
        if self.config.supports_fingerprint() {
            Some(self.fingerprint)
        } else {
            None
        }
    }

    /// The fingerprint computed by scanning the whole board
    pub fn fingerprint_from_scratch(&self) -> Option<u64> {
        if !self.config.supports_fingerprint() {
            return None;
        }
        let mut fingerprint = 0;
        for row in 0..self.rows() {
            for column in 0..self.columns() {
                if let Some(player) = self.cell(row, column).player() {
                    fingerprint += self.fingerprint_bits(row, column, player);
                }
            }
        }
        Some(fingerprint)
    }

    // a piece at height k of column c adds digit * 2^k to that column's field
    fn fingerprint_bits(&self, row: usize, column: usize, player: Player) -> u64 {
        let height = self.rows() - 1 - row;
        player.fingerprint_digit() << (column * (self.rows() + 1) + height)
    }

    fn update_incremental(&mut self, row: usize, column: usize, player: Player, placed: bool) {
        if self.config.is_canonical() {
            let delta = player.sign() * EVALUATION_TABLE[row][column];
            if placed {
                self.evaluation += delta;
            } else {
                self.evaluation -= delta;
            }
        }
        if self.config.supports_fingerprint() {
            let bits = self.fingerprint_bits(row, column, player);
            if placed {
                self.fingerprint += bits;
            } else {
                self.fingerprint -= bits;
            }
        }
    }

    fn debug_check_incremental(&self) {
        debug_assert_eq!(
            self.fingerprint(),
            self.fingerprint_from_scratch(),
            "incremental fingerprint diverged from the board"
        );
        debug_assert_eq!(
            self.evaluation,
            self.evaluation_from_scratch(),
            "incremental evaluation diverged from the board"
        );
    }

    /// Finds the first run of `player` through `(row, column)`, counting that cell as
    /// occupied by `player`
    ///
    /// Returns the first cell of the line and its direction. Directions are tried
    /// horizontal, vertical, then both diagonals, and within a direction the
    /// top-most, left-most window first.
    fn winning_line(
        &self,
        row: usize,
        column: usize,
        player: Player,
    ) -> Option<((isize, isize), (isize, isize))> {
        let run = self.run_length() as isize;
        let (row, column) = (row as isize, column as isize);

        for &(dr, dc) in DIRECTIONS.iter() {
            'window: for offset in (0..run).rev() {
                let start = (row - offset * dr, column - offset * dc);
                for step in 0..run {
                    let (r, c) = (start.0 + step * dr, start.1 + step * dc);
                    if r < 0 || c < 0 || r >= self.rows() as isize || c >= self.columns() as isize
                    {
                        continue 'window;
                    }
                    if (r, c) != (row, column)
                        && self.cell(r as usize, c as usize) != player.cell()
                    {
                        continue 'window;
                    }
                }
                return Some((start, (dr, dc)));
            }
        }
        None
    }

    fn record_win(&mut self, player: Player, line: ((isize, isize), (isize, isize))) {
        let ((row, column), (dr, dc)) = line;
        self.status = GameStatus::Won(player);
        self.winning_cells.clear();
        for step in 0..self.run_length() as isize {
            self.winning_cells
                .push(((row + step * dr) as usize, (column + step * dc) as usize));
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(BoardConfig::canonical())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows() {
            for column in 0..self.columns() {
                let symbol = match self.cell(row, column) {
                    Cell::Empty => 'O',
                    Cell::Red => 'R',
                    Cell::Yellow => 'Y',
                };
                if column > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
