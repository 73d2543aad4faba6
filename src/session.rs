//! The game as seen by a front end: moves, undo, the computer opponent and
//! running score tallies

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::{
    config::{BoardConfig, EngineConfig},
    engine::{Engine, Phase},
    position::{Cell, GameStatus, MoveOutcome, MoveResult, Player, Position},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameMode {
    /// Two humans share the board
    TwoPlayer,
    /// A human plays red against the computer
    VersusComputer,
    /// Both sides drop into random columns
    AutoDrop,
}

/// Results of the games finished in this session
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub red_wins: usize,
    pub yellow_wins: usize,
    pub draws: usize,
    pub games_played: usize,
}

impl Tally {
    fn record(&mut self, status: GameStatus) {
        match status {
            GameStatus::Won(Player::Red) => self.red_wins += 1,
            GameStatus::Won(Player::Yellow) => self.yellow_wins += 1,
            GameStatus::Drawn => self.draws += 1,
            GameStatus::Playing => return,
        }
        self.games_played += 1;
    }

    // the game-ending move was taken back
    fn revoke(&mut self, status: GameStatus) {
        match status {
            GameStatus::Won(Player::Red) => self.red_wins -= 1,
            GameStatus::Won(Player::Yellow) => self.yellow_wins -= 1,
            GameStatus::Drawn => self.draws -= 1,
            GameStatus::Playing => return,
        }
        self.games_played -= 1;
    }
}

pub struct GameSession {
    position: Position,
    engine_config: EngineConfig,
    engine: Engine,
    mode: GameMode,
    computer: Player,
    tally: Tally,
    rng: StdRng,
}

impl GameSession {
    pub fn new(board: BoardConfig, engine_config: EngineConfig) -> Self {
        let rng = match engine_config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        info!(
            rows = board.rows(),
            columns = board.columns(),
            run_length = board.run_length(),
            "new game"
        );
        Self {
            position: Position::new(board),
            engine: Engine::for_config(&board, &engine_config),
            engine_config,
            mode: GameMode::TwoPlayer,
            computer: Player::Yellow,
            tally: Tally::default(),
            rng,
        }
    }

    /// Reconfigures the board, clamping out of range values
    ///
    /// Starts a fresh game with a new engine and clears the tallies.
    pub fn new_game(&mut self, rows: usize, columns: usize, run_length: usize) {
        let board = BoardConfig::clamped(rows, columns, run_length);
        let mode = self.mode;
        *self = Self::new(board, self.engine_config);
        self.mode = mode;
    }

    /// Starts the next game on the same board, keeping the tallies
    pub fn restart(&mut self) {
        self.engine.reset();
        self.position.init_new_game();
        info!(mode = ?self.mode, "game restarted");
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Switches the game mode, stopping any search in progress
    pub fn set_mode(&mut self, mode: GameMode) {
        if mode == self.mode {
            return;
        }
        self.engine.cancel();
        self.mode = mode;
        info!(?mode, "game mode changed");
    }

    pub fn computer_player(&self) -> Player {
        self.computer
    }

    pub fn is_computer_turn(&self) -> bool {
        self.mode == GameMode::VersusComputer
            && !self.position.is_over()
            && self.position.current_player() == self.computer
    }

    /// Plays a human move
    ///
    /// Ignored when the column is illegal, the game is over, or it is not a
    /// human's turn.
    pub fn request_move(&mut self, column: usize) -> Option<MoveOutcome> {
        if self.mode == GameMode::AutoDrop || self.is_computer_turn() {
            return None;
        }
        self.play(column)
    }

    /// Takes back the last move, or the last two against the computer so the
    /// human is to move again
    ///
    /// Returns the number of moves taken back.
    pub fn request_undo(&mut self) -> usize {
        self.engine.cancel();

        let plies = match self.mode {
            GameMode::VersusComputer
                if self.position.current_player() != self.computer
                    && self.position.moves_played() >= 2 =>
            {
                2
            }
            _ => 1,
        };
        (0..plies).take_while(|_| self.undo_ply()).count()
    }

    /// Lets the computer move if it is its turn and a move is ready
    ///
    /// Against the computer this starts the engine when needed and never blocks;
    /// call it once per frame. In auto-drop mode every call plays one random move.
    pub fn poll_bot_move(&mut self) -> Option<MoveOutcome> {
        if self.position.is_over() {
            return None;
        }
        match self.mode {
            GameMode::TwoPlayer => None,
            GameMode::AutoDrop => {
                let legal = self.position.legal_moves();
                let column = legal[self.rng.random_range(0..legal.len())];
                self.play(column)
            }
            GameMode::VersusComputer => {
                if !self.is_computer_turn() {
                    return None;
                }
                if self.engine.phase() == Phase::Idle {
                    self.engine.start(&self.position);
                }
                let column = self.engine.poll_move()?;
                self.play(column)
            }
        }
    }

    pub fn engine_phase(&mut self) -> Phase {
        self.engine.phase()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn board_config(&self) -> BoardConfig {
        self.position.config()
    }

    pub fn current_player(&self) -> Player {
        self.position.current_player()
    }

    pub fn moves_played(&self) -> usize {
        self.position.moves_played()
    }

    pub fn status(&self) -> GameStatus {
        self.position.status()
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn winning_cells(&self) -> Vec<(usize, usize)> {
        self.position.winning_cells().to_vec()
    }

    pub fn board_snapshot(&self) -> Vec<Vec<Cell>> {
        self.position.board_snapshot()
    }

    fn play(&mut self, column: usize) -> Option<MoveOutcome> {
        match self.position.apply_move(column) {
            Ok(outcome) => {
                if outcome.result != MoveResult::Ongoing {
                    self.tally.record(self.position.status());
                    info!(
                        status = ?self.position.status(),
                        moves = self.position.moves_played(),
                        "game finished"
                    );
                }
                Some(outcome)
            }
            Err(err) => {
                debug!(column, %err, "move request ignored");
                None
            }
        }
    }

    fn undo_ply(&mut self) -> bool {
        let status = self.position.status();
        match self.position.undo_move() {
            Ok(_) => {
                self.tally.revoke(status);
                true
            }
            Err(err) => {
                debug!(%err, "undo request ignored");
                false
            }
        }
    }
}
