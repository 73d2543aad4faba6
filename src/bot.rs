//! Move selection strategies for the computer opponent

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::{BoardConfig, EngineConfig},
    position::Position,
    search::{CancellationToken, Searcher},
    transposition_table::TranspositionTable,
};

/// Anything that can pick a column for the side to move
pub trait MoveSelector: Send {
    /// Picks a legal column, `None` if the game is over or `cancel` was set
    fn select_move(&mut self, position: &Position, cancel: &CancellationToken) -> Option<usize>;

    fn name(&self) -> &str;

    /// Drops anything remembered from earlier games
    fn reset(&mut self) {}
}

/// A bot without lookahead
///
/// It takes an immediate win, blocks the opponent's immediate win, and otherwise
/// plays a random column, preferring central ones, that doesn't hand the
/// opponent a win on the next move.
pub struct HeuristicBot {
    rng: StdRng,
}

impl HeuristicBot {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    // random column weighted towards the middle of the board
    fn pick_central(&mut self, columns: usize, candidates: &[usize]) -> usize {
        let weights: Vec<usize> = candidates
            .iter()
            .map(|&column| columns - (2 * column as isize - (columns as isize - 1)).abs() as usize / 2)
            .collect();
        let mut pick = self.rng.random_range(0..weights.iter().sum::<usize>());
        for (&column, &weight) in candidates.iter().zip(weights.iter()) {
            if pick < weight {
                return column;
            }
            pick -= weight;
        }
        candidates[candidates.len() - 1]
    }
}

impl Default for HeuristicBot {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveSelector for HeuristicBot {
    fn select_move(&mut self, position: &Position, _cancel: &CancellationToken) -> Option<usize> {
        let legal = position.legal_moves();
        if legal.is_empty() {
            return None;
        }
        let side = position.current_player();

        // own winning moves first, then the opponent's
        for &player in [side, side.other()].iter() {
            if let Some(&column) = legal
                .iter()
                .find(|&&column| position.is_winning_move(column, player))
            {
                return Some(column);
            }
        }

        let mut probe = position.clone();
        let safe: Vec<usize> = legal
            .iter()
            .copied()
            .filter(|&column| {
                if probe.apply_move(column).is_err() {
                    return false;
                }
                let gives_win = probe
                    .legal_moves()
                    .into_iter()
                    .any(|reply| probe.is_winning_move(reply, side.other()));
                let _ = probe.undo_move();
                !gives_win
            })
            .collect();

        // no chance, any legal column will do
        let candidates = if safe.is_empty() { &legal } else { &safe };
        Some(self.pick_central(position.columns(), candidates))
    }

    fn name(&self) -> &str {
        "Heuristic"
    }
}

/// A bot running the alpha-beta [`Searcher`] with its transposition table
pub struct MinimaxBot {
    searcher: Searcher,
}

impl MinimaxBot {
    pub fn new(config: &EngineConfig) -> Self {
        let mut searcher = Searcher::new_with_transposition_table(
            config.search_depth,
            TranspositionTable::with_capacity(config.table_capacity),
        );
        if let Some(seed) = config.seed {
            searcher = searcher.with_seed(seed);
        }
        Self { searcher }
    }

    pub fn searcher(&self) -> &Searcher {
        &self.searcher
    }
}

impl MoveSelector for MinimaxBot {
    fn select_move(&mut self, position: &Position, cancel: &CancellationToken) -> Option<usize> {
        self.searcher
            .search_cancellable(position, cancel)
            .map(|outcome| outcome.column)
    }

    fn name(&self) -> &str {
        "Minimax"
    }

    fn reset(&mut self) {
        self.searcher.clear();
    }
}

/// Which kind of bot a board gets
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BotKind {
    Heuristic,
    Minimax,
}

impl BotKind {
    /// The full search is tuned for the canonical board only
    pub fn for_board(board: &BoardConfig) -> Self {
        if board.is_canonical() && board.supports_fingerprint() {
            BotKind::Minimax
        } else {
            BotKind::Heuristic
        }
    }
}

/// Builds the bot for a board, decided once per game setup
pub fn bot_for(board: &BoardConfig, engine: &EngineConfig) -> Box<dyn MoveSelector> {
    match BotKind::for_board(board) {
        BotKind::Minimax => Box::new(MinimaxBot::new(engine)),
        BotKind::Heuristic => Box::new(match engine.seed {
            Some(seed) => HeuristicBot::with_seed(seed),
            None => HeuristicBot::new(),
        }),
    }
}
