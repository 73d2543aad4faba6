//! Depth-limited alpha-beta search for the computer opponent

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

use crate::{
    position::{Player, Position, MAX_SCORE, MIN_SCORE},
    transposition_table::{Bound, TranspositionTable},
};

/// Returns the columns ordered from the middle outwards, as
/// the middle columns are often better moves
///
/// On ties the left column comes first, so 7 columns give `3 2 4 1 5 0 6`.
pub fn move_order(columns: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..columns).collect();
    order.sort_by_key(|&column| ((2 * column as isize - (columns as isize - 1)).abs(), column));
    order
}

/// Score of a won game for `player`
pub fn win_score(player: Player) -> i32 {
    match player {
        Player::Yellow => MAX_SCORE,
        Player::Red => MIN_SCORE,
    }
}

/// A flag shared with a running search, asking it to stop
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Which rule produced a recommended move
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchKind {
    /// The side to move wins on the spot
    ImmediateWin,
    /// The opponent had exactly one immediate win, which is blocked
    Block,
    /// Full alpha-beta search
    AlphaBeta,
    /// Every line loses, a random legal column is played
    RandomFallback,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    pub column: usize,
    /// Score from yellow's point of view
    pub score: i32,
    pub kind: SearchKind,
    /// Nodes visited by the alpha-beta search
    pub nodes: usize,
}

/// A minimax searcher with alpha-beta pruning
///
/// # Notes
/// Yellow is the maximizing side and red the minimizing side, matching the sign
/// of [`Position::evaluate`], so the same searcher can play either color. The
/// search walks the tree on one copy of the position, applying and undoing moves.
///
/// The transposition table outlives a single search. Entries are keyed by the
/// position fingerprint and store the remaining depth and whether the score is
/// exact or a bound, since scores from pruned subtrees are only bounds.
pub struct Searcher {
    depth: u32,

    /// The number of nodes searched by the last search (for diagnostics only)
    pub node_count: usize,
    transposition_table: Option<TranspositionTable>,
    rng: StdRng,
}

impl Searcher {
    /// Creates a new `Searcher` with a default-sized transposition table
    pub fn new(depth: u32) -> Self {
        Self::new_with_transposition_table(depth, TranspositionTable::new())
    }

    /// Creates a new `Searcher` with a given transposition table
    pub fn new_with_transposition_table(depth: u32, transposition_table: TranspositionTable) -> Self {
        Self {
            depth: depth.max(1),
            node_count: 0,
            transposition_table: Some(transposition_table),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a new `Searcher` that never caches scores
    pub fn without_transposition_table(depth: u32) -> Self {
        Self {
            depth: depth.max(1),
            node_count: 0,
            transposition_table: None,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seeds the generator used for the random fallback move
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn transposition_table(&self) -> Option<&TranspositionTable> {
        self.transposition_table.as_ref()
    }

    /// Forgets every cached score
    pub fn clear(&mut self) {
        if let Some(table) = self.transposition_table.as_mut() {
            table.clear();
        }
    }

    /// Recommends a column for the side to move
    ///
    /// Returns `None` if the game is over.
    pub fn search(&mut self, position: &Position) -> Option<SearchOutcome> {
        self.search_cancellable(position, &CancellationToken::new())
    }

    /// Recommends a column for the side to move, giving up once `cancel` is set
    ///
    /// Returns `None` if the game is over or the search was cancelled.
    pub fn search_cancellable(
        &mut self,
        position: &Position,
        cancel: &CancellationToken,
    ) -> Option<SearchOutcome> {
        let start = Instant::now();
        self.node_count = 0;

        let order = move_order(position.columns());
        let legal: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&column| position.is_legal_move(column))
            .collect();
        if legal.is_empty() {
            return None;
        }
        let side = position.current_player();

        // check for a win for the side to move on this move
        if let Some(&column) = legal
            .iter()
            .find(|&&column| position.is_winning_move(column, side))
        {
            return Some(self.finish(column, win_score(side), SearchKind::ImmediateWin, start));
        }

        // a single opponent threat can be blocked, more than one can't
        let threats: Vec<usize> = legal
            .iter()
            .copied()
            .filter(|&column| position.is_winning_move(column, side.other()))
            .collect();
        if threats.len() == 1 {
            let mut probe = position.clone();
            let score = match probe.apply_move(threats[0]) {
                Ok(_) => probe.evaluate(),
                Err(_) => position.evaluate(),
            };
            return Some(self.finish(threats[0], score, SearchKind::Block, start));
        }

        let (score, column) = self.alpha_beta_cancellable(position, cancel)?;

        // every line loses, don't resign deterministically
        if score == win_score(side.other()) {
            let column = legal[self.rng.random_range(0..legal.len())];
            return Some(self.finish(column, score, SearchKind::RandomFallback, start));
        }
        Some(self.finish(column, score, SearchKind::AlphaBeta, start))
    }

    /// Runs the full-depth alpha-beta search only, without the immediate win and
    /// block shortcuts
    ///
    /// Returns the root score and the first column achieving it, `None` if the
    /// game is over.
    pub fn alpha_beta(&mut self, position: &Position) -> Option<(i32, usize)> {
        self.node_count = 0;
        self.alpha_beta_cancellable(position, &CancellationToken::new())
    }

    fn alpha_beta_cancellable(
        &mut self,
        position: &Position,
        cancel: &CancellationToken,
    ) -> Option<(i32, usize)> {
        let order = move_order(position.columns());
        // the search probes its own copy, never the caller's position
        let mut position = position.clone();
        let maximizing = position.current_player() == Player::Yellow;

        let (mut alpha, mut beta) = (MIN_SCORE, MAX_SCORE);
        let mut best: Option<(i32, usize)> = None;

        for &column in order.iter() {
            if !position.is_legal_move(column) {
                continue;
            }
            let score = self.probe(&mut position, column, self.depth - 1, alpha, beta, &order, cancel)?;

            let improved = match best {
                None => true,
                Some((best_score, _)) if maximizing => score > best_score,
                Some((best_score, _)) => score < best_score,
            };
            if improved {
                best = Some((score, column));
            }
            if maximizing {
                alpha = alpha.max(score);
            } else {
                beta = beta.min(score);
            }
            if beta <= alpha {
                break;
            }
        }
        best
    }

    // plays `column`, searches the subtree and takes the move back
    #[allow(clippy::too_many_arguments)]
    fn probe(
        &mut self,
        position: &mut Position,
        column: usize,
        depth: u32,
        alpha: i32,
        beta: i32,
        order: &[usize],
        cancel: &CancellationToken,
    ) -> Option<i32> {
        let moves_played = position.moves_played();
        let applied = position.apply_move(column);
        debug_assert!(applied.is_ok(), "search played illegal column {}", column);
        if applied.is_err() {
            return None;
        }

        let score = self.minimax(position, depth, alpha, beta, order, cancel);

        let undone = position.undo_move();
        debug_assert_eq!(undone, Ok(column));
        debug_assert_eq!(position.moves_played(), moves_played);
        score
    }

    /// Performs game tree search
    ///
    /// Returns the score of the position, or `None` if the search was cancelled
    fn minimax(
        &mut self,
        position: &mut Position,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        order: &[usize],
        cancel: &CancellationToken,
    ) -> Option<i32> {
        self.node_count += 1;
        if cancel.is_cancelled() {
            return None;
        }

        if depth == 0 || position.is_over() {
            return Some(position.evaluate());
        }

        // try to fetch the score or a bound of it from the transposition table
        let key = match self.transposition_table {
            Some(_) => position.fingerprint(),
            None => None,
        };
        let (alpha_orig, beta_orig) = (alpha, beta);
        if let (Some(table), Some(key)) = (self.transposition_table.as_mut(), key) {
            if let Some(entry) = table.get(key, depth) {
                match entry.bound {
                    Bound::Exact => return Some(entry.score),
                    Bound::Lower => alpha = alpha.max(entry.score),
                    Bound::Upper => beta = beta.min(entry.score),
                    Bound::Empty => {}
                }
                if beta <= alpha {
                    return Some(entry.score);
                }
            }
        }

        let maximizing = position.current_player() == Player::Yellow;
        let mut best = if maximizing { MIN_SCORE } else { MAX_SCORE };

        for &column in order.iter() {
            if !position.is_legal_move(column) {
                continue;
            }
            let score = self.probe(position, column, depth - 1, alpha, beta, order, cancel)?;

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }
            // the other player will never allow this branch
            if beta <= alpha {
                break;
            }
        }

        if let (Some(table), Some(key)) = (self.transposition_table.as_mut(), key) {
            let bound = if best <= alpha_orig {
                Bound::Upper
            } else if best >= beta_orig {
                Bound::Lower
            } else {
                Bound::Exact
            };
            table.set(key, best, depth, bound);
        }
        Some(best)
    }

    fn finish(&self, column: usize, score: i32, kind: SearchKind, start: Instant) -> SearchOutcome {
        debug!(
            column,
            score,
            nodes = self.node_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            ?kind,
            "search finished"
        );
        SearchOutcome {
            column,
            score,
            kind,
            nodes: self.node_count,
        }
    }
}
