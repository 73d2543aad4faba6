//! Statistics over many games of uniformly random moves

use indicatif::ProgressBar;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use tracing::info;

use std::time::Instant;

use crate::{
    config::BoardConfig,
    position::{GameStatus, Player, Position},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulationReport {
    pub red_wins: usize,
    pub yellow_wins: usize,
    pub draws: usize,
    pub games: usize,
    pub total_moves: usize,
}

impl SimulationReport {
    pub fn average_moves(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.total_moves as f64 / self.games as f64
    }

    fn single(status: GameStatus, moves: usize) -> Self {
        let mut report = Self {
            games: 1,
            total_moves: moves,
            ..Self::default()
        };
        match status {
            GameStatus::Won(Player::Red) => report.red_wins = 1,
            GameStatus::Won(Player::Yellow) => report.yellow_wins = 1,
            _ => report.draws = 1,
        }
        report
    }

    fn merge(self, other: Self) -> Self {
        Self {
            red_wins: self.red_wins + other.red_wins,
            yellow_wins: self.yellow_wins + other.yellow_wins,
            draws: self.draws + other.draws,
            games: self.games + other.games,
            total_moves: self.total_moves + other.total_moves,
        }
    }
}

/// Plays one game of random legal moves to the end
pub fn play_random_game(position: &mut Position, rng: &mut StdRng) -> GameStatus {
    position.init_new_game();
    while !position.is_over() {
        let legal = position.legal_moves();
        let column = legal[rng.random_range(0..legal.len())];
        // the column was just checked to be legal
        if position.apply_move(column).is_err() {
            break;
        }
    }
    position.status()
}

/// Plays `games` random games in parallel
///
/// Game `i` uses its own generator seeded from `seed` and `i`, so a report only
/// depends on its arguments.
pub fn simulate(
    config: BoardConfig,
    games: usize,
    seed: u64,
    progress: Option<&ProgressBar>,
) -> SimulationReport {
    let start = Instant::now();

    let report = (0..games)
        .into_par_iter()
        .map_init(
            || Position::new(config),
            |position, game| {
                let mut rng = StdRng::seed_from_u64(seed ^ (game as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
                let status = play_random_game(position, &mut rng);
                if let Some(progress) = progress {
                    progress.inc(1);
                }
                SimulationReport::single(status, position.moves_played())
            },
        )
        .reduce(SimulationReport::default, SimulationReport::merge);

    info!(
        games,
        red_wins = report.red_wins,
        yellow_wins = report.yellow_wins,
        draws = report.draws,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "simulation complete"
    );
    report
}
