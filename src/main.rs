use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use std::io::{stdin, stdout, Stdin, Write};
use std::thread;
use std::time::Duration;

use connect_n::{
    simulator::simulate, BoardConfig, EngineConfig, GameMode, GameSession, GameStatus, Player,
    CANONICAL_COLUMNS, CANONICAL_ROWS, CANONICAL_RUN_LENGTH,
};

mod terminal;

const SIMULATED_GAMES: usize = 100_000;

fn main() -> Result<()> {
    // logs go to stderr so they don't garble the board
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let stdin = stdin();

    println!("Welcome to Connect N\n");

    let rows = prompt_number(&stdin, "Number of rows", CANONICAL_ROWS)?;
    let columns = prompt_number(&stdin, "Number of columns", CANONICAL_COLUMNS)?;
    let run_length = prompt_number(&stdin, "Tokens in a row needed to win", CANONICAL_RUN_LENGTH)?;

    let mut session = GameSession::new(
        BoardConfig::clamped(rows, columns, run_length),
        EngineConfig::default(),
    );

    // choose the computer opponent
    loop {
        let mut buffer = String::new();
        print!("Play against the computer? y/n: ");
        stdout().flush().expect("failed to flush to stdout!");
        stdin.read_line(&mut buffer)?;
        match buffer.to_lowercase().chars().next() {
            Some(_letter @ 'y') => {
                session.set_mode(GameMode::VersusComputer);
                break;
            }
            Some(_letter @ 'n') => break,
            _ => println!("Unknown answer given"),
        }
    }

    println!("Enter a column to drop a token, 'u' to undo, 'n' for a new game, 's' to simulate random games, 'q' to quit\n");

    // game loop
    loop {
        terminal::display(&session).expect("Failed to draw board!");
        print_status(&session);

        match session.status() {
            GameStatus::Playing if session.is_computer_turn() => {
                println!("Computer is thinking...");
                loop {
                    if session.poll_bot_move().is_some() || !session.is_computer_turn() {
                        break;
                    }
                    thread::sleep(Duration::from_millis(50));
                }
                continue;
            }
            GameStatus::Playing => print!("Move input > "),
            _ => print!("'n' for a new game, 'u' to undo, 'q' to quit > "),
        }
        stdout().flush().expect("Failed to flush to stdout!");

        let mut input_str = String::new();
        if stdin.read_line(&mut input_str)? == 0 {
            break;
        }
        let input = input_str.trim().to_lowercase();

        match input.as_str() {
            "q" => break,
            "u" => {
                if session.request_undo() == 0 {
                    println!("No moves to undo");
                }
            }
            "n" => session.restart(),
            "s" => run_simulation(session.board_config()),
            _ => match parse_column(&input) {
                Some(column) if column >= 1 => {
                    if session.request_move(column - 1).is_none() {
                        println!("Invalid move: {}", input);
                    }
                }
                _ => println!("Invalid number: {}", input),
            },
        }
    }
    Ok(())
}

fn print_status(session: &GameSession) {
    let tally = session.tally();
    println!(
        "Moves played: {}  Red: {}  Yellow: {}  Draws: {}  Games: {}",
        session.moves_played(),
        tally.red_wins,
        tally.yellow_wins,
        tally.draws,
        tally.games_played
    );
    match session.status() {
        GameStatus::Playing => println!("{} to move", session.current_player().name()),
        GameStatus::Won(player) if session.mode() == GameMode::VersusComputer => {
            if player == session.computer_player() {
                println!("The computer wins!");
            } else {
                println!("You win!");
            }
        }
        GameStatus::Won(Player::Red) => println!("Red wins!"),
        GameStatus::Won(Player::Yellow) => println!("Yellow wins!"),
        GameStatus::Drawn => println!("Draw!"),
    }
}

// columns past 9 are labelled with letters
fn parse_column(input: &str) -> Option<usize> {
    if let Ok(column) = input.parse::<usize>() {
        return Some(column);
    }
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) => letter.to_digit(36).map(|c| c as usize),
        _ => None,
    }
}

fn prompt_number(stdin: &Stdin, question: &str, default: usize) -> Result<usize> {
    loop {
        let mut buffer = String::new();
        print!("{} [{}]: ", question, default);
        stdout().flush().expect("failed to flush to stdout!");
        stdin.read_line(&mut buffer)?;

        let answer = buffer.trim();
        if answer.is_empty() {
            return Ok(default);
        }
        match answer.parse::<usize>() {
            Ok(number) => return Ok(number),
            Err(_) => println!("Invalid number: {}", answer),
        }
    }
}

fn run_simulation(config: BoardConfig) {
    let progress = ProgressBar::new(SIMULATED_GAMES as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("Simulating random games: {bar:40.cyan/blue} {pos}/{len} ~{eta} remaining")
            .progress_chars("█▓▒░  "),
    );

    let report = simulate(config, SIMULATED_GAMES, rand::random(), Some(&progress));
    progress.finish();

    println!("   red score: {}", report.red_wins);
    println!("yellow score: {}", report.yellow_wins);
    println!("        draw: {}", report.draws);
    println!(" total games: {}", report.games);
    println!("avg moves till game finish: {:.2}", report.average_moves());
}
