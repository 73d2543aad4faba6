#[cfg(test)]
pub mod test {
    use anyhow::{anyhow, Result};
    use proptest::prelude::*;

    use std::collections::HashMap;
    use std::thread;
    use std::time::{Duration, Instant};

    use crate::{
        engine::Phase,
        position::{MoveResult, EVALUATION_UTILITY, MAX_SCORE, MIN_SCORE},
        search::{SearchKind, Searcher},
        transposition_table::TranspositionTable,
        BoardConfig, EngineConfig, GameError, GameMode, GameSession, GameStatus, Player, Position,
    };

    const DRAWN_GAME: &str = "257771314744647214154617633623313656555222";

    // plain minimax over every legal column, no pruning and no caching
    fn reference_minimax(position: &mut Position, depth: u32) -> i32 {
        if depth == 0 || position.is_over() {
            return position.evaluate();
        }
        let maximizing = position.current_player() == Player::Yellow;
        let mut best = if maximizing { MIN_SCORE } else { MAX_SCORE };
        for column in position.legal_moves() {
            position.apply_move(column).unwrap();
            let score = reference_minimax(position, depth - 1);
            position.undo_move().unwrap();
            best = if maximizing { best.max(score) } else { best.min(score) };
        }
        best
    }

    fn wait_for_bot(session: &mut GameSession) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(30);
        while Instant::now() < deadline {
            if session.poll_bot_move().is_some() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(anyhow!("the computer never moved"))
    }

    fn small_engine() -> EngineConfig {
        EngineConfig::default()
            .with_search_depth(4)
            .with_table_capacity(1 << 12)
            .with_seed(7)
    }

    #[test]
    pub fn vertical_win() -> Result<()> {
        let position = Position::from_moves("4141414")?;
        assert_eq!(position.status(), GameStatus::Won(Player::Red));
        assert_eq!(position.winning_cells(), &[(2, 3), (3, 3), (4, 3), (5, 3)]);
        assert_eq!(position.evaluate(), MIN_SCORE);
        assert!(!position.is_legal_move(0));
        Ok(())
    }

    #[test]
    pub fn horizontal_and_diagonal_wins() -> Result<()> {
        let position = Position::from_moves("1122334")?;
        assert_eq!(position.winner(), Some(Player::Red));
        assert_eq!(position.winning_cells(), &[(5, 0), (5, 1), (5, 2), (5, 3)]);

        let position = Position::from_moves("12233434744")?;
        assert_eq!(position.winner(), Some(Player::Red));
        assert_eq!(position.winning_cells(), &[(5, 0), (4, 1), (3, 2), (2, 3)]);
        Ok(())
    }

    #[test]
    pub fn full_board_is_a_draw() -> Result<()> {
        let mut position = Position::from_moves(&DRAWN_GAME[..41])?;
        assert_eq!(position.status(), GameStatus::Playing);
        assert_eq!(position.legal_moves(), vec![1]);

        let outcome = position.apply_move(1)?;
        assert_eq!(outcome.result, MoveResult::Draw);
        assert_eq!(outcome.row, 0);
        assert!(position.ended_in_draw());
        assert!(position.winning_cells().is_empty());
        assert!(position.legal_moves().is_empty());
        assert_eq!(position.evaluate(), 0);
        assert_eq!(position.apply_move(1), Err(GameError::GameOver));

        // taking the last move back resumes the game
        assert_eq!(position.undo_move(), Ok(1));
        assert_eq!(position.status(), GameStatus::Playing);
        Ok(())
    }

    #[test]
    pub fn rejected_moves_change_nothing() -> Result<()> {
        let mut position = Position::from_moves("111111")?;
        let before = position.clone();
        assert_eq!(
            position.apply_move(0),
            Err(GameError::InvalidMove { column: 0 })
        );
        assert_eq!(
            position.apply_move(7),
            Err(GameError::InvalidMove { column: 7 })
        );
        assert_eq!(position, before);

        let mut empty = Position::new(BoardConfig::canonical());
        assert_eq!(empty.undo_move(), Err(GameError::EmptyHistory));
        Ok(())
    }

    #[test]
    pub fn fingerprints_tell_boards_apart() -> Result<()> {
        // every board reachable in five moves
        let mut seen: HashMap<u64, String> = HashMap::new();
        let mut frontier = vec![Position::new(BoardConfig::canonical())];
        for _ in 0..5 {
            let mut next = Vec::new();
            for position in frontier.iter() {
                for column in position.legal_moves() {
                    let mut child = position.clone();
                    child.apply_move(column)?;
                    next.push(child);
                }
            }
            for position in next.iter() {
                let key = position.fingerprint().ok_or_else(|| anyhow!("no fingerprint"))?;
                let board = position.to_string();
                let previous = seen.entry(key).or_insert_with(|| board.clone());
                assert_eq!(*previous, board, "fingerprint {:#x} is shared", key);
            }
            frontier = next;
        }
        Ok(())
    }

    #[test]
    pub fn large_boards_have_no_fingerprint() -> Result<()> {
        let mut position = Position::new(BoardConfig::new(9, 11, 5)?);
        position.apply_move(5)?;
        assert_eq!(position.fingerprint(), None);
        assert_eq!(position.evaluate(), EVALUATION_UTILITY);

        // the search still works, just uncached
        let mut searcher = Searcher::new_with_transposition_table(3, TranspositionTable::with_capacity(64))
            .with_seed(1);
        let outcome = searcher.search(&position).ok_or_else(|| anyhow!("no move"))?;
        assert!(position.is_legal_move(outcome.column));
        assert_eq!(searcher.transposition_table().map(|table| table.hits()), Some(0));
        Ok(())
    }

    #[test]
    pub fn immediate_win_skips_the_search() -> Result<()> {
        let position = Position::from_moves("172737")?;
        let outcome = Searcher::without_transposition_table(6)
            .search(&position)
            .ok_or_else(|| anyhow!("no move"))?;
        assert_eq!(outcome.column, 3);
        assert_eq!(outcome.kind, SearchKind::ImmediateWin);
        assert_eq!(outcome.score, MIN_SCORE);
        assert_eq!(outcome.nodes, 0);
        Ok(())
    }

    #[test]
    pub fn single_threat_is_blocked() -> Result<()> {
        let position = Position::from_moves("11223")?;
        let outcome = Searcher::without_transposition_table(6)
            .search(&position)
            .ok_or_else(|| anyhow!("no move"))?;
        assert_eq!(outcome.column, 3);
        assert_eq!(outcome.kind, SearchKind::Block);
        assert_eq!(outcome.nodes, 0);
        Ok(())
    }

    #[test]
    pub fn lost_position_plays_a_random_legal_move() -> Result<()> {
        // red threatens both ends of the bottom row
        let position = Position::from_moves("22334")?;
        let mut searcher = Searcher::without_transposition_table(3).with_seed(9);
        let outcome = searcher.search(&position).ok_or_else(|| anyhow!("no move"))?;
        assert_eq!(outcome.kind, SearchKind::RandomFallback);
        assert_eq!(outcome.score, MIN_SCORE);
        assert!(position.is_legal_move(outcome.column));
        Ok(())
    }

    #[test]
    pub fn alpha_beta_matches_plain_minimax() -> Result<()> {
        for moves in ["", "4", "44", "4453", "334455", "3345567", "172737"].iter() {
            let position = Position::from_moves(moves)?;
            for depth in 1..=5 {
                let expected = reference_minimax(&mut position.clone(), depth);

                let mut uncached = Searcher::without_transposition_table(depth);
                let (score, column) = uncached
                    .alpha_beta(&position)
                    .ok_or_else(|| anyhow!("no move"))?;
                assert_eq!(score, expected, "moves {:?} depth {}", moves, depth);
                assert!(position.is_legal_move(column));

                let mut cached = Searcher::new_with_transposition_table(
                    depth,
                    TranspositionTable::with_capacity(1 << 14),
                );
                let (score, _) = cached
                    .alpha_beta(&position)
                    .ok_or_else(|| anyhow!("no move"))?;
                assert_eq!(score, expected, "cached, moves {:?} depth {}", moves, depth);
            }
        }
        Ok(())
    }

    #[test]
    pub fn search_leaves_the_position_alone() -> Result<()> {
        let position = Position::from_moves("4453")?;
        let before = position.clone();
        let mut searcher =
            Searcher::new_with_transposition_table(5, TranspositionTable::with_capacity(1 << 12));
        searcher.search(&position);
        assert_eq!(position, before);
        assert!(searcher.node_count > 0);
        Ok(())
    }

    #[test]
    pub fn two_player_tally_follows_undo() -> Result<()> {
        let mut session = GameSession::new(BoardConfig::canonical(), small_engine());
        for &column in [0, 1, 0, 1, 0, 1].iter() {
            assert!(session.request_move(column).is_some());
        }
        let outcome = session
            .request_move(0)
            .ok_or_else(|| anyhow!("winning move refused"))?;
        assert_eq!(outcome.result, MoveResult::Win);
        assert_eq!(session.status(), GameStatus::Won(Player::Red));
        assert_eq!(session.tally().red_wins, 1);
        assert_eq!(session.tally().games_played, 1);

        // no moves once the game is over
        assert!(session.request_move(2).is_none());

        assert_eq!(session.request_undo(), 1);
        assert_eq!(session.status(), GameStatus::Playing);
        assert_eq!(session.tally().red_wins, 0);
        assert_eq!(session.tally().games_played, 0);

        // illegal columns are ignored
        assert!(session.request_move(9).is_none());
        assert_eq!(session.moves_played(), 6);
        Ok(())
    }

    #[test]
    pub fn restart_keeps_tally_and_new_game_clears_it() -> Result<()> {
        let mut session = GameSession::new(BoardConfig::clamped(4, 4, 1), small_engine());
        session.request_move(2);
        assert_eq!(session.status(), GameStatus::Won(Player::Red));

        session.restart();
        assert_eq!(session.moves_played(), 0);
        assert_eq!(session.tally().red_wins, 1);

        session.new_game(0, 50, 9);
        let config = session.board_config();
        assert_eq!(
            (config.rows(), config.columns(), config.run_length()),
            (1, 11, 6)
        );
        assert_eq!(session.tally().games_played, 0);
        Ok(())
    }

    #[test]
    pub fn computer_answers_and_undo_takes_back_both_moves() -> Result<()> {
        let mut session = GameSession::new(BoardConfig::canonical(), small_engine());
        session.set_mode(GameMode::VersusComputer);
        assert_eq!(session.computer_player(), Player::Yellow);

        session
            .request_move(3)
            .ok_or_else(|| anyhow!("human move refused"))?;
        assert!(session.is_computer_turn());
        // the human can't move for the computer
        assert!(session.request_move(0).is_none());

        wait_for_bot(&mut session)?;
        assert_eq!(session.moves_played(), 2);
        assert_eq!(session.current_player(), Player::Red);
        assert_eq!(session.engine_phase(), Phase::Idle);

        assert_eq!(session.request_undo(), 2);
        assert_eq!(session.moves_played(), 0);
        assert_eq!(session.request_undo(), 0);
        Ok(())
    }

    #[test]
    pub fn small_boards_answer_on_the_same_poll() -> Result<()> {
        let mut session = GameSession::new(BoardConfig::clamped(5, 5, 3), small_engine());
        session.set_mode(GameMode::VersusComputer);

        session.request_move(0);
        let outcome = session
            .poll_bot_move()
            .ok_or_else(|| anyhow!("inline engine was not ready"))?;
        assert_eq!(outcome.player, Player::Yellow);
        assert_eq!(session.moves_played(), 2);
        assert!(!session.is_computer_turn());
        Ok(())
    }

    #[test]
    pub fn changing_mode_cancels_the_search() -> Result<()> {
        let config = EngineConfig::default()
            .with_search_depth(9)
            .with_table_capacity(1 << 12)
            .with_seed(3);
        let mut session = GameSession::new(BoardConfig::canonical(), config);
        session.set_mode(GameMode::VersusComputer);
        session.request_move(3);
        session.poll_bot_move();

        session.set_mode(GameMode::TwoPlayer);
        assert_eq!(session.engine_phase(), Phase::Idle);
        let played = session.moves_played();
        assert!(session.request_move(3).is_some());
        assert_eq!(session.moves_played(), played + 1);
        // nothing arrives from the cancelled search
        thread::sleep(Duration::from_millis(20));
        assert!(session.poll_bot_move().is_none());
        assert_eq!(session.moves_played(), played + 1);
        Ok(())
    }

    #[test]
    pub fn auto_drop_plays_to_the_end() -> Result<()> {
        let config = EngineConfig::default().with_seed(21);
        let mut session = GameSession::new(BoardConfig::clamped(5, 6, 4), config);
        session.set_mode(GameMode::AutoDrop);
        assert!(session.request_move(0).is_none());

        let mut moves = 0;
        while session.poll_bot_move().is_some() {
            moves += 1;
        }
        assert!(session.position().is_over());
        assert_eq!(moves, session.moves_played());
        assert_eq!(session.tally().games_played, 1);
        Ok(())
    }

    proptest! {
        #[test]
        fn apply_then_undo_restores_the_position(
            rows in 1usize..=8,
            columns in 1usize..=8,
            run_length in 1usize..=6,
            moves in proptest::collection::vec(0usize..8, 0..64),
        ) {
            let mut position = Position::new(BoardConfig::clamped(rows, columns, run_length));
            for column in moves {
                if !position.is_legal_move(column) {
                    continue;
                }
                let before = position.clone();
                let outcome = position.apply_move(column).unwrap();
                prop_assert_eq!(outcome.column, column);
                prop_assert_eq!(position.fingerprint(), position.fingerprint_from_scratch());
                prop_assert_eq!(position.heuristic_evaluation(), position.evaluation_from_scratch());

                let mut undone = position.clone();
                prop_assert_eq!(undone.undo_move(), Ok(column));
                prop_assert_eq!(&undone, &before);
            }
        }

        #[test]
        fn recommended_columns_are_legal(moves in proptest::collection::vec(0usize..7, 0..20)) {
            let mut position = Position::new(BoardConfig::canonical());
            for column in moves {
                if position.is_legal_move(column) {
                    position.apply_move(column).unwrap();
                }
            }
            let mut searcher = Searcher::without_transposition_table(2).with_seed(0);
            match searcher.search(&position) {
                Some(outcome) => prop_assert!(position.is_legal_move(outcome.column)),
                None => prop_assert!(position.is_over()),
            }
        }
    }
}
