//! Drives a bot for the session without blocking the caller
//!
//! The engine moves through `Idle -> Searching -> Ready` once per decision. The
//! full search runs on a worker thread that owns the bot (and with it the
//! transposition table) and works on its own copy of the position, so the live
//! game is never shared. Cheap bots run inline and are ready immediately.

use tracing::{trace, warn};

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::{
    bot::{bot_for, BotKind, MoveSelector},
    config::{BoardConfig, EngineConfig},
    position::Position,
    search::CancellationToken,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Searching,
    Ready,
}

enum Request {
    Search {
        position: Position,
        generation: u64,
        cancel: CancellationToken,
    },
    Reset,
    Shutdown,
}

struct Reply {
    generation: u64,
    column: Option<usize>,
}

enum Runner {
    Inline(Box<dyn MoveSelector>),
    Background {
        requests: Sender<Request>,
        replies: Receiver<Reply>,
        handle: Option<JoinHandle<()>>,
    },
}

pub struct Engine {
    runner: Runner,
    name: String,
    phase: Phase,
    ready: Option<usize>,
    // bumped on every start and cancel, replies from older generations are stale
    generation: u64,
    cancel: CancellationToken,
}

impl Engine {
    /// Runs `bot` synchronously inside [`Engine::start`]
    pub fn inline(bot: Box<dyn MoveSelector>) -> Self {
        let name = bot.name().to_string();
        Self::with_runner(Runner::Inline(bot), name)
    }

    /// Runs `bot` on a dedicated worker thread
    pub fn background(bot: Box<dyn MoveSelector>) -> Self {
        let name = bot.name().to_string();
        let (request_tx, request_rx) = channel();
        let (reply_tx, reply_rx) = channel();

        let handle = thread::spawn(move || worker(bot, request_rx, reply_tx));

        Self::with_runner(
            Runner::Background {
                requests: request_tx,
                replies: reply_rx,
                handle: Some(handle),
            },
            name,
        )
    }

    /// The engine for a board: the full search in the background on the
    /// canonical board, the heuristic bot inline otherwise
    pub fn for_config(board: &BoardConfig, config: &EngineConfig) -> Self {
        let bot = bot_for(board, config);
        match BotKind::for_board(board) {
            BotKind::Minimax => Self::background(bot),
            BotKind::Heuristic => Self::inline(bot),
        }
    }

    fn with_runner(runner: Runner, name: String) -> Self {
        Self {
            runner,
            name,
            phase: Phase::Idle,
            ready: None,
            generation: 0,
            cancel: CancellationToken::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_background(&self) -> bool {
        matches!(self.runner, Runner::Background { .. })
    }

    /// Starts choosing a move for the side to move in `position`
    ///
    /// Does nothing unless the engine is idle.
    pub fn start(&mut self, position: &Position) {
        if self.phase != Phase::Idle {
            return;
        }
        self.generation += 1;
        self.cancel = CancellationToken::new();

        match &mut self.runner {
            Runner::Inline(bot) => {
                self.ready = bot.select_move(position, &self.cancel);
                self.phase = if self.ready.is_some() {
                    Phase::Ready
                } else {
                    Phase::Idle
                };
            }
            Runner::Background { requests, .. } => {
                let request = Request::Search {
                    position: position.clone(),
                    generation: self.generation,
                    cancel: self.cancel.clone(),
                };
                if requests.send(request).is_err() {
                    warn!(engine = %self.name, "search worker is gone, no move will be produced");
                    return;
                }
                self.phase = Phase::Searching;
            }
        }
    }

    pub fn phase(&mut self) -> Phase {
        self.refresh();
        self.phase
    }

    /// Takes the chosen column if the engine is ready, returning to idle
    pub fn poll_move(&mut self) -> Option<usize> {
        self.refresh();
        if self.phase != Phase::Ready {
            return None;
        }
        self.phase = Phase::Idle;
        self.ready.take()
    }

    /// Stops the running search; its result will never be reported
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.generation += 1;
        self.phase = Phase::Idle;
        self.ready = None;
    }

    /// Cancels and makes the bot forget earlier games
    pub fn reset(&mut self) {
        self.cancel();
        match &mut self.runner {
            Runner::Inline(bot) => bot.reset(),
            Runner::Background { requests, .. } => {
                let _ = requests.send(Request::Reset);
            }
        }
    }

    fn refresh(&mut self) {
        if self.phase != Phase::Searching {
            return;
        }
        let replies = match &self.runner {
            Runner::Background { replies, .. } => replies,
            Runner::Inline(_) => return,
        };
        loop {
            match replies.try_recv() {
                Ok(reply) if reply.generation == self.generation => {
                    self.ready = reply.column;
                    self.phase = if reply.column.is_some() {
                        Phase::Ready
                    } else {
                        Phase::Idle
                    };
                    return;
                }
                Ok(reply) => {
                    trace!(generation = reply.generation, "discarding stale search result");
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    warn!(engine = %self.name, "search worker stopped unexpectedly");
                    self.phase = Phase::Idle;
                    return;
                }
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Runner::Background {
            requests, handle, ..
        } = &mut self.runner
        {
            let _ = requests.send(Request::Shutdown);
            if let Some(handle) = handle.take() {
                let _ = handle.join();
            }
        }
    }
}

fn worker(mut bot: Box<dyn MoveSelector>, requests: Receiver<Request>, replies: Sender<Reply>) {
    for request in requests.iter() {
        match request {
            Request::Search {
                position,
                generation,
                cancel,
            } => {
                if cancel.is_cancelled() {
                    continue;
                }
                let column = bot.select_move(&position, &cancel);
                if cancel.is_cancelled() {
                    continue;
                }
                if replies.send(Reply { generation, column }).is_err() {
                    break;
                }
            }
            Request::Reset => bot.reset(),
            Request::Shutdown => break,
        }
    }
}
