/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt, io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc,
    },
};

use anyhow::{Context, Result};
use clap::Parser;
use threadpool::ThreadPool;

use crate::{
    board::{
        movegen::{generate_moves, has_legal_move},
        perft,
    },
    evaluate, Color, EngineCommand, EvalCallback, Move, MoveList, Position, Search, SearchParams,
};

/// The result of a completed self-play game.
///
/// Discriminants match the classic host convention: `0` draw, `1` White win,
/// `2` Black win, `-1` for a game abandoned at the move cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum GameOutcome {
    Exceeded = -1,
    Draw = 0,
    WhiteWin = 1,
    BlackWin = 2,
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exceeded => "unfinished (move cap exceeded)",
            Self::Draw => "draw",
            Self::WhiteWin => "white wins",
            Self::BlackWin => "black wins",
        };
        write!(f, "{s}")
    }
}

/// Plays a full game of the engine against itself, without any interface.
///
/// Each side's evaluation callback is selected by whose turn it is before
/// that side's search begins, so hosts can pit two evaluators against each
/// other. `fen` of `None` (or `"startpos"`) starts from the standard initial
/// arrangement. The game ends on a draw by rule, checkmate, stalemate, or
/// after `max_moves` half-moves.
pub fn run_headless_game(
    white_eval: EvalCallback,
    black_eval: EvalCallback,
    depth: u8,
    fen: Option<&str>,
    max_moves: u32,
) -> Result<GameOutcome> {
    crate::init();

    let mut position = match fen {
        None | Some("startpos") => Position::default(),
        Some(fen) => Position::from_fen(fen)?,
    };

    for _ in 0..max_moves {
        if position.is_draw() {
            return Ok(GameOutcome::Draw);
        }

        if !has_legal_move(&mut position) {
            return Ok(if position.in_check() {
                match position.side_to_move() {
                    Color::White => GameOutcome::BlackWin,
                    Color::Black => GameOutcome::WhiteWin,
                }
            } else {
                GameOutcome::Draw
            });
        }

        let eval = if position.side_to_move().is_white() {
            white_eval
        } else {
            black_eval
        };

        let result = Search::new(SearchParams { depth, eval }).start(&mut position);

        // `has_legal_move` succeeded, so a missing bestmove means the search
        // was interrupted; treat the game as abandoned rather than guessing
        let Some(best) = result.bestmove else {
            return Ok(GameOutcome::Draw);
        };

        position.make_move(best);
    }

    Ok(GameOutcome::Exceeded)
}

/// A stateful engine wrapping a [`Position`] and driving searches from an
/// interactive command loop.
pub struct Engine {
    /// The current state of the chess board, as known to the engine.
    ///
    /// This is modified whenever moves are played or new positions are given.
    position: Position,

    /// Default depth for `search` and `selfplay` commands.
    depth: u8,

    /// Evaluation callback handed to searches.
    eval: EvalCallback,

    /// Threadpool for executing tasks in parallel.
    ///
    /// A thread is spawned for handling command-line input, and searches run
    /// on workers over a private copy of the position.
    pool: ThreadPool,

    /// One half of a channel, responsible for sending commands to the engine to execute.
    sender: Sender<EngineCommand>,

    /// One half of a channel, responsible for receiving commands for the engine to execute.
    receiver: Receiver<EngineCommand>,

    /// Set while a search is in progress; cleared to interrupt it.
    is_searching: Arc<AtomicBool>,
}

impl Engine {
    /// Default search depth for the interactive loop.
    const DEFAULT_DEPTH: u8 = 5;

    /// Constructs a new [`Engine`] on the standard starting position, using
    /// the provided evaluation callback for all searches.
    pub fn with_eval(eval: EvalCallback) -> Self {
        // Construct a channel for communication and threadpool for parallel tasks
        let (sender, receiver) = mpsc::channel();
        let pool = ThreadPool::with_name(
            format!("{} input / search thread(s)", env!("CARGO_PKG_NAME")),
            num_cpus::get(),
        );

        Self {
            position: Position::default(),
            depth: Self::DEFAULT_DEPTH,
            eval,
            pool,
            sender,
            receiver,
            is_searching: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Constructs a new [`Engine`] using the built-in material evaluator.
    pub fn new() -> Self {
        Self::with_eval(crate::material_eval)
    }

    /// Returns the name of this engine.
    pub fn name(&self) -> &'static str {
        env!("CARGO_PKG_NAME")
    }

    /// Returns the version of this engine.
    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Enqueues a command for the engine to execute.
    pub fn send_command(&self, command: EngineCommand) -> Result<()> {
        self.sender
            .send(command)
            .context("Failed to send command to engine")
    }

    /// Runs the engine's main event loop until a `quit` command arrives.
    pub fn run(mut self) -> Result<()> {
        // Build the attack tables before the first search needs them
        crate::init();

        // Spawn a separate thread for handling user input
        let sender = self.sender.clone();
        self.pool.execute(|| {
            if let Err(err) = input_handler(sender) {
                eprintln!("{err}");
            }
        });

        // Loop on user input
        while let Ok(cmd) = self.receiver.recv() {
            match cmd {
                EngineCommand::Depth { depth } => self.depth = depth,

                EngineCommand::Display => println!("{:?}", self.position),

                EngineCommand::Eval => println!("{}", evaluate(&self.position, self.eval)),

                EngineCommand::Fen => println!("{}", self.position.to_fen()),

                EngineCommand::MakeMove { mv_string } => {
                    match Move::from_uci(&self.position, &mv_string) {
                        Ok(mv) => self.position.make_move(mv),
                        Err(err) => eprintln!("{err}"),
                    }
                }

                EngineCommand::Moves => self.print_legal_moves(),

                EngineCommand::Perft { depth, split } => {
                    if split {
                        perft::print_perft(&mut self.position, depth);
                    } else {
                        println!("{}", perft::perft(&mut self.position, depth));
                    }
                }

                EngineCommand::Position { args } => {
                    if let Err(err) = self.set_position(&args) {
                        eprintln!("{err}");
                    }
                }

                EngineCommand::Search { depth } => self.start_search(depth.unwrap_or(self.depth)),

                EngineCommand::Selfplay { max_moves } => {
                    let fen = self.position.to_fen();
                    match run_headless_game(self.eval, self.eval, self.depth, Some(&fen), max_moves)
                    {
                        Ok(outcome) => println!("{outcome}"),
                        Err(err) => eprintln!("{err}"),
                    }
                }

                EngineCommand::Stop => self.is_searching.store(false, Ordering::Relaxed),

                // Exit the loop so the engine can quit
                EngineCommand::Quit => break,
            }
        }

        // Interrupt any in-flight search; workers die with the process.
        // The input thread may still be blocked on stdin, so joining the
        // pool here would hang.
        self.is_searching.store(false, Ordering::Relaxed);

        Ok(())
    }

    /// Parses the arguments of a `position` command: a FEN or `startpos`,
    /// optionally followed by `moves <move>...`.
    fn set_position(&mut self, args: &[String]) -> Result<()> {
        let moves_at = args
            .iter()
            .position(|arg| arg == "moves")
            .unwrap_or(args.len());
        let (placement, moves) = args.split_at(moves_at);

        let mut position = match placement.first().map(String::as_str) {
            None | Some("startpos") => Position::default(),
            Some("fen") => Position::from_fen(&placement[1..].join(" "))?,
            Some(_) => Position::from_fen(&placement.join(" "))?,
        };

        // The first token of `moves` is the "moves" keyword itself
        for uci in moves.iter().skip(1) {
            let mv = Move::from_uci(&position, uci)?;
            position.make_move(mv);
        }

        self.position = position;
        Ok(())
    }

    /// Prints every legal move in the current position.
    fn print_legal_moves(&mut self) {
        let mut moves = MoveList::new();
        generate_moves(&self.position, &mut moves);

        let us = self.position.side_to_move();
        let mut legal = Vec::with_capacity(moves.len());

        for mv in moves {
            self.position.make_move(mv);
            if !self.position.is_in_check(us) {
                legal.push(mv.to_uci());
            }
            self.position.undo_move(mv);
        }

        legal.sort();
        println!("{}: {}", legal.len(), legal.join(" "));
    }

    /// Launches a search on a worker thread over a private copy of the
    /// current position, printing the best move when it concludes.
    fn start_search(&mut self, depth: u8) {
        if self.is_searching.swap(true, Ordering::Relaxed) {
            eprintln!("A search is already in progress");
            return;
        }

        // The search owns a copy, so the engine's position stays visible
        // (and mutable) while the worker runs
        let mut position = self.position.clone();
        let eval = self.eval;
        let is_searching = Arc::clone(&self.is_searching);

        self.pool.execute(move || {
            let params = SearchParams { depth, eval };
            let result =
                Search::with_stop_flag(params, Arc::clone(&is_searching)).start(&mut position);

            match result.bestmove {
                Some(mv) => println!(
                    "bestmove {mv} (depth {} score {} nodes {})",
                    result.depth, result.score, result.nodes
                ),
                None => println!("no legal moves (score {})", result.score),
            }

            is_searching.store(false, Ordering::Relaxed);
        });
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads lines from stdin, parses them as [`EngineCommand`]s, and forwards
/// them to the engine's event loop.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        // Clear the buffer, read input, and trim the trailing newline
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line of input")?;

        // For ctrl + d
        if 0 == bytes {
            sender
                .send(EngineCommand::Quit)
                .context("Failed to send 'quit' command after receiving empty input")?;
            return Ok(());
        }

        // Trim whitespace and split args appropriately
        let Some(args) = shlex::split(&buffer) else {
            eprintln!("Invalid quoting in input: {buffer:?}");
            continue;
        };

        // Ignore empty lines
        if args.is_empty() {
            continue;
        }

        // Attempt to parse the user input
        let cmd = match EngineCommand::try_parse_from(&args) {
            Ok(cmd) => cmd,

            // If an invalid command was received, we want to continue running
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };

        let is_quit = matches!(cmd, EngineCommand::Quit);

        sender
            .send(cmd)
            .context("Failed to send command to engine")?;

        if is_quit {
            return Ok(());
        }
    }
}
