/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::Parser;

/// A command to be sent to the engine.
#[derive(Debug, Clone, Parser)]
#[command(multicall = true, about, rename_all = "lower")]
pub enum EngineCommand {
    /// Set the default depth used by `search` and `selfplay`.
    Depth {
        /// Depth, in plies.
        depth: u8,
    },

    /// Print a visual representation of the current board state.
    #[command(alias = "d")]
    Display,

    /// Print an evaluation of the current position.
    Eval,

    /// Generate and print a FEN string for the current position.
    Fen,

    /// Apply the provided move to the current position, if possible.
    #[command(alias = "move")]
    MakeMove {
        /// The move to apply, in UCI notation (e.g. `e2e4`, `e7e8q`).
        mv_string: String,
    },

    /// Show all legal moves in the current position.
    Moves,

    /// Performs a perft on the current position at the supplied depth.
    Perft {
        /// Maximum depth of the perft.
        #[arg(default_value = "1")]
        depth: usize,

        /// Whether to display results as a splitperft.
        #[arg(short, long, default_value = "false")]
        split: bool,
    },

    /// Set the current position.
    ///
    /// Accepts `position startpos`, `position fen <FEN>`, or a bare FEN
    /// string, optionally followed by `moves <move>...` in UCI notation.
    Position {
        #[arg(num_args = 1.., trailing_var_arg = true)]
        args: Vec<String>,
    },

    /// Quit the engine.
    #[command(alias = "exit")]
    Quit,

    /// Search the current position, printing the best move when finished.
    #[command(alias = "go")]
    Search {
        /// Override the default search depth.
        depth: Option<u8>,
    },

    /// Play the engine against itself from the current position.
    Selfplay {
        /// Maximum number of half-moves before the game is abandoned.
        #[arg(default_value = "200")]
        max_moves: u32,
    },

    /// Stop an in-progress search.
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> EngineCommand {
        EngineCommand::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert!(matches!(parse(&["display"]), EngineCommand::Display));
        assert!(matches!(parse(&["d"]), EngineCommand::Display));
        assert!(matches!(parse(&["quit"]), EngineCommand::Quit));

        match parse(&["perft", "5", "--split"]) {
            EngineCommand::Perft { depth, split } => {
                assert_eq!(depth, 5);
                assert!(split);
            }
            cmd => panic!("parsed {cmd:?}"),
        }

        match parse(&["position", "startpos", "moves", "e2e4", "e7e5"]) {
            EngineCommand::Position { args } => {
                assert_eq!(args, vec!["startpos", "moves", "e2e4", "e7e5"]);
            }
            cmd => panic!("parsed {cmd:?}"),
        }

        match parse(&["go", "6"]) {
            EngineCommand::Search { depth } => assert_eq!(depth, Some(6)),
            cmd => panic!("parsed {cmd:?}"),
        }
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(EngineCommand::try_parse_from(["frobnicate"]).is_err());
    }
}
