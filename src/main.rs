/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::Parser;
use newt::{Engine, EngineCommand};

fn main() {
    let engine = Engine::new();
    println!("{} {}", engine.name(), engine.version());

    // If a command was provided on the command line, run it and then exit
    if let Ok(cmd) = EngineCommand::try_parse_from(std::env::args_os().skip(1)) {
        let _ = engine.send_command(cmd);
        let _ = engine.send_command(EngineCommand::Quit);
    }

    // Run the engine's main event loop
    if let Err(e) = engine.run() {
        eprintln!("{} encountered a fatal error: {e}", env!("CARGO_PKG_NAME"));
    }
}
