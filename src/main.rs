//! # solirun
//!
//! This crate drives the edit, rebuild and play cycle of a terminal card game written against
//! ncurses. It only runs on Linux because both the game and its terminal helper do.
//!
//! Every pass clears the screen, puts the terminal back into a sane mode through the `endwin`
//! helper, recompiles the game and the helper, and hands the terminal over to the freshly built
//! game. Once the game returns, you get asked whether to go again; a crash ends the whole thing.

#![cfg(target_os = "linux")]
#![expect(
    unused_crate_dependencies,
    reason = "The dependencies are used in the library crate."
)]

use std::process::ExitCode;

use anyhow::Result;
use solirun::init;

fn main() -> Result<ExitCode> {
    init()
}
