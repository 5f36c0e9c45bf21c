//! The library components of the run loop. They allow configuring the loop, taking the continue
//! answer from the user, rebuilding the game and its terminal helper, and running the game.
//!
//! The starting point of the library is the app.rs file, which wires the configuration into the
//! session loop found in session.rs.

#![expect(
    clippy::cargo_common_metadata,
    reason = "The package has not yet been pushed to a remote."
)]

mod app;
mod config;
mod input;
mod session;
mod toolchain;

pub use app::init;
