//! The app module ties everything together. It contains the `init()` function that parses the
//! command line, sets up logging and the terminal, and runs the session until it ends.

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser as _;
use console::Term;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Cli;
use crate::input::TermConsole;
use crate::session::{Ending, Session};
use crate::toolchain::Toolchain;

/// Initializes the run loop and handles literally everything. This is a `main()` function of
/// sorts though it is still called from main.rs.
///
/// The returned exit code is success when the user declined to continue, and failure when a build
/// or a run of the game failed. The failure has already been printed by then.
///
/// # Errors
///
/// The function may return any one of the following errors:
///
/// - io::Error, when the working directory cannot be resolved or the terminal cannot be used
/// - dialoguer::Error, when the continue prompt cannot be read
pub fn init() -> Result<ExitCode> {
    let settings = Cli::parse().into_settings()?;
    init_tracing(&settings.log_level);

    let term = Term::stdout();
    term.set_title("solirun");

    let console = TermConsole::new(term);
    let toolchain = Toolchain::new(&settings);
    let mut session = Session::new();

    info!(workdir = %settings.workdir.display(), "starting run loop");

    let ending = session.run(&console, &toolchain)?;
    debug!(phase = ?session.phase(), ?ending, "session over");

    Ok(exit_code(&ending))
}

/// This function maps how a session ended to the status the process exits with: success when the
/// user declined to continue, failure when a pass failed.
fn exit_code(ending: &Ending) -> ExitCode {
    match *ending {
        Ending::Declined => ExitCode::SUCCESS,
        Ending::Failed(_) => ExitCode::FAILURE,
    }
}

/// This function installs the global subscriber. `RUST_LOG` takes precedence over the configured
/// level, and everything goes to the standard error stream.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use super::exit_code;
    use crate::session::{Ending, LoopError, Termination};

    // ExitCode has no PartialEq; its Debug output carries the status
    fn same(left: ExitCode, right: ExitCode) -> bool {
        format!("{left:?}") == format!("{right:?}")
    }

    #[test]
    fn declining_exits_successfully() {
        assert!(
            same(exit_code(&Ending::Declined), ExitCode::SUCCESS),
            "declining is a clean exit"
        );
    }

    #[test]
    fn failed_passes_exit_with_failure() {
        let crashed = Ending::Failed(LoopError::RuntimeCrashed {
            status: Termination::Exited(137),
        });
        let unbuilt = Ending::Failed(LoopError::BuildFailed {
            file: PathBuf::from("main.cpp"),
            status: Termination::Exited(1),
            stderr: String::new(),
        });

        assert!(same(exit_code(&crashed), ExitCode::FAILURE), "a crash fails");
        assert!(same(exit_code(&unbuilt), ExitCode::FAILURE), "a build failure fails");
        assert!(
            !same(exit_code(&crashed), ExitCode::SUCCESS),
            "failure and success are told apart"
        );
    }
}
