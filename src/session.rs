//! The session module contains the run loop itself: clear, restore the terminal, maybe ask, then
//! rebuild and run the game, and start over until the user declines or a pass fails.
//!
//! Nothing in here touches a process or a terminal directly. The loop talks to the user through
//! [`Console`] and to the compiler and the game through [`Workbench`], which is what lets the
//! tests below play whole sessions from a script.

use std::fmt;
use std::io;
use std::os::unix::process::ExitStatusExt as _;
use std::path::PathBuf;
use std::process::ExitStatus;

use anyhow::Result;
use tracing::{debug, info};

use crate::input::{Answer, Console};

/// The diagnostic printed when the game does not exit cleanly.
pub(crate) const CRASH_DIAGNOSTIC: &str =
    "An error has occured. Most likely a segfault or compilation error.";

/// The work done on behalf of the loop: building the binaries, running the game and putting the
/// terminal back in order.
pub(crate) trait Workbench {
    /// This function deletes and recompiles every binary the loop depends on.
    ///
    /// # Errors
    ///
    /// A [`LoopError`] when a compiler cannot be started or reports failure; anything else is
    /// unexpected.
    fn rebuild(&self) -> Result<()>;

    /// This function runs the terminal helper. It never fails; problems are only logged, since a
    /// missing helper must not keep the game from being rebuilt.
    fn restore_terminal(&self);

    /// This function runs the game attached to the controlling terminal and waits for it.
    ///
    /// # Errors
    ///
    /// A [`LoopError::LaunchFailed`] when the game cannot be started.
    fn run_game(&self) -> Result<Termination>;
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Termination {
    /// The process returned from `main` or called `exit` with this code.
    Exited(i32),
    /// The process was killed by this signal.
    Signaled(i32),
}

impl Termination {
    /// This function tells whether the process exited with status zero.
    pub(crate) const fn success(self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl From<ExitStatus> for Termination {
    fn from(status: ExitStatus) -> Self {
        status.code().map_or_else(
            || Self::Signaled(status.signal().unwrap_or_default()),
            Self::Exited,
        )
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Exited(code) => write!(formatter, "exit status {code}"),
            Self::Signaled(signal) => write!(formatter, "signal {signal}"),
        }
    }
}

/// This enum holds every failure the loop reports on its own before giving up. Anything not in
/// here is an unexpected error and is left to `main`.
#[derive(thiserror::Error, Debug)]
pub(crate) enum LoopError {
    /// The compiler ran and rejected a source file.
    #[error("Compiling {} failed with {status}.\n{stderr}", file.display())]
    BuildFailed {
        /// The source that did not compile.
        file: PathBuf,
        /// What the compiler exited with.
        status: Termination,
        /// Everything the compiler wrote to its error stream.
        stderr: String,
    },
    /// The compiler could not be started at all.
    #[error("Could not start the compiler `{compiler}`: {error}")]
    CompilerUnavailable {
        /// The program that was looked up.
        compiler: String,
        /// Why spawning it failed.
        #[source]
        error: io::Error,
    },
    /// The game binary could not be started.
    #[error("Could not start {}: {error}", binary.display())]
    LaunchFailed {
        /// The binary that was spawned.
        binary: PathBuf,
        /// Why spawning it failed.
        #[source]
        error: io::Error,
    },
    /// The game ran and then exited with a non-zero status or died from a signal.
    #[error("{}", CRASH_DIAGNOSTIC)]
    RuntimeCrashed {
        /// How the game ended.
        status: Termination,
    },
}

/// The states a session moves through. A session starts in `Building`, because the first pass
/// never asks, and ends in either `NormalExit` or `ErrorExit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// The binaries are being deleted and recompiled.
    Building,
    /// A pass failed; the terminal was restored and the diagnostic printed.
    ErrorExit,
    /// The pass is over and the next one is about to start.
    Looping,
    /// The user declined to continue.
    NormalExit,
    /// Waiting for the answer to the continue prompt.
    Prompting,
    /// The game owns the terminal.
    Running,
}

/// What the loop should do after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Start another pass.
    Again,
    /// The user said no; stop without an error.
    Done,
}

/// How a whole session ended.
#[derive(Debug)]
pub(crate) enum Ending {
    /// The user answered no to the continue prompt.
    Declined,
    /// A pass failed and the diagnostic has already been shown.
    Failed(LoopError),
}

/// The per-process state of the run loop.
#[derive(Debug)]
pub(crate) struct Session {
    /// Set until the first pass has picked its implicit answer.
    first_iteration: bool,
    /// Where the session currently is.
    phase: Phase,
}

impl Session {
    /// This function creates a session that has not run any pass yet.
    pub(crate) const fn new() -> Self {
        Self {
            first_iteration: true,
            phase: Phase::Building,
        }
    }

    /// The current phase.
    pub(crate) const fn phase(&self) -> Phase {
        self.phase
    }

    /// This function runs passes until the user declines or a pass fails.
    ///
    /// A failed pass restores the terminal, prints the failure once through the console and ends
    /// the session; it is never retried.
    ///
    /// # Errors
    ///
    /// Only unexpected errors, such as the terminal going away, are returned as errors. Build and
    /// run failures come back as [`Ending::Failed`].
    pub(crate) fn run<C: Console, W: Workbench>(
        &mut self,
        console: &C,
        bench: &W,
    ) -> Result<Ending> {
        loop {
            match self.run_once(console, bench) {
                Ok(Flow::Again) => {}
                Ok(Flow::Done) => break Ok(Ending::Declined),
                Err(err) => {
                    // the game may have left the terminal raw, whatever went wrong
                    bench.restore_terminal();
                    let failure = err.downcast::<LoopError>()?;

                    self.enter(Phase::ErrorExit);
                    console.report(&failure.to_string())?;

                    break Ok(Ending::Failed(failure));
                }
            }
        }
    }

    /// This function runs a single pass of the loop.
    ///
    /// # Errors
    ///
    /// The function fails with a [`LoopError`] when the build fails or the game does not exit
    /// cleanly, and with any error the console or the workbench run into.
    pub(crate) fn run_once<C: Console, W: Workbench>(
        &mut self,
        console: &C,
        bench: &W,
    ) -> Result<Flow> {
        console.clear()?;
        bench.restore_terminal();

        let answer = if self.first_iteration {
            self.first_iteration = false;
            Answer::Proceed
        } else {
            self.enter(Phase::Prompting);
            Answer::parse(&console.ask_continue()?)
        };

        match answer {
            Answer::Proceed => {}
            Answer::Stop => {
                self.enter(Phase::NormalExit);
                return Ok(Flow::Done);
            }
            Answer::Unrecognized => {
                debug!("unrecognized answer, asking again");
                self.enter(Phase::Looping);
                return Ok(Flow::Again);
            }
        }

        self.enter(Phase::Building);
        bench.rebuild()?;

        self.enter(Phase::Running);
        let status = bench.run_game()?;
        if !status.success() {
            return Err(LoopError::RuntimeCrashed { status }.into());
        }
        info!(%status, "game finished");

        console.wait_for_enter()?;
        console.clear()?;
        self.enter(Phase::Looping);

        Ok(Flow::Again)
    }

    /// This function moves the session to another phase.
    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "phase change");
        self.phase = phase;
    }
}
