//! This module holds the real [`Workbench`]: it deletes and recompiles the game and the terminal
//! helper with the configured compiler, and launches both as children of this process.
//!
//! The compiler runs with its output captured, so a failed build can be reported in one piece
//! once the terminal is back to normal. The game, on the other hand, inherits the terminal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context as _, Result};
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::config::{Artifact, Settings};
use crate::session::{LoopError, Termination, Workbench};

/// The compiler driver and process launcher of the loop.
#[derive(Debug)]
pub(crate) struct Toolchain {
    /// The compiler program.
    compiler: String,
    /// The `-std=` value.
    dialect: String,
    /// The game source and binary.
    game: Artifact,
    /// The terminal helper source and binary.
    helper: Artifact,
    /// Libraries linked into both binaries.
    libs: Vec<String>,
    /// Whether `rebuild` compiles anything.
    rebuild: bool,
    /// The absolute directory every child runs in.
    workdir: PathBuf,
}

impl Toolchain {
    /// This function sets up a toolchain from the resolved settings.
    pub(crate) fn new(settings: &Settings) -> Self {
        Self {
            compiler: settings.compiler.clone(),
            dialect: settings.dialect.clone(),
            game: settings.game.clone(),
            helper: settings.helper.clone(),
            libs: settings.libs.clone(),
            rebuild: settings.rebuild,
            workdir: settings.workdir.clone(),
        }
    }

    /// This function returns where the binary of an artifact lives.
    fn binary_path(&self, artifact: &Artifact) -> PathBuf {
        self.workdir.join(&artifact.binary)
    }

    /// This function deletes the binary of an artifact and compiles its source again. The old
    /// binary is gone before the compiler starts, so a failed build leaves nothing to run.
    fn compile(&self, artifact: &Artifact) -> Result<()> {
        let binary = self.binary_path(artifact);
        remove_binary(&binary)
            .with_context(|| format!("cannot remove old binary {}", binary.display()))?;

        let flags = self.flags(artifact);
        debug!(compiler = %self.compiler, ?flags, "running compiler");

        let spinner = ProgressBar::new_spinner();
        spinner.set_message(format!("Compiling {}...", artifact.source.display()));
        spinner.enable_steady_tick(Duration::from_millis(50));

        let output = Command::new(&self.compiler)
            .args(&flags)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output();
        spinner.finish_and_clear();

        let output = output.map_err(|error| LoopError::CompilerUnavailable {
            compiler: self.compiler.clone(),
            error,
        })?;

        if !output.status.success() {
            return Err(LoopError::BuildFailed {
                file: artifact.source.clone(),
                status: output.status.into(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_owned(),
            }
            .into());
        }

        info!(source = %artifact.source.display(), binary = %binary.display(), "compiled");
        Ok(())
    }

    /// This function lays out the compiler arguments as
    /// `-std=<dialect> -l<lib>... <source> -o <binary>`.
    fn flags(&self, artifact: &Artifact) -> Vec<String> {
        let mut flags = vec![format!("-std={}", self.dialect)];
        flags.extend(self.libs.iter().map(|lib| format!("-l{lib}")));
        flags.push(artifact.source.display().to_string());
        flags.push(String::from("-o"));
        flags.push(artifact.binary.display().to_string());
        flags
    }
}

impl Workbench for Toolchain {
    fn rebuild(&self) -> Result<()> {
        if !self.rebuild {
            debug!("rebuilding is disabled");
            return Ok(());
        }

        self.compile(&self.game)?;
        self.compile(&self.helper)
    }

    fn restore_terminal(&self) {
        let helper = self.binary_path(&self.helper);

        match Command::new(&helper).current_dir(&self.workdir).status() {
            Ok(status) if status.success() => debug!("terminal restored"),
            Ok(status) => warn!(
                helper = %helper.display(),
                status = %Termination::from(status),
                "terminal helper failed"
            ),
            Err(err) => warn!(
                helper = %helper.display(),
                error = %err,
                "terminal helper could not be started"
            ),
        }
    }

    fn run_game(&self) -> Result<Termination> {
        let binary = self.binary_path(&self.game);
        info!(binary = %binary.display(), "starting game");

        let status = Command::new(&binary)
            .current_dir(&self.workdir)
            .status()
            .map_err(|error| LoopError::LaunchFailed { binary, error })?;

        Ok(status.into())
    }
}

/// This function deletes a file, treating a file that is already gone as deleted.
fn remove_binary(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
