//! This module holds the command-line interface of the run loop and the settings it resolves to.
//!
//! Every option has a default matching the layout the loop was written for: a `main.cpp` game and
//! an `endwin.cpp` helper sitting in the current directory, compiled by `clang++` against ncurses.

use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context as _, Result};
use clap::Parser;
use regex::Regex;

/// Accepted values for the `-std=` compiler flag, e.g. `gnu++11`, `c++17` or `c++2b`.
static DIALECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A(?:c|gnu)\+\+(?:\d{2}|2[a-c])\z").expect("the dialect pattern is a valid regex")
});

/// A source file and the binary it gets compiled into, both relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Artifact {
    /// The file name of the binary produced by the compiler.
    pub(crate) binary: PathBuf,
    /// The file name of the C++ translation unit fed to the compiler.
    pub(crate) source: PathBuf,
}

impl Artifact {
    /// This function pairs up a source file with the binary it should be compiled into.
    pub(crate) fn new<S: Into<PathBuf>, B: Into<PathBuf>>(source: S, binary: B) -> Self {
        Self {
            binary: binary.into(),
            source: source.into(),
        }
    }
}

/// This struct holds information about the application when it comes to the command-line argument
/// parser of choice, which is clap. Each option doubles as an environment variable where it makes
/// sense to set it once per shell rather than once per invocation.
#[derive(Parser, Debug)]
#[command(name = "solirun", version, about)]
#[command(next_line_help = true)]
pub(crate) struct Cli {
    /// The C++ compiler used to rebuild the game and the terminal helper.
    #[arg(long, env = "SOLIRUN_COMPILER", default_value = "clang++")]
    #[arg(value_name = "PROGRAM")]
    compiler: String,
    /// The language dialect passed to the compiler as `-std=<DIALECT>`.
    #[arg(long = "std", env = "SOLIRUN_STD", default_value = "gnu++11")]
    #[arg(value_name = "DIALECT", value_parser = verify_dialect)]
    dialect: String,
    /// The game binary produced from the game source and run on every pass.
    #[arg(long, default_value = "Solitaire", value_name = "FILE")]
    game_binary: PathBuf,
    /// The C++ source of the game.
    #[arg(long, default_value = "main.cpp", value_name = "FILE")]
    game_source: PathBuf,
    /// The terminal helper binary, run before every pass and after a crash.
    #[arg(long, default_value = "endwin", value_name = "FILE")]
    helper_binary: PathBuf,
    /// The C++ source of the terminal helper.
    #[arg(long, default_value = "endwin.cpp", value_name = "FILE")]
    helper_source: PathBuf,
    /// Libraries to link both binaries against; repeat the flag for more than one.
    #[arg(long = "lib", default_value = "ncurses", value_name = "NAME")]
    libs: Vec<String>,
    /// The log filter used when RUST_LOG is unset.
    ///
    /// Logs are written to the standard error stream so they never end up mixed into the
    /// prompts.
    #[arg(long, env = "SOLIRUN_LOG_LEVEL", default_value = "warn", value_name = "FILTER")]
    log_level: String,
    /// Run the existing game binary without recompiling anything.
    #[arg(long)]
    no_rebuild: bool,
    /// The directory holding the sources and the binaries.
    #[arg(long, env = "SOLIRUN_WORKDIR", default_value = ".", value_name = "DIR")]
    workdir: PathBuf,
}

impl Cli {
    /// This function turns the parsed arguments into settings for the loop. The working directory
    /// is resolved to an absolute path here so the children never depend on where they are
    /// spawned from.
    ///
    /// # Errors
    ///
    /// The function fails if the working directory does not exist or cannot be resolved.
    pub(crate) fn into_settings(self) -> Result<Settings> {
        let workdir = self
            .workdir
            .canonicalize()
            .with_context(|| format!("cannot resolve working directory {}", self.workdir.display()))?;

        Ok(Settings {
            compiler: self.compiler,
            dialect: self.dialect,
            game: Artifact::new(self.game_source, self.game_binary),
            helper: Artifact::new(self.helper_source, self.helper_binary),
            libs: self.libs,
            log_level: self.log_level,
            rebuild: !self.no_rebuild,
            workdir,
        })
    }
}

/// The resolved configuration of one run of the loop.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    /// The compiler program, looked up on the search path.
    pub(crate) compiler: String,
    /// The `-std=` value.
    pub(crate) dialect: String,
    /// The game source and binary.
    pub(crate) game: Artifact,
    /// The terminal helper source and binary.
    pub(crate) helper: Artifact,
    /// Libraries passed as `-l<name>`.
    pub(crate) libs: Vec<String>,
    /// Fallback log filter.
    pub(crate) log_level: String,
    /// Whether each affirmative pass recompiles both artifacts.
    pub(crate) rebuild: bool,
    /// Absolute path of the directory the children run in.
    pub(crate) workdir: PathBuf,
}

/// This function serves as a value parser for the `--std` option. It only lets through the dialect
/// names clang and gcc both understand, so a typo is caught before the first compile rather than
/// showing up as a build failure.
fn verify_dialect(string: &str) -> Result<String, String> {
    if DIALECT_RE.is_match(string) {
        Ok(string.to_owned())
    } else {
        Err(format!(
            "`{string}` is not a C++ dialect; expected something like gnu++11 or c++17"
        ))
    }
}
