//! This module contains everything related to talking with the user between two runs of the game.
//! The terminal side uses the `console` and `dialoguer` crates, and sits behind the [`Console`]
//! trait so the loop can be driven by a script instead of a keyboard.
//!
//! Specifically, it reads the answer to the continue prompt, waits for the user to acknowledge a
//! finished game, and prints the fatal diagnostic once a pass fails. When standard input or
//! standard output is not a terminal, both prompts fall back to plain line reads so the loop still
//! works behind a pipe.

use std::io::{self, BufRead, IsTerminal as _, Write};

use anyhow::Result;
use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;

/// The question asked before every pass but the first.
pub(crate) const CONTINUE_PROMPT: &str = "Continue? (Y/n)";

/// The line shown once the game exited cleanly.
pub(crate) const FINISH_PROMPT: &str = "\nProgram finished. Press enter to exit . . . ";

/// This enum holds the three ways an answer to the continue prompt can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Answer {
    /// The user wants another pass: `y`, `Y` or just the return key.
    Proceed,
    /// The user is done: `n` or `N`.
    Stop,
    /// Anything else. Neither branch fires and the pass ends without building or running.
    Unrecognized,
}

impl Answer {
    /// This function classifies a raw line of input. Only the line terminator is stripped, so
    /// `" y"` is not the same as `"y"`.
    pub(crate) fn parse(line: &str) -> Self {
        match line.trim_end_matches(['\r', '\n']) {
            "" | "y" | "Y" => Self::Proceed,
            "n" | "N" => Self::Stop,
            _ => Self::Unrecognized,
        }
    }
}

/// The terminal as seen by the run loop.
pub(crate) trait Console {
    /// This function prints the continue prompt and returns the raw line typed in response.
    ///
    /// # Errors
    ///
    /// The function fails if the prompt cannot be drawn or the line cannot be read.
    fn ask_continue(&self) -> Result<String>;

    /// This function clears the whole screen.
    ///
    /// # Errors
    ///
    /// The function fails if the terminal cannot be written to.
    fn clear(&self) -> Result<()>;

    /// This function prints a fatal diagnostic on its own line.
    ///
    /// # Errors
    ///
    /// The function fails if the terminal cannot be written to.
    fn report(&self, message: &str) -> Result<()>;

    /// This function prints the finish prompt and blocks until a full line has been read.
    ///
    /// # Errors
    ///
    /// The function fails if the terminal cannot be read from or written to.
    fn wait_for_enter(&self) -> Result<()>;
}

/// The interactive console backed by the process' standard output.
pub(crate) struct TermConsole {
    /// The handle every prompt is drawn on and read from.
    term: Term,
}

impl TermConsole {
    /// This function wraps a terminal handle.
    pub(crate) const fn new(term: Term) -> Self {
        Self { term }
    }

    /// This function tells whether both ends of the conversation are a terminal, which is what
    /// dialoguer and `Term::read_line` need to actually read anything.
    fn interactive(&self) -> bool {
        self.term.is_term() && io::stdin().is_terminal()
    }
}

impl Console for TermConsole {
    fn ask_continue(&self) -> Result<String> {
        if !self.interactive() {
            let prompt = format!("{CONTINUE_PROMPT} ");
            let mut stdout = io::stdout().lock();
            return Ok(prompt_line(&mut io::stdin().lock(), &mut stdout, &prompt)?);
        }

        let input: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{}", style(CONTINUE_PROMPT).bold()))
            .allow_empty(true)
            .interact_text_on(&self.term)?;

        Ok(input)
    }

    fn clear(&self) -> Result<()> {
        self.term.clear_screen()?;
        Ok(())
    }

    fn report(&self, message: &str) -> Result<()> {
        self.term.write_line(&format!("{}", style(message).bold()))?;
        Ok(())
    }

    fn wait_for_enter(&self) -> Result<()> {
        if !self.interactive() {
            let mut stdout = io::stdout().lock();
            let _ = prompt_line(&mut io::stdin().lock(), &mut stdout, FINISH_PROMPT)?;
            return Ok(());
        }

        self.term.write_str(FINISH_PROMPT)?;
        self.term.flush()?;

        // whatever was typed before the return key is irrelevant
        let _ = self.term.read_line()?;
        Ok(())
    }
}

/// This function writes a prompt and reads exactly one line in response, without its line
/// terminator.
///
/// # Errors
///
/// The function fails if the prompt cannot be written, the line cannot be read, or the input is
/// already at its end; an empty read must not pass for the return key.
fn prompt_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<String> {
    output.write_all(prompt.as_bytes())?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "standard input closed"));
    }

    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn piped_prompt_reads_one_line_at_a_time() -> Result<()> {
        let mut input = Cursor::new("\nn\n");
        let mut output = Vec::new();

        let first = prompt_line(&mut input, &mut output, FINISH_PROMPT)?;
        assert_eq!(first, "", "the return key is an empty line");
        assert_eq!(output, FINISH_PROMPT.as_bytes(), "the prompt is written first");

        let second = prompt_line(&mut input, &mut output, CONTINUE_PROMPT)?;
        assert_eq!(second, "n", "the next line is left for the next prompt");
        assert_eq!(Answer::parse(&second), Answer::Stop, "a piped n stops the loop");
        Ok(())
    }

    #[test]
    fn piped_prompt_strips_carriage_returns() -> Result<()> {
        let mut input = Cursor::new("Y\r\n");
        let line = prompt_line(&mut input, &mut Vec::new(), CONTINUE_PROMPT)?;

        assert_eq!(line, "Y", "line terminator removed");
        Ok(())
    }

    #[test]
    fn closed_input_is_an_error_not_an_empty_answer() {
        let mut input = Cursor::new("");
        let result = prompt_line(&mut input, &mut Vec::new(), CONTINUE_PROMPT);

        assert!(
            matches!(result, Err(ref err) if err.kind() == io::ErrorKind::UnexpectedEof),
            "end of input must not read as the return key, got {result:?}"
        );
    }

    #[test]
    fn affirmative_answers_proceed() {
        for line in ["y", "Y", "", "y\n", "\r\n"] {
            assert_eq!(Answer::parse(line), Answer::Proceed, "{line:?} should proceed");
        }
    }

    #[test]
    fn negative_answers_stop() {
        for line in ["n", "N", "N\n"] {
            assert_eq!(Answer::parse(line), Answer::Stop, "{line:?} should stop");
        }
    }

    #[test]
    fn everything_else_is_unrecognized() {
        for line in ["yes", "no", " y", "n ", "q", "YN", "\ty"] {
            assert_eq!(
                Answer::parse(line),
                Answer::Unrecognized,
                "{line:?} should be ignored"
            );
        }
    }
}
