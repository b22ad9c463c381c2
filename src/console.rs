//! Line-based text I/O boundary used by the interactive driver.

use crate::error::{LedgerError, Result};
use std::fmt::Display;
use std::io::{BufRead, Write};

/// Prompts on `W` and reads answers line by line from `R`.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    /// Writes `text` followed by a newline.
    pub fn say(&mut self, text: impl Display) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Writes a blank line.
    pub fn blank(&mut self) -> Result<()> {
        writeln!(self.output)?;
        Ok(())
    }

    /// Shows `prompt` and blocks for one line of input, without its line
    /// ending. Fails with `InputClosed` at end of input.
    ///
    /// Bytes that are not valid UTF-8 become U+FFFD.
    pub fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut raw = Vec::new();
        if self.input.read_until(b'\n', &mut raw)? == 0 {
            writeln!(self.output)?;
            return Err(LedgerError::InputClosed);
        }

        let mut line = String::from_utf8_lossy(&raw).into_owned();
        let trimmed = line.trim_end_matches(&['\n', '\r'][..]).len();
        line.truncate(trimmed);
        Ok(line)
    }

    /// Asks a yes/no question; anything not starting with `y` is no.
    pub fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.ask(prompt)?;
        Ok(answer
            .trim_start()
            .chars()
            .next()
            .map_or(false, |c| c.eq_ignore_ascii_case(&'y')))
    }

    /// Consumes the console, returning the output sink.
    pub fn into_output(self) -> W {
        self.output
    }
}
