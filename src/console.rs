//! Line-oriented operator console: messages, numeric prompts and key reads.
//!
//! Generic over the reader and writer so prompts can be driven from byte
//! slices in tests and from stdin/stdout in the binary.

use std::fmt::Display;
use std::io::{BufRead, Write};

use crate::error::{Result, SplitError};

/// One reply to a key prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyReply {
    /// A line holding exactly one character.
    Key(char),
    /// A line with more than one character, kept verbatim (trimmed).
    Text(String),
    /// An empty line or end of input.
    Nothing,
}

impl From<Option<char>> for KeyReply {
    fn from(key: Option<char>) -> Self {
        key.map_or(Self::Nothing, Self::Key)
    }
}

impl From<&str> for KeyReply {
    fn from(line: &str) -> Self {
        let mut chars = line.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Self::Nothing,
            (Some(key), None) => Self::Key(key),
            (Some(_), Some(_)) => Self::Text(line.to_owned()),
        }
    }
}

/// Operator console over any buffered reader and writer.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Console bound to the process stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the console and return its writer.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Write one line to the operator.
    pub fn say(&mut self, message: impl Display) -> Result<()> {
        writeln!(self.output, "{message}")?;
        self.output.flush()?;
        Ok(())
    }

    /// Write a prompt without a trailing newline.
    fn ask(&mut self, prompt: &str) -> Result<()> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        Ok(())
    }

    /// Read one line, trimmed. `None` at end of input.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    /// Read a single key from the next line.
    ///
    /// Only a line that trims to exactly one character counts as a key.
    pub fn read_key(&mut self) -> Result<KeyReply> {
        Ok(self
            .read_line()?
            .map_or(KeyReply::Nothing, |line| KeyReply::from(line.as_str())))
    }

    /// Ask for a positive integer.
    ///
    /// # Errors
    ///
    /// [`SplitError::Config`] for anything that is not a positive integer,
    /// [`SplitError::MissingInput`] at end of input.
    pub fn prompt_positive(&mut self, label: &str) -> Result<u32> {
        self.ask(&format!("{label}: "))?;
        let Some(reply) = self.read_line()? else {
            return Err(SplitError::MissingInput(format!("no value entered for {label}")));
        };
        match reply.parse::<u32>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(SplitError::Config(format!(
                "{label} must be a positive integer, got {reply:?}"
            ))),
        }
    }

    /// Ask the operator to pick one of `count` numbered entries.
    ///
    /// Returns the zero-based index.
    ///
    /// # Errors
    ///
    /// [`SplitError::MissingInput`] for a non-numeric or out-of-range reply.
    pub fn prompt_selection(&mut self, count: usize) -> Result<usize> {
        self.ask(&format!("Select an image [1-{count}]: "))?;
        let reply = self.read_line()?.unwrap_or_default();
        match reply.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => Ok(n - 1),
            _ => Err(SplitError::MissingInput(format!(
                "invalid selection {reply:?}, expected a number from 1 to {count}"
            ))),
        }
    }
}
