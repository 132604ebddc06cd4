//! Line editing and the round-count grammar.

use core::fmt;
use core::str;

use heapless::Vec;
use winnow::ascii::{digit1, space0};
use winnow::combinator::delimited;
use winnow::error::ContextError;
use winnow::prelude::*;

/// Maximum number of bytes accepted on a single input line (excluding terminator).
pub const MAX_LINE_LEN: usize = 16;

/// What the editor did with a byte.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineEvent {
    /// Byte appended; echo it back.
    Echo(u8),
    /// Last byte removed; erase it on the terminal.
    Erase,
    /// Terminator received; the buffered line is ready.
    Submit,
    /// Control byte or backspace on an empty line.
    Ignored,
}

/// Errors surfaced by the line editor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineError {
    /// Input exceeded [`MAX_LINE_LEN`].
    Overflow,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::Overflow => write!(f, "line longer than {MAX_LINE_LEN} bytes"),
        }
    }
}

/// Bounded single-line editor with backspace support.
#[derive(Clone, Debug, Default)]
pub struct LineEditor {
    buffer: Vec<u8, MAX_LINE_LEN>,
}

impl LineEditor {
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feeds one byte into the editor. CR or LF submits, 0x08/0x7F erase.
    pub fn ingest(&mut self, byte: u8) -> Result<LineEvent, LineError> {
        match byte {
            b'\r' | b'\n' => Ok(LineEvent::Submit),
            0x08 | 0x7f => Ok(match self.buffer.pop() {
                Some(_) => LineEvent::Erase,
                None => LineEvent::Ignored,
            }),
            b' '..=b'~' => {
                self.buffer.push(byte).map_err(|_| LineError::Overflow)?;
                Ok(LineEvent::Echo(byte))
            }
            _ => Ok(LineEvent::Ignored),
        }
    }

    /// Current contents. Only printable ASCII is buffered, so this is always UTF-8.
    pub fn line(&self) -> &str {
        str::from_utf8(&self.buffer).unwrap_or("")
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Reasons a submitted round count could not be read.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RoundCountError {
    /// Nothing but whitespace was entered.
    Empty,
    /// The line contains something other than decimal digits.
    NotANumber,
    /// The digits do not fit in a `u32`.
    TooLarge,
}

impl fmt::Display for RoundCountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundCountError::Empty => f.write_str("no number entered"),
            RoundCountError::NotANumber => f.write_str("not an unsigned decimal number"),
            RoundCountError::TooLarge => f.write_str("number too large"),
        }
    }
}

/// Parses an unsigned decimal round count, tolerating surrounding spaces.
///
/// Range checking is left to [`SessionConfig::set_round_count`](crate::config::SessionConfig::set_round_count).
pub fn parse_round_count(input: &str) -> Result<u32, RoundCountError> {
    if input.trim().is_empty() {
        return Err(RoundCountError::Empty);
    }

    let digits = digits()
        .parse(input)
        .map_err(|_| RoundCountError::NotANumber)?;
    digits.parse::<u32>().map_err(|_| RoundCountError::TooLarge)
}

fn digits<'a>() -> impl Parser<&'a str, &'a str, ContextError> {
    move |input: &mut &'a str| delimited(space0, digit1, space0).parse_next(input)
}
