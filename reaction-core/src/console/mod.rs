//! Menu-driven operator console.
//!
//! [`Console`] consumes one input byte at a time and writes its responses to
//! any [`core::fmt::Write`] sink, so the same state machine backs the UART on
//! the board and the terminal on the host. Playing a session is left to the
//! caller: [`ConsoleAction::Play`] hands control over, and
//! [`Console::finish_session`] takes it back.

use core::fmt::{self, Write};

use crate::game::Game;

pub mod line;
pub mod text;

pub use line::{LineEditor, LineError, LineEvent, MAX_LINE_LEN, RoundCountError, parse_round_count};

/// Top-level menu entries.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MenuChoice {
    SetRounds,
    Play,
    ViewResults,
    Exit,
}

impl MenuChoice {
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'1' => Some(MenuChoice::SetRounds),
            b'2' => Some(MenuChoice::Play),
            b'3' => Some(MenuChoice::ViewResults),
            b'4' => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

/// What the console is waiting for.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConsoleMode {
    Menu,
    RoundCount,
    /// Results are on screen; any key returns to the menu.
    Results,
    /// A session is running and owns the input.
    Playing,
    Exited,
}

/// Work the caller must perform after a byte was handled.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConsoleAction {
    None,
    Play,
    Exit,
}

pub struct Console {
    game: Game,
    mode: ConsoleMode,
    editor: LineEditor,
}

impl Console {
    pub const fn new(game: Game) -> Self {
        Self {
            game,
            mode: ConsoleMode::Menu,
            editor: LineEditor::new(),
        }
    }

    pub const fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub const fn mode(&self) -> ConsoleMode {
        self.mode
    }

    /// Prints the banner and the first menu.
    pub fn start<W: Write + ?Sized>(&mut self, out: &mut W) -> fmt::Result {
        self.mode = ConsoleMode::Menu;
        text::write_banner(out)?;
        text::write_menu(out, self.game.round_count())
    }

    /// Handles one input byte.
    pub fn handle_byte<W: Write + ?Sized>(
        &mut self,
        byte: u8,
        out: &mut W,
    ) -> Result<ConsoleAction, fmt::Error> {
        match self.mode {
            ConsoleMode::Menu => self.handle_menu(byte, out),
            ConsoleMode::RoundCount => self.handle_round_count(byte, out),
            ConsoleMode::Results => {
                out.write_str(text::CRLF)?;
                self.show_menu(out)?;
                Ok(ConsoleAction::None)
            }
            ConsoleMode::Playing | ConsoleMode::Exited => Ok(ConsoleAction::None),
        }
    }

    /// Shows the results of the session that just ended and waits for a key.
    pub fn finish_session<W: Write + ?Sized>(&mut self, out: &mut W) -> fmt::Result {
        self.show_results(out)
    }

    fn handle_menu<W: Write + ?Sized>(
        &mut self,
        byte: u8,
        out: &mut W,
    ) -> Result<ConsoleAction, fmt::Error> {
        // Terminals send a bare line ending after the key; it is not a choice.
        if matches!(byte, b'\r' | b'\n') {
            return Ok(ConsoleAction::None);
        }

        if byte.is_ascii_graphic() {
            out.write_char(char::from(byte))?;
        }
        out.write_str(text::CRLF)?;

        match MenuChoice::from_byte(byte) {
            Some(MenuChoice::SetRounds) => {
                self.editor.clear();
                self.mode = ConsoleMode::RoundCount;
                text::write_round_count_prompt(out)?;
                Ok(ConsoleAction::None)
            }
            Some(MenuChoice::Play) => {
                self.mode = ConsoleMode::Playing;
                Ok(ConsoleAction::Play)
            }
            Some(MenuChoice::ViewResults) => {
                self.show_results(out)?;
                Ok(ConsoleAction::None)
            }
            Some(MenuChoice::Exit) => {
                self.mode = ConsoleMode::Exited;
                text::write_exit(out)?;
                Ok(ConsoleAction::Exit)
            }
            None => {
                text::write_invalid_choice(out)?;
                self.show_menu(out)?;
                Ok(ConsoleAction::None)
            }
        }
    }

    fn handle_round_count<W: Write + ?Sized>(
        &mut self,
        byte: u8,
        out: &mut W,
    ) -> Result<ConsoleAction, fmt::Error> {
        match self.editor.ingest(byte) {
            Ok(LineEvent::Echo(echo)) => out.write_char(char::from(echo))?,
            Ok(LineEvent::Erase) => out.write_str("\x08 \x08")?,
            Ok(LineEvent::Ignored) | Err(LineError::Overflow) => {}
            Ok(LineEvent::Submit) => {
                let accepted = parse_round_count(self.editor.line())
                    .ok()
                    .is_some_and(|requested| self.game.set_round_count(requested).is_ok());
                self.editor.clear();
                text::write_round_count_result(out, accepted, self.game.round_count())?;
                self.show_menu(out)?;
            }
        }
        Ok(ConsoleAction::None)
    }

    fn show_menu<W: Write + ?Sized>(&mut self, out: &mut W) -> fmt::Result {
        self.mode = ConsoleMode::Menu;
        text::write_menu(out, self.game.round_count())
    }

    fn show_results<W: Write + ?Sized>(&mut self, out: &mut W) -> fmt::Result {
        self.mode = ConsoleMode::Results;
        text::write_results(out, self.game.results())
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(Game::default())
    }
}
