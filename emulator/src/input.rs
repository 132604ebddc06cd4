//! Keyboard handling. While a session runs, any key acts as the response
//! button; otherwise keys are forwarded to the console as bytes.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::board;

/// Console-bound input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Input {
    Byte(u8),
    Quit,
}

/// Set while a session owns the keyboard.
#[derive(Clone, Default)]
pub struct SessionFlag(Arc<AtomicBool>);

impl SessionFlag {
    pub fn set(&self, active: bool) {
        self.0.store(active, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Maps a key event to console input. Ctrl-C and Esc quit.
pub fn translate(key: KeyEvent) -> Option<Input> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Input::Quit),
        KeyCode::Esc => Some(Input::Quit),
        KeyCode::Char(ch) if ch.is_ascii() => Some(Input::Byte(ch as u8)),
        KeyCode::Enter => Some(Input::Byte(b'\r')),
        KeyCode::Backspace => Some(Input::Byte(0x7f)),
        _ => None,
    }
}

/// Puts the terminal in raw mode for the lifetime of the guard.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Spawns the keyboard reader. It exits once the console side hangs up.
pub fn spawn_keyboard(inputs: Sender<Input>, session: SessionFlag) -> io::Result<()> {
    thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || {
            loop {
                match event::poll(Duration::from_millis(50)) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(_) => break,
                }

                let Ok(Event::Key(key)) = event::read() else {
                    continue;
                };
                let Some(input) = translate(key) else {
                    continue;
                };

                if session.is_active() && input != Input::Quit {
                    board::press();
                    continue;
                }

                if inputs.send(input).is_err() {
                    break;
                }
            }
        })?;
    Ok(())
}
