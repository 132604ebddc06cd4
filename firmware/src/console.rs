#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Console plumbing between the UART and the game task.
//!
//! Received bytes travel over [`ConsoleInput`]; the game task renders its
//! replies into a bounded [`ConsoleFrame`] and writes the frame out in one go.

use core::fmt;

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use heapless::String;

/// Depth of the received-byte queue.
pub const CONSOLE_INPUT_DEPTH: usize = 32;

/// Largest block of text rendered between UART writes (the results page).
pub const CONSOLE_FRAME_LEN: usize = 512;

/// Baud rate of the operator console.
pub const CONSOLE_BAUD: u32 = 115_200;

#[cfg(target_os = "none")]
type ConsoleMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type ConsoleMutex = NoopRawMutex;

/// Queue carrying received bytes to the game task.
pub type ConsoleInput = Channel<ConsoleMutex, u8, CONSOLE_INPUT_DEPTH>;

pub type ConsoleInputSender<'a> = Sender<'a, ConsoleMutex, u8, CONSOLE_INPUT_DEPTH>;

pub type ConsoleInputReceiver<'a> = Receiver<'a, ConsoleMutex, u8, CONSOLE_INPUT_DEPTH>;

/// Text rendered for one UART write.
#[derive(Default)]
pub struct ConsoleFrame {
    text: String<CONSOLE_FRAME_LEN>,
    truncated: bool,
}

impl ConsoleFrame {
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            truncated: false,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns `true` if text was dropped because the frame filled up.
    pub const fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.truncated = false;
    }
}

impl fmt::Write for ConsoleFrame {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.text.push_str(s).is_err() {
            self.truncated = true;
            return Err(fmt::Error);
        }
        Ok(())
    }
}

/// Discards bytes typed while a session owned the console.
pub fn drain_stale_input(receiver: &ConsoleInputReceiver<'_>) -> usize {
    let mut dropped = 0;
    while receiver.try_receive().is_ok() {
        dropped += 1;
    }
    dropped
}

#[cfg(test)]
mod tests {
    use core::fmt::Write;

    use super::*;

    #[test]
    fn frame_reports_truncation() {
        let mut frame = ConsoleFrame::new();
        let filler = [b'x'; CONSOLE_FRAME_LEN];
        let filler = core::str::from_utf8(&filler).unwrap();
        frame.write_str(filler).unwrap();
        assert!(frame.write_str("y").is_err());
        assert!(frame.truncated());

        frame.clear();
        assert!(frame.is_empty());
        assert!(!frame.truncated());
    }

    #[test]
    fn results_page_fits_in_one_frame() {
        use core::time::Duration;
        use reaction_core::config::MAX_ROUNDS;
        use reaction_core::console::text;
        use reaction_core::results::{ResultsLog, RoundOutcome};

        let mut log = ResultsLog::new();
        log.begin_session(MAX_ROUNDS as u8);
        for index in 0..MAX_ROUNDS {
            let outcome = if index == 0 {
                RoundOutcome::valid(Duration::from_millis(1_999))
            } else {
                RoundOutcome::too_fast(Duration::from_millis(5))
            };
            log.record(outcome).unwrap();
        }

        let mut frame = ConsoleFrame::new();
        text::write_results(&mut frame, &log).unwrap();
        assert!(!frame.truncated());
    }

    #[test]
    fn drain_empties_the_queue() {
        let input = ConsoleInput::new();
        for byte in b"222" {
            input.try_send(*byte).unwrap();
        }
        assert_eq!(drain_stale_input(&input.receiver()), 3);
        assert!(input.try_receive().is_err());
    }
}
