//! Operator-facing text. Every line ends in CRLF so raw serial terminals
//! render it correctly.

use core::fmt::{self, Write};

use crate::config::MAX_ROUNDS;
use crate::game::GameEvent;
use crate::results::{Classification, ResultsLog, RoundOutcome, Summary};
use crate::round::RoundEvent;

pub const CRLF: &str = "\r\n";

/// Clears the screen and homes the cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub fn write_banner<W: Write + ?Sized>(out: &mut W) -> fmt::Result {
    write!(out, "{CLEAR_SCREEN}--- Reaction Time Game ---{CRLF}{CRLF}")
}

pub fn write_menu<W: Write + ?Sized>(out: &mut W, round_count: u8) -> fmt::Result {
    write!(out, "--- Main Menu ---{CRLF}{CRLF}")?;
    write!(out, "1. Set Number of Rounds (Current: {round_count}){CRLF}{CRLF}")?;
    write!(out, "2. Start Game{CRLF}{CRLF}")?;
    write!(out, "3. View Previous Results{CRLF}{CRLF}")?;
    write!(out, "4. Exit{CRLF}{CRLF}")?;
    out.write_str("Enter your choice: ")
}

pub fn write_round_count_prompt<W: Write + ?Sized>(out: &mut W) -> fmt::Result {
    write!(out, "Enter number of rounds (1-{MAX_ROUNDS}): ")
}

/// Reports the outcome of a round-count change; `current` is the count in
/// effect afterwards.
pub fn write_round_count_result<W: Write + ?Sized>(
    out: &mut W,
    accepted: bool,
    current: u8,
) -> fmt::Result {
    if accepted {
        write!(out, "{CRLF}Number of rounds set to: {current}{CRLF}{CRLF}")
    } else {
        write!(out, "{CRLF}Invalid number, using default: {current}{CRLF}{CRLF}")
    }
}

pub fn write_invalid_choice<W: Write + ?Sized>(out: &mut W) -> fmt::Result {
    write!(out, "{CRLF}Invalid choice, try again.{CRLF}")
}

pub fn write_exit<W: Write + ?Sized>(out: &mut W) -> fmt::Result {
    write!(out, "Exiting...{CRLF}")
}

/// Narrates one step of a running session.
pub fn write_game_event<W: Write + ?Sized>(out: &mut W, event: &GameEvent) -> fmt::Result {
    match event {
        GameEvent::SessionStarted { .. } => {
            write!(out, "{CLEAR_SCREEN}--- Game Starting ---{CRLF}{CRLF}")?;
            write!(
                out,
                "Get ready to press SW1 when the red LED turns on.{CRLF}{CRLF}"
            )
        }
        GameEvent::LampTestStarted => out.write_str("Testing LEDs... "),
        GameEvent::LampTestFinished => write!(out, "LED test complete.{CRLF}{CRLF}"),
        GameEvent::RoundStarted { number, of } => write!(out, "Round {number} of {of} - "),
        GameEvent::Round(event) => write_round_event(out, event),
        GameEvent::SessionFinished(_) => Ok(()),
    }
}

fn write_round_event<W: Write + ?Sized>(out: &mut W, event: &RoundEvent) -> fmt::Result {
    match event {
        RoundEvent::CountdownStep { remaining, total } => {
            if remaining == total {
                out.write_str("Countdown: ")?;
            }
            write!(out, "{remaining} ")
        }
        RoundEvent::RandomDelay(delay) => {
            write!(out, "{CRLF}Random delay: {} ms{CRLF}", delay.as_millis())
        }
        RoundEvent::StimulusOn { .. } => write!(out, "Red LED on! Press SW1!{CRLF}"),
        RoundEvent::Resolved(outcome) => write_resolution(out, outcome),
        RoundEvent::RoundComplete => {
            write!(out, "Round complete. Next round starting...{CRLF}{CRLF}")
        }
        RoundEvent::Finished(_) => Ok(()),
    }
}

fn write_resolution<W: Write + ?Sized>(out: &mut W, outcome: &RoundOutcome) -> fmt::Result {
    match outcome.classification {
        Classification::Valid => {
            write!(out, "Reaction time: {} ms{CRLF}", outcome.elapsed.as_millis())
        }
        Classification::TooFast => write!(out, "Too fast! Anticipated too early.{CRLF}"),
        Classification::TooSlow | Classification::NoResponse => {
            write!(out, "Too slow! No response.{CRLF}")
        }
    }
}

/// Renders the results table, the mean and rating, and the continue prompt.
pub fn write_results<W: Write + ?Sized>(out: &mut W, results: &ResultsLog) -> fmt::Result {
    write!(out, "{CLEAR_SCREEN}--- Game Results ---{CRLF}{CRLF}")?;

    for (index, outcome) in results.outcomes().iter().enumerate() {
        write!(out, "Round {}: ", index + 1)?;
        match outcome.classification {
            Classification::Valid => write!(out, "{} ms{CRLF}", outcome.elapsed.as_millis())?,
            Classification::TooFast => write!(out, "Anticipated too early{CRLF}")?,
            Classification::TooSlow => write!(out, "Too slow{CRLF}")?,
            Classification::NoResponse => write!(out, "No response{CRLF}")?,
        }
    }

    match results.summary() {
        Summary::NoData => write!(out, "{CRLF}No valid responses recorded.{CRLF}")?,
        Summary::Mean { mean, rating, .. } => {
            write!(out, "{CRLF}Average reaction time: {} ms{CRLF}", mean.as_millis())?;
            write!(out, "{CRLF}--- Performance Rating ---{CRLF}{CRLF}")?;
            write!(out, "{}{CRLF}", rating.message())?;
        }
    }

    write!(out, "{CRLF}Press any key to continue...")
}
