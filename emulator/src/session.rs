use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::{Duration, Instant as HostInstant};

use reaction_core::console::text::CLEAR_SCREEN;
use reaction_core::console::{Console, ConsoleAction, text};
use reaction_core::game::{Game, GameEvent};
use reaction_core::indicators::{IndicatorDriver, LampTest};
use reaction_core::ResponseCapture;
use reaction_core::round::RoundEvent;

use crate::board::{LATCH, TICKS};
use crate::input::{Input, SessionFlag};

/// Sleep between sequencer polls outside the response window.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// How the session loop ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SessionEnd {
    /// Operator picked "Exit" from the menu.
    Exited,
    /// Quit key pressed or the input source closed.
    Interrupted,
}

/// Console front-end for the emulator: feeds input bytes to the shared
/// [`Console`] and runs sessions against the host board.
pub struct Session<W: Write, L: IndicatorDriver> {
    console: Console,
    out: ConsoleOut<W>,
    indicators: L,
    keyboard: SessionFlag,
}

impl<W: Write, L: IndicatorDriver> Session<W, L> {
    pub fn new(
        game: Game,
        out: W,
        transcript: Option<TranscriptLogger>,
        indicators: L,
        keyboard: SessionFlag,
    ) -> Self {
        Self {
            console: Console::new(game),
            out: ConsoleOut::new(out, transcript),
            indicators,
            keyboard,
        }
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Runs the menu loop until the operator exits or input stops.
    pub fn run(&mut self, inputs: &Receiver<Input>) -> io::Result<SessionEnd> {
        render(&mut self.out, |out| self.console.start(out))?;

        loop {
            let byte = match inputs.recv() {
                Ok(Input::Byte(byte)) => byte,
                Ok(Input::Quit) | Err(_) => return Ok(SessionEnd::Interrupted),
            };
            self.out.record_input(byte)?;

            let action = render_action(&mut self.out, |out| self.console.handle_byte(byte, out))?;
            match action {
                ConsoleAction::None => {}
                ConsoleAction::Play => {
                    // Keys typed during the session were button presses, not menu input.
                    if self.play(inputs)? == Play::Quit || quit_requested(inputs) {
                        self.abandon();
                        return Ok(SessionEnd::Interrupted);
                    }
                    render(&mut self.out, |out| self.console.finish_session(out))?;
                }
                ConsoleAction::Exit => {
                    self.indicators.all_off();
                    return Ok(SessionEnd::Exited);
                }
            }
        }
    }

    fn play(&mut self, inputs: &Receiver<Input>) -> io::Result<Play> {
        self.keyboard.set(true);
        let result = self.play_rounds(inputs);
        self.keyboard.set(false);
        result
    }

    fn abandon(&mut self) {
        LATCH.disarm();
        self.indicators.all_off();
    }

    fn play_rounds(&mut self, inputs: &Receiver<Input>) -> io::Result<Play> {
        let game = self.console.game_mut();
        let started = game.begin_session();
        narrate(&mut self.out, &started)?;

        narrate(&mut self.out, &GameEvent::LampTestStarted)?;
        let mut lamp_test = LampTest::new(TICKS.now());
        while !lamp_test.drive(TICKS.now(), &mut self.indicators) {
            if quit_requested(inputs) {
                return Ok(Play::Quit);
            }
            thread::sleep(POLL_INTERVAL);
        }
        narrate(&mut self.out, &GameEvent::LampTestFinished)?;

        while let Some(mut slot) = game.next_round() {
            narrate(
                &mut self.out,
                &GameEvent::RoundStarted {
                    number: slot.number,
                    of: slot.of,
                },
            )?;
            slot.sequencer
                .start(TICKS.now(), &LATCH, &mut self.indicators)
                .map_err(|err| io::Error::other(err.to_string()))?;

            let outcome = loop {
                if quit_requested(inputs) {
                    return Ok(Play::Quit);
                }
                match slot.sequencer.drive(TICKS.now(), &LATCH, &mut self.indicators) {
                    Some(RoundEvent::Finished(outcome)) => break outcome,
                    Some(event) => narrate(&mut self.out, &GameEvent::Round(event))?,
                    None if slot.sequencer.state().is_waiting() => thread::yield_now(),
                    None => thread::sleep(POLL_INTERVAL),
                }
            };
            game.record(outcome)
                .map_err(|err| io::Error::other(err.to_string()))?;
        }

        let summary = game.summary();
        narrate(&mut self.out, &GameEvent::SessionFinished(summary))?;
        Ok(Play::Finished)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Play {
    Finished,
    Quit,
}

/// Empties the queue, reporting whether a quit key was among the drained
/// input.
fn quit_requested(inputs: &Receiver<Input>) -> bool {
    let mut quit = false;
    while let Ok(input) = inputs.try_recv() {
        quit |= input == Input::Quit;
    }
    quit
}

fn narrate<W: Write>(out: &mut ConsoleOut<W>, event: &GameEvent) -> io::Result<()> {
    render(out, |out| text::write_game_event(out, event))
}

fn render<W, F>(out: &mut ConsoleOut<W>, draw: F) -> io::Result<()>
where
    W: Write,
    F: FnOnce(&mut ConsoleOut<W>) -> fmt::Result,
{
    render_action(out, draw)
}

fn render_action<W, F, T>(out: &mut ConsoleOut<W>, draw: F) -> io::Result<T>
where
    W: Write,
    F: FnOnce(&mut ConsoleOut<W>) -> Result<T, fmt::Error>,
{
    let result = draw(out);
    out.finish(result)
}

/// `fmt::Write` adapter over the terminal that mirrors complete lines into
/// the transcript.
pub struct ConsoleOut<W: Write> {
    writer: W,
    transcript: Option<TranscriptLogger>,
    started_at: HostInstant,
    pending_line: String,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleOut<W> {
    fn new(writer: W, transcript: Option<TranscriptLogger>) -> Self {
        Self {
            writer,
            transcript,
            started_at: HostInstant::now(),
            pending_line: String::new(),
            error: None,
        }
    }

    fn record_input(&mut self, byte: u8) -> io::Result<()> {
        let elapsed = self.started_at.elapsed();
        match self.transcript.as_mut() {
            Some(transcript) => transcript.append_line(elapsed, TranscriptRole::Operator, &describe_key(byte)),
            None => Ok(()),
        }
    }

    /// Converts the outcome of a rendering pass into an I/O result and
    /// flushes the terminal.
    fn finish<T>(&mut self, result: Result<T, fmt::Error>) -> io::Result<T> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        let value = result.map_err(|_| io::Error::other("console rendering failed"))?;
        self.writer.flush()?;
        Ok(value)
    }

    fn write_through(&mut self, s: &str) -> io::Result<()> {
        self.writer.write_all(s.as_bytes())?;

        let Some(transcript) = self.transcript.as_mut() else {
            return Ok(());
        };
        self.pending_line.push_str(s);
        while let Some(end) = self.pending_line.find("\r\n") {
            let line: String = self.pending_line.drain(..end + 2).collect();
            let line = line.trim_end_matches("\r\n").replace(CLEAR_SCREEN, "");
            transcript.append_line(self.started_at.elapsed(), TranscriptRole::Device, &line)?;
        }
        Ok(())
    }
}

impl<W: Write> fmt::Write for ConsoleOut<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if let Err(err) = self.write_through(s) {
            self.error = Some(err);
            return Err(fmt::Error);
        }
        Ok(())
    }
}

fn describe_key(byte: u8) -> String {
    match byte {
        b'\r' | b'\n' => "key <enter>".to_string(),
        0x08 | 0x7f => "key <backspace>".to_string(),
        b' '..=b'~' => format!("key '{}'", char::from(byte)),
        other => format!("key 0x{other:02x}"),
    }
}

/// Appends timestamped console lines to a log file.
pub struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    pub fn open(path: &Path, header: &str) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header(header)?;
        Ok(logger)
    }

    fn write_header(&mut self, header: &str) -> io::Result<()> {
        writeln!(self.writer, "# {header}")?;
        writeln!(
            self.writer,
            "# Timestamps are milliseconds since session start"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Operator,
    Device,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Operator => "KEY >",
            TranscriptRole::Device => "DEV <",
        }
    }
}
