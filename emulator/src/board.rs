//! Host stand-ins for the board: a ticker thread instead of SysTick, a shared
//! capture latch fed by the keyboard (or a bot), and indicators shown in the
//! terminal title.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant as HostInstant};

use crossterm::QueueableCommand;
use crossterm::terminal::SetTitle;
use reaction_core::indicators::{Indicator, IndicatorDriver, IndicatorMask};
use reaction_core::latch::{CaptureLatch, EdgeDisposition};
use reaction_core::tick::{TICK_PERIOD, Tick, TickCounter};

/// Millisecond counter advanced by the ticker thread.
pub static TICKS: TickCounter = TickCounter::new();

/// Response latch shared with the keyboard and bot threads.
pub static LATCH: CaptureLatch = CaptureLatch::new();

/// Delivers a button press to the latch.
pub fn press() -> EdgeDisposition {
    LATCH.on_edge(TICKS.now())
}

/// Handle for the background ticker; stops it on drop.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Starts advancing [`TICKS`] in step with the wall clock.
    pub fn spawn() -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("ticker".into())
            .spawn(move || run_ticker(&flag))?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_ticker(stop: &AtomicBool) {
    let started = HostInstant::now();
    let mut issued: u128 = 0;
    while !stop.load(Ordering::Acquire) {
        // Catch up after oversleeping so the counter tracks real milliseconds.
        let due = started.elapsed().as_millis();
        while issued < due {
            TICKS.increment();
            issued += 1;
        }
        thread::sleep(TICK_PERIOD);
    }
}

/// Presses the button a fixed time after every stimulus.
pub struct BotResponder {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl BotResponder {
    pub fn spawn(reaction: Duration) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("bot".into())
            .spawn(move || run_bot(&flag, reaction))?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for BotResponder {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_bot(stop: &AtomicBool, reaction: Duration) {
    let reaction = u32::try_from(reaction.as_millis()).unwrap_or(u32::MAX);
    let mut onset: Option<Tick> = None;
    while !stop.load(Ordering::Acquire) {
        match (LATCH.is_armed(), onset) {
            (true, None) => onset = Some(TICKS.now()),
            (true, Some(seen)) => {
                if TICKS.now().as_millis().wrapping_sub(seen.as_millis()) >= reaction {
                    press();
                }
            }
            (false, Some(_)) => onset = None,
            (false, None) => {}
        }
        thread::sleep(Duration::from_micros(200));
    }
}

/// Indicator driver that mirrors lamp state into the terminal title.
pub struct TerminalIndicators<W: Write> {
    mask: IndicatorMask,
    out: W,
}

impl<W: Write> TerminalIndicators<W> {
    pub fn new(out: W) -> Self {
        Self {
            mask: IndicatorMask::dark(),
            out,
        }
    }

    pub fn mask(&self) -> IndicatorMask {
        self.mask
    }

    fn render(&mut self) {
        let title = format!("reaction-emulator {}", lamp_summary(self.mask));
        // The title is cosmetic; a terminal that rejects it changes nothing.
        let _ = self.out.queue(SetTitle(title)).and_then(|out| out.flush());
    }
}

impl<W: Write> IndicatorDriver for TerminalIndicators<W> {
    fn set(&mut self, indicator: Indicator, lit: bool) {
        let next = self.mask.with(indicator, lit);
        if next != self.mask {
            self.mask = next;
            self.render();
        }
    }

    fn toggle(&mut self, indicator: Indicator) {
        let lit = !self.mask.is_lit(indicator);
        self.set(indicator, lit);
    }
}

/// Compact lamp readout such as `[red:on green:off blue:off]`.
pub fn lamp_summary(mask: IndicatorMask) -> String {
    let lamps: Vec<String> = Indicator::ALL
        .iter()
        .map(|indicator| {
            let state = if mask.is_lit(*indicator) { "on" } else { "off" };
            format!("{}:{state}", indicator.label())
        })
        .collect();
    format!("[{}]", lamps.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lamp_summary_lists_every_indicator() {
        let mask = IndicatorMask::dark().with(Indicator::Ready, true);
        assert_eq!(lamp_summary(mask), "[red:on green:off blue:off]");
    }

    #[test]
    fn terminal_indicators_track_mask() {
        let mut lamps = TerminalIndicators::new(Vec::new());
        lamps.set(Indicator::Failure, true);
        lamps.toggle(Indicator::Ready);
        assert!(lamps.mask().is_lit(Indicator::Failure));
        assert!(lamps.mask().is_lit(Indicator::Ready));
        lamps.all_off();
        assert_eq!(lamps.mask(), IndicatorMask::dark());
    }
}
