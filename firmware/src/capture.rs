#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Interrupt-shared timing state for the firmware target.
//!
//! The SysTick exception is the only writer of [`TICKS`]; the button task is
//! the only caller of [`on_button_edge`]. Everything else reads.

use reaction_core::latch::{CaptureLatch, EdgeDisposition};
use reaction_core::tick::{Tick, TickCounter};

/// Free-running millisecond counter advanced by SysTick.
pub static TICKS: TickCounter = TickCounter::new();

/// Response latch armed by the game task and fed by the button task.
pub static LATCH: CaptureLatch = CaptureLatch::new();

/// SysTick body: advance the millisecond counter.
#[inline]
pub fn on_tick() {
    TICKS.increment();
}

/// Falling edge on the response input.
pub fn on_button_edge() -> EdgeDisposition {
    LATCH.on_edge(TICKS.now())
}

pub fn now() -> Tick {
    TICKS.now()
}
