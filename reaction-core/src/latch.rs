//! Single-shot response capture shared between the edge interrupt and the
//! round sequencer.
//!
//! The latch is a handful of atomics so it can live in a `static` and be
//! touched from interrupt context without locks. The interrupt side only ever
//! calls [`CaptureLatch::on_edge`]; the foreground arms, polls, and disarms.
//! A compare-and-swap on the state word guarantees that at most one edge per
//! arm/disarm cycle is recorded: later edges (including switch bounce) are
//! acknowledged and dropped.

use core::time::Duration;

use portable_atomic::{AtomicU8, AtomicU32, Ordering};

use crate::tick::Tick;

const IDLE: u8 = 0;
const ARMED: u8 = 1;
const LATCHING: u8 = 2;
const CAPTURED: u8 = 3;

/// Observable latch state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LatchState {
    /// Capture disabled and no response recorded.
    Idle,
    /// Capture enabled, waiting for the first qualifying edge.
    Armed,
    /// A response was recorded; the elapsed time is frozen until re-armed.
    Captured(Duration),
}

/// Result of delivering an edge to the latch.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EdgeDisposition {
    /// The edge was the first one of the round and its delta was recorded.
    Recorded(Duration),
    /// Capture was not enabled, or a response had already been recorded.
    Ignored,
}

/// Capture surface the round sequencer drives.
pub trait ResponseCapture {
    /// Clears any previous capture, records `onset`, and enables capture.
    fn arm(&self, onset: Tick);

    /// Disables capture. Idempotent; leaves an existing capture readable.
    fn disarm(&self);

    /// Returns the captured reaction time, if a response arrived.
    fn poll(&self) -> Option<Duration>;

    /// Disables capture and discards any previous response.
    fn reset(&self);
}

/// Interrupt-shared capture latch.
#[derive(Debug)]
pub struct CaptureLatch {
    state: AtomicU8,
    onset: AtomicU32,
    elapsed: AtomicU32,
}

impl CaptureLatch {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
            onset: AtomicU32::new(0),
            elapsed: AtomicU32::new(0),
        }
    }

    /// Returns `true` while an edge would be recorded.
    pub fn is_armed(&self) -> bool {
        self.state.load(Ordering::Acquire) == ARMED
    }

    /// Snapshot of the latch for diagnostics and tests.
    pub fn state(&self) -> LatchState {
        match self.state.load(Ordering::Acquire) {
            ARMED | LATCHING => LatchState::Armed,
            CAPTURED => LatchState::Captured(self.captured_elapsed()),
            _ => LatchState::Idle,
        }
    }

    /// Interrupt-side entry point for a qualifying (falling) edge at `now`.
    pub fn on_edge(&self, now: Tick) -> EdgeDisposition {
        if self
            .state
            .compare_exchange(ARMED, LATCHING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return EdgeDisposition::Ignored;
        }

        let onset = Tick::from_millis(self.onset.load(Ordering::Relaxed));
        let elapsed = now.elapsed_since(onset);
        self.elapsed
            .store(saturating_millis(elapsed), Ordering::Relaxed);
        self.state.store(CAPTURED, Ordering::Release);
        EdgeDisposition::Recorded(elapsed)
    }

    fn captured_elapsed(&self) -> Duration {
        Duration::from_millis(u64::from(self.elapsed.load(Ordering::Relaxed)))
    }
}

impl Default for CaptureLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCapture for CaptureLatch {
    fn arm(&self, onset: Tick) {
        // Onset must be visible before the state flips to ARMED.
        self.elapsed.store(0, Ordering::Relaxed);
        self.onset.store(onset.as_millis(), Ordering::Relaxed);
        self.state.store(ARMED, Ordering::Release);
    }

    fn disarm(&self) {
        let _ = self
            .state
            .compare_exchange(ARMED, IDLE, Ordering::AcqRel, Ordering::Acquire);
    }

    fn poll(&self) -> Option<Duration> {
        if self.state.load(Ordering::Acquire) == CAPTURED {
            Some(self.captured_elapsed())
        } else {
            None
        }
    }

    fn reset(&self) {
        self.state.store(IDLE, Ordering::Release);
        self.elapsed.store(0, Ordering::Relaxed);
    }
}

impl<C: ResponseCapture + ?Sized> ResponseCapture for &C {
    fn arm(&self, onset: Tick) {
        (**self).arm(onset);
    }

    fn disarm(&self) {
        (**self).disarm();
    }

    fn poll(&self) -> Option<Duration> {
        (**self).poll()
    }

    fn reset(&self) {
        (**self).reset();
    }
}

fn saturating_millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
