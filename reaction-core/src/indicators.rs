//! Indicator outputs (stimulus, success, failure) shared by all targets.
//!
//! The game only needs each lamp to be switched on, off, or toggled
//! independently; firmware maps them to GPIO outputs and the emulator renders
//! them in the terminal.

use core::time::Duration;

use crate::tick::Tick;

/// Logical indicator lamps.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Indicator {
    /// Stimulus lamp (red LED on the reference board).
    Ready,
    /// Valid response feedback (green LED).
    Success,
    /// Anticipation or timeout feedback (blue LED).
    Failure,
}

impl Indicator {
    pub const ALL: [Indicator; 3] = [Indicator::Ready, Indicator::Success, Indicator::Failure];

    pub const fn as_index(self) -> usize {
        match self {
            Indicator::Ready => 0,
            Indicator::Success => 1,
            Indicator::Failure => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Indicator::Ready => "red",
            Indicator::Success => "green",
            Indicator::Failure => "blue",
        }
    }

    const fn bit(self) -> u8 {
        1 << self.as_index()
    }
}

/// Abstraction over the physical indicator drivers.
pub trait IndicatorDriver {
    /// Drives the indicator to the requested level.
    fn set(&mut self, indicator: Indicator, lit: bool);

    /// Inverts the indicator's current level.
    fn toggle(&mut self, indicator: Indicator);

    /// Turns every indicator off.
    fn all_off(&mut self) {
        for indicator in Indicator::ALL {
            self.set(indicator, false);
        }
    }
}

/// Bitmask of lit indicators (1 == on).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct IndicatorMask(u8);

impl IndicatorMask {
    pub const fn dark() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_lit(self, indicator: Indicator) -> bool {
        self.0 & indicator.bit() != 0
    }

    pub const fn with(self, indicator: Indicator, lit: bool) -> Self {
        if lit {
            Self(self.0 | indicator.bit())
        } else {
            Self(self.0 & !indicator.bit())
        }
    }
}

impl IndicatorDriver for IndicatorMask {
    fn set(&mut self, indicator: Indicator, lit: bool) {
        *self = self.with(indicator, lit);
    }

    fn toggle(&mut self, indicator: Indicator) {
        self.0 ^= indicator.bit();
    }
}

/// Spacing between lamps during the lamp test.
pub const LAMP_TEST_STEP: Duration = Duration::from_millis(500);

/// Order in which the lamp test lights the indicators (red, blue, green).
pub const LAMP_TEST_ORDER: [Indicator; 3] = [Indicator::Ready, Indicator::Failure, Indicator::Success];

/// Start-of-game lamp test: lights each lamp in [`LAMP_TEST_ORDER`] one step
/// apart, and turns everything off one step after the last lamp.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LampTest {
    started_at: Tick,
    step: Duration,
    lit: usize,
    finished: bool,
}

impl LampTest {
    pub const fn new(started_at: Tick) -> Self {
        Self::with_step(started_at, LAMP_TEST_STEP)
    }

    pub const fn with_step(started_at: Tick, step: Duration) -> Self {
        Self {
            started_at,
            step,
            lit: 0,
            finished: false,
        }
    }

    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advances the lamp test; returns `true` once all lamps are off again.
    pub fn drive<D: IndicatorDriver + ?Sized>(&mut self, now: Tick, indicators: &mut D) -> bool {
        if self.finished {
            return true;
        }

        let elapsed = now.elapsed_since(self.started_at);
        while self.lit < LAMP_TEST_ORDER.len() && elapsed >= self.offset(self.lit) {
            indicators.set(LAMP_TEST_ORDER[self.lit], true);
            self.lit += 1;
        }

        if elapsed >= self.offset(LAMP_TEST_ORDER.len()) {
            indicators.all_off();
            self.finished = true;
        }

        self.finished
    }

    fn offset(&self, steps: usize) -> Duration {
        self.step
            .saturating_mul(u32::try_from(steps).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_tracks_independent_indicators() {
        let mut mask = IndicatorMask::dark();
        mask.set(Indicator::Ready, true);
        mask.set(Indicator::Failure, true);
        assert!(mask.is_lit(Indicator::Ready));
        assert!(!mask.is_lit(Indicator::Success));
        assert!(mask.is_lit(Indicator::Failure));

        mask.toggle(Indicator::Ready);
        mask.toggle(Indicator::Success);
        assert!(!mask.is_lit(Indicator::Ready));
        assert!(mask.is_lit(Indicator::Success));

        mask.all_off();
        assert_eq!(mask, IndicatorMask::dark());
    }

    #[test]
    fn lamp_test_lights_each_lamp_in_turn() {
        let mut mask = IndicatorMask::dark();
        let mut test = LampTest::new(Tick::from_millis(1_000));

        assert!(!test.drive(Tick::from_millis(1_000), &mut mask));
        assert_eq!(mask.bits(), 0b001);

        assert!(!test.drive(Tick::from_millis(1_499), &mut mask));
        assert_eq!(mask.bits(), 0b001);

        assert!(!test.drive(Tick::from_millis(1_500), &mut mask));
        assert!(mask.is_lit(Indicator::Failure));
        assert!(!mask.is_lit(Indicator::Success));

        assert!(!test.drive(Tick::from_millis(2_000), &mut mask));
        assert_eq!(mask.bits(), 0b111);

        assert!(test.drive(Tick::from_millis(2_500), &mut mask));
        assert_eq!(mask, IndicatorMask::dark());
        assert!(test.is_finished());
    }
}
