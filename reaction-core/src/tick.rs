//! Millisecond tick source shared by firmware and host targets.
//!
//! The counter is a free-running `u32` incremented once per 1 ms timer
//! interrupt. Every duration in the game is measured as a wrapping difference
//! between two tick values, so a counter that rolls over mid-round still
//! yields the right delta.

use core::time::Duration;

use portable_atomic::{AtomicU32, Ordering};

/// Tick period of the reaction timer.
pub const TICK_PERIOD: Duration = Duration::from_millis(1);

/// Interrupts per second required for a 1 ms period.
pub const TICKS_PER_SECOND: u32 = 1_000;

/// One reading of the millisecond counter.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Tick(u32);

impl Tick {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(millis: u32) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, modulo the counter width.
    pub fn elapsed_since(self, earlier: Tick) -> Duration {
        Duration::from_millis(u64::from(self.0.wrapping_sub(earlier.0)))
    }

    /// Returns `true` once strictly more than `span` has passed since `since`.
    pub fn exceeds(self, since: Tick, span: Duration) -> bool {
        let elapsed = u128::from(self.0.wrapping_sub(since.0));
        elapsed > span.as_millis()
    }

    /// Returns `true` once at least `span` has passed since `since`.
    pub fn reached(self, since: Tick, span: Duration) -> bool {
        let elapsed = u128::from(self.0.wrapping_sub(since.0));
        elapsed >= span.as_millis()
    }
}

/// Read access to the millisecond counter.
pub trait TickSource {
    /// Returns the current counter value without side effects.
    fn now(&self) -> Tick;
}

/// Interrupt-owned millisecond counter.
///
/// The timer interrupt is the only writer; every other context reads a single
/// 32-bit atomic snapshot.
#[derive(Debug, Default)]
pub struct TickCounter {
    ticks: AtomicU32,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Starts the counter at an arbitrary value (used to exercise wraparound).
    pub const fn starting_at(start: Tick) -> Self {
        Self {
            ticks: AtomicU32::new(start.0),
        }
    }

    /// Advances the counter by one period. Call only from the tick interrupt.
    #[inline]
    pub fn increment(&self) {
        // Single writer: a load/store pair avoids a CAS loop on cores without one.
        let next = self.ticks.load(Ordering::Relaxed).wrapping_add(1);
        self.ticks.store(next, Ordering::Release);
    }

    pub fn now(&self) -> Tick {
        Tick(self.ticks.load(Ordering::Acquire))
    }
}

impl TickSource for TickCounter {
    fn now(&self) -> Tick {
        TickCounter::now(self)
    }
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> Tick {
        (**self).now()
    }
}

/// Reload value that makes a down-counting timer fire once per millisecond.
///
/// Returns `None` when the clock is too slow to produce a 1 ms period.
pub const fn reload_value(clock_hz: u32) -> Option<u32> {
    let per_tick = clock_hz / TICKS_PER_SECOND;
    if per_tick == 0 {
        None
    } else {
        Some(per_tick - 1)
    }
}

/// Seed the delay generator starts from unless reseeded.
pub const DEFAULT_SEED: u32 = 12_345;

const LCG_MULTIPLIER: u32 = 1_103_515_245;
const LCG_INCREMENT: u32 = 12_345;
const LCG_MASK: u32 = 0x7FFF_FFFF;

/// Linear-congruential generator producing the randomized pre-stimulus delay.
///
/// Not suitable for anything beyond breaking the subject's rhythm: the same
/// seed replays the same sequence on every run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DelayGenerator {
    state: u32,
}

impl DelayGenerator {
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub const fn state(&self) -> u32 {
        self.state
    }

    pub fn reseed(&mut self, seed: u32) {
        self.state = seed;
    }

    fn next_raw(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT)
            & LCG_MASK;
        self.state
    }

    /// Draws a delay uniformly (modulo bias accepted) from `[min, max]`.
    ///
    /// Bounds given in the wrong order are swapped.
    pub fn random_delay(&mut self, min: Duration, max: Duration) -> Duration {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        let low_ms = clamp_millis(low);
        let high_ms = clamp_millis(high);
        let span = u64::from(high_ms - low_ms) + 1;
        let offset = u64::from(self.next_raw()) % span;
        Duration::from_millis(u64::from(low_ms) + offset)
    }
}

impl Default for DelayGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

fn clamp_millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_wraps_across_counter_overflow() {
        let before = Tick::from_millis(u32::MAX - 9);
        let after = Tick::from_millis(40);
        assert_eq!(after.elapsed_since(before), Duration::from_millis(50));
    }

    #[test]
    fn exceeds_is_strict_and_reached_is_inclusive() {
        let start = Tick::from_millis(1_000);
        let span = Duration::from_millis(2_000);
        assert!(!Tick::from_millis(3_000).exceeds(start, span));
        assert!(Tick::from_millis(3_001).exceeds(start, span));
        assert!(Tick::from_millis(3_000).reached(start, span));
        assert!(!Tick::from_millis(2_999).reached(start, span));
    }

    #[test]
    fn counter_increments_by_one_and_wraps() {
        let counter = TickCounter::starting_at(Tick::from_millis(u32::MAX));
        counter.increment();
        assert_eq!(counter.now(), Tick::ZERO);
        counter.increment();
        assert_eq!(counter.now(), Tick::from_millis(1));
    }

    #[test]
    fn reload_value_matches_one_millisecond_period() {
        assert_eq!(reload_value(16_000_000), Some(15_999));
        assert_eq!(reload_value(50_000_000), Some(49_999));
        assert_eq!(reload_value(999), None);
    }

    #[test]
    fn default_seed_reproduces_first_draws() {
        let mut generator = DelayGenerator::default();
        let first = generator.random_delay(Duration::from_millis(1_000), Duration::from_millis(3_000));
        let expected_state = 12_345u32
            .wrapping_mul(1_103_515_245)
            .wrapping_add(12_345)
            & 0x7FFF_FFFF;
        assert_eq!(generator.state(), expected_state);
        assert_eq!(
            first,
            Duration::from_millis(1_000 + u64::from(expected_state % 2_001))
        );
    }

    #[test]
    fn random_delay_stays_within_bounds_for_many_seeds() {
        let min = Duration::from_millis(1_000);
        let max = Duration::from_millis(3_000);
        for seed in [0, 1, 7, 12_345, 0x7FFF_FFFF, u32::MAX] {
            let mut generator = DelayGenerator::new(seed);
            for _ in 0..500 {
                let delay = generator.random_delay(min, max);
                assert!(delay >= min && delay <= max, "{delay:?} out of range");
            }
        }
    }

    #[test]
    fn random_delay_handles_degenerate_ranges() {
        let mut generator = DelayGenerator::default();
        let fixed = Duration::from_millis(250);
        assert_eq!(generator.random_delay(fixed, fixed), fixed);

        let delay = generator.random_delay(Duration::from_millis(30), Duration::from_millis(10));
        assert!(delay >= Duration::from_millis(10) && delay <= Duration::from_millis(30));
    }
}
