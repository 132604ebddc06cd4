//! Single-round state machine: countdown, randomized delay, stimulus, and
//! resolution of the response (or the lack of one).
//!
//! The sequencer never blocks. Callers feed it the current [`Tick`] together
//! with the capture latch and indicator driver, and it reports the transitions
//! it took as [`RoundEvent`]s. The firmware runs it from an async task; host
//! tooling can use [`run_round`] to spin it to completion on a [`TickSource`].

use core::fmt;
use core::time::Duration;

use crate::config::SessionConfig;
use crate::indicators::{Indicator, IndicatorDriver};
use crate::latch::ResponseCapture;
use crate::results::RoundOutcome;
use crate::tick::Tick;

mod blocking;

pub use blocking::run_round;

/// Timing parameters a round needs, copied out of the session configuration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RoundTiming {
    pub countdown_steps: u8,
    pub countdown_step: Duration,
    pub timeout: Duration,
    pub anticipation_threshold: Duration,
    pub feedback_hold: Duration,
    pub inter_round_pause: Duration,
}

impl RoundTiming {
    pub const fn from_config(config: &SessionConfig) -> Self {
        Self {
            countdown_steps: config.countdown_steps,
            countdown_step: config.countdown_step,
            timeout: config.timeout,
            anticipation_threshold: config.anticipation_threshold,
            feedback_hold: config.feedback_hold,
            inter_round_pause: config.inter_round_pause,
        }
    }

    /// Classifies a captured reaction time.
    ///
    /// A capture stamped later than the timeout means the deadline passed
    /// before the sequencer observed the latch; it counts as no response.
    pub fn classify(&self, elapsed: Duration) -> RoundOutcome {
        if elapsed > self.timeout {
            RoundOutcome::no_response()
        } else if elapsed < self.anticipation_threshold {
            RoundOutcome::too_fast(elapsed)
        } else {
            RoundOutcome::valid(elapsed)
        }
    }
}

impl From<&SessionConfig> for RoundTiming {
    fn from(config: &SessionConfig) -> Self {
        Self::from_config(config)
    }
}

/// Phases of a round.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RoundState {
    /// Not started.
    Idle,
    /// Counting down; `remaining` announcements are still due.
    Countdown {
        remaining: u8,
        since: Tick,
        announced: bool,
    },
    /// Tail of the countdown: the randomized pre-stimulus delay.
    Delay { since: Tick },
    /// Stimulus lit and capture armed.
    Waiting { onset: Tick },
    /// Outcome decided; the feedback indicator is lit.
    Resolved { outcome: RoundOutcome, since: Tick },
    /// Indicators are dark; pausing before the next round.
    Cooldown { outcome: RoundOutcome, since: Tick },
    /// Terminal state.
    Complete(RoundOutcome),
}

impl RoundState {
    /// Returns `true` while the round still has transitions to take.
    pub const fn is_active(self) -> bool {
        !matches!(self, RoundState::Idle | RoundState::Complete(_))
    }

    /// Returns `true` while the stimulus is lit and a response can be captured.
    pub const fn is_waiting(self) -> bool {
        matches!(self, RoundState::Waiting { .. })
    }
}

/// Transitions reported by [`RoundSequencer::drive`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RoundEvent {
    /// A countdown announcement is due; `remaining` counts down to 1.
    CountdownStep { remaining: u8, total: u8 },
    /// The randomized delay started.
    RandomDelay(Duration),
    /// Capture armed and stimulus lit at `onset`.
    StimulusOn { onset: Tick },
    /// The round was classified and feedback is showing.
    Resolved(RoundOutcome),
    /// Feedback finished; the inter-round pause started.
    RoundComplete,
    /// The pause elapsed and the round is over.
    Finished(RoundOutcome),
}

/// Error returned when starting a sequencer that already ran.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TransitionError {
    pub from: RoundState,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round cannot start from {:?}", self.from)
    }
}

/// Drives one round from countdown through the inter-round pause.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RoundSequencer {
    timing: RoundTiming,
    delay: Duration,
    state: RoundState,
}

impl RoundSequencer {
    /// Creates a sequencer that waits `delay` between the countdown and the
    /// stimulus.
    pub const fn new(timing: RoundTiming, delay: Duration) -> Self {
        Self {
            timing,
            delay,
            state: RoundState::Idle,
        }
    }

    pub const fn state(&self) -> RoundState {
        self.state
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    pub const fn timing(&self) -> &RoundTiming {
        &self.timing
    }

    /// Outcome of the round once it has been classified.
    pub const fn outcome(&self) -> Option<RoundOutcome> {
        match self.state {
            RoundState::Resolved { outcome, .. }
            | RoundState::Cooldown { outcome, .. }
            | RoundState::Complete(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Leaves `Idle`: clears any stale capture and darkens every indicator.
    pub fn start<C, I>(
        &mut self,
        now: Tick,
        capture: &C,
        indicators: &mut I,
    ) -> Result<(), TransitionError>
    where
        C: ResponseCapture + ?Sized,
        I: IndicatorDriver + ?Sized,
    {
        if self.state != RoundState::Idle {
            return Err(TransitionError { from: self.state });
        }

        capture.reset();
        indicators.all_off();
        self.state = RoundState::Countdown {
            remaining: self.timing.countdown_steps,
            since: now,
            announced: false,
        };
        Ok(())
    }

    /// Advances the round to `now`, returning the transition taken, if any.
    ///
    /// At most one transition is taken per call, so a caller that falls
    /// behind catches up over consecutive calls.
    pub fn drive<C, I>(&mut self, now: Tick, capture: &C, indicators: &mut I) -> Option<RoundEvent>
    where
        C: ResponseCapture + ?Sized,
        I: IndicatorDriver + ?Sized,
    {
        match self.state {
            RoundState::Idle | RoundState::Complete(_) => None,
            RoundState::Countdown {
                remaining,
                since,
                announced,
            } => {
                if remaining == 0 {
                    self.state = RoundState::Delay { since: now };
                    return Some(RoundEvent::RandomDelay(self.delay));
                }
                if !announced {
                    self.state = RoundState::Countdown {
                        remaining,
                        since,
                        announced: true,
                    };
                    return Some(RoundEvent::CountdownStep {
                        remaining,
                        total: self.timing.countdown_steps,
                    });
                }
                if now.reached(since, self.timing.countdown_step) {
                    self.state = RoundState::Countdown {
                        remaining: remaining - 1,
                        since: now,
                        announced: false,
                    };
                }
                None
            }
            RoundState::Delay { since } => {
                if !now.reached(since, self.delay) {
                    return None;
                }
                // Armed before the lamp is lit so no early press is measured.
                capture.arm(now);
                indicators.set(Indicator::Ready, true);
                self.state = RoundState::Waiting { onset: now };
                Some(RoundEvent::StimulusOn { onset: now })
            }
            RoundState::Waiting { onset } => {
                let outcome = if let Some(elapsed) = capture.poll() {
                    self.timing.classify(elapsed)
                } else if now.exceeds(onset, self.timing.timeout) {
                    RoundOutcome::no_response()
                } else {
                    return None;
                };

                capture.disarm();
                indicators.set(Indicator::Ready, false);
                let feedback = if outcome.classification.is_valid() {
                    Indicator::Success
                } else {
                    Indicator::Failure
                };
                indicators.set(feedback, true);
                self.state = RoundState::Resolved { outcome, since: now };
                Some(RoundEvent::Resolved(outcome))
            }
            RoundState::Resolved { outcome, since } => {
                if !now.reached(since, self.timing.feedback_hold) {
                    return None;
                }
                indicators.set(Indicator::Success, false);
                indicators.set(Indicator::Failure, false);
                self.state = RoundState::Cooldown { outcome, since: now };
                Some(RoundEvent::RoundComplete)
            }
            RoundState::Cooldown { outcome, since } => {
                if !now.reached(since, self.timing.inter_round_pause) {
                    return None;
                }
                self.state = RoundState::Complete(outcome);
                Some(RoundEvent::Finished(outcome))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorMask;
    use crate::latch::{CaptureLatch, LatchState};
    use crate::results::Classification;

    fn ms(value: u32) -> Tick {
        Tick::from_millis(value)
    }

    fn quick_timing() -> RoundTiming {
        RoundTiming::from_config(&SessionConfig::without_pauses())
    }

    fn started(timing: RoundTiming, delay: u64, latch: &CaptureLatch) -> (RoundSequencer, IndicatorMask) {
        let mut sequencer = RoundSequencer::new(timing, Duration::from_millis(delay));
        let mut mask = IndicatorMask::dark();
        sequencer.start(ms(0), latch, &mut mask).unwrap();
        (sequencer, mask)
    }

    #[test]
    fn countdown_announces_each_step_then_draws_delay() {
        let latch = CaptureLatch::new();
        let timing = RoundTiming::from_config(&SessionConfig::default());
        let (mut sequencer, mut mask) = started(timing, 1_500, &latch);

        assert_eq!(
            sequencer.drive(ms(0), &latch, &mut mask),
            Some(RoundEvent::CountdownStep { remaining: 3, total: 3 })
        );
        assert_eq!(sequencer.drive(ms(1_999), &latch, &mut mask), None);
        assert_eq!(sequencer.drive(ms(2_000), &latch, &mut mask), None);
        assert_eq!(
            sequencer.drive(ms(2_000), &latch, &mut mask),
            Some(RoundEvent::CountdownStep { remaining: 2, total: 3 })
        );
        sequencer.drive(ms(4_000), &latch, &mut mask);
        assert_eq!(
            sequencer.drive(ms(4_000), &latch, &mut mask),
            Some(RoundEvent::CountdownStep { remaining: 1, total: 3 })
        );
        sequencer.drive(ms(6_000), &latch, &mut mask);
        assert_eq!(
            sequencer.drive(ms(6_000), &latch, &mut mask),
            Some(RoundEvent::RandomDelay(Duration::from_millis(1_500)))
        );
        assert!(!latch.is_armed());
        assert_eq!(sequencer.drive(ms(7_499), &latch, &mut mask), None);
        assert_eq!(
            sequencer.drive(ms(7_500), &latch, &mut mask),
            Some(RoundEvent::StimulusOn { onset: ms(7_500) })
        );
        assert!(latch.is_armed());
        assert!(mask.is_lit(Indicator::Ready));
    }

    #[test]
    fn press_before_stimulus_is_ignored() {
        let latch = CaptureLatch::new();
        let (mut sequencer, mut mask) = started(quick_timing(), 1_000, &latch);

        sequencer.drive(ms(0), &latch, &mut mask);
        latch.on_edge(ms(500));
        sequencer.drive(ms(1_000), &latch, &mut mask);
        assert!(sequencer.state().is_waiting());
        assert_eq!(latch.poll(), None);
    }

    #[test]
    fn timeout_is_strictly_after_two_seconds() {
        let latch = CaptureLatch::new();
        let (mut sequencer, mut mask) = started(quick_timing(), 1_000, &latch);
        sequencer.drive(ms(0), &latch, &mut mask);
        sequencer.drive(ms(1_000), &latch, &mut mask);

        assert_eq!(sequencer.drive(ms(3_000), &latch, &mut mask), None);
        assert_eq!(
            sequencer.drive(ms(3_001), &latch, &mut mask),
            Some(RoundEvent::Resolved(RoundOutcome::no_response()))
        );
        assert_eq!(latch.state(), LatchState::Idle);
        assert!(!mask.is_lit(Indicator::Ready));
        assert!(mask.is_lit(Indicator::Failure));
    }

    #[test]
    fn capture_preempts_timeout() {
        let latch = CaptureLatch::new();
        let (mut sequencer, mut mask) = started(quick_timing(), 1_000, &latch);
        sequencer.drive(ms(0), &latch, &mut mask);
        sequencer.drive(ms(1_000), &latch, &mut mask);

        latch.on_edge(ms(2_999));
        let event = sequencer.drive(ms(3_200), &latch, &mut mask);
        assert_eq!(
            event,
            Some(RoundEvent::Resolved(RoundOutcome::valid(Duration::from_millis(1_999))))
        );
        assert!(mask.is_lit(Indicator::Success));
        assert!(!mask.is_lit(Indicator::Failure));
    }

    #[test]
    fn anticipation_threshold_is_inclusive_for_valid() {
        let timing = quick_timing();
        assert_eq!(
            timing.classify(Duration::from_millis(99)).classification,
            Classification::TooFast
        );
        assert_eq!(
            timing.classify(Duration::from_millis(100)).classification,
            Classification::Valid
        );
        assert_eq!(
            timing.classify(Duration::from_millis(2_000)).classification,
            Classification::Valid
        );
        assert_eq!(
            timing.classify(Duration::from_millis(2_001)).classification,
            Classification::NoResponse
        );
    }

    #[test]
    fn feedback_and_pause_run_before_finish() {
        let latch = CaptureLatch::new();
        let mut timing = quick_timing();
        timing.feedback_hold = Duration::from_millis(2_000);
        timing.inter_round_pause = Duration::from_millis(2_000);
        let (mut sequencer, mut mask) = started(timing, 1_000, &latch);
        sequencer.drive(ms(0), &latch, &mut mask);
        sequencer.drive(ms(1_000), &latch, &mut mask);
        latch.on_edge(ms(1_050));

        let outcome = RoundOutcome::too_fast(Duration::from_millis(50));
        assert_eq!(
            sequencer.drive(ms(1_060), &latch, &mut mask),
            Some(RoundEvent::Resolved(outcome))
        );
        assert!(mask.is_lit(Indicator::Failure));
        assert_eq!(sequencer.drive(ms(3_059), &latch, &mut mask), None);
        assert_eq!(
            sequencer.drive(ms(3_060), &latch, &mut mask),
            Some(RoundEvent::RoundComplete)
        );
        assert_eq!(mask, IndicatorMask::dark());
        assert_eq!(sequencer.drive(ms(5_059), &latch, &mut mask), None);
        assert_eq!(
            sequencer.drive(ms(5_060), &latch, &mut mask),
            Some(RoundEvent::Finished(outcome))
        );
        assert_eq!(sequencer.state(), RoundState::Complete(outcome));
        assert_eq!(sequencer.drive(ms(9_000), &latch, &mut mask), None);
    }

    #[test]
    fn start_clears_stale_capture_and_rejects_restart() {
        let latch = CaptureLatch::new();
        latch.arm(ms(0));
        latch.on_edge(ms(10));
        let mut mask = IndicatorMask::from_bits(0b111);

        let mut sequencer = RoundSequencer::new(quick_timing(), Duration::from_millis(1_000));
        sequencer.start(ms(20), &latch, &mut mask).unwrap();
        assert_eq!(latch.state(), LatchState::Idle);
        assert_eq!(mask, IndicatorMask::dark());

        let err = sequencer.start(ms(30), &latch, &mut mask).unwrap_err();
        assert!(matches!(err.from, RoundState::Countdown { .. }));
    }
}
