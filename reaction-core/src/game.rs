//! Session bookkeeping: owns the configuration, the delay generator, and the
//! results log, and hands out one [`RoundSequencer`] per round.

use crate::config::{ConfigError, SessionConfig};
use crate::indicators::{IndicatorDriver, LampTest};
use crate::latch::ResponseCapture;
use crate::results::{RecordError, ResultsLog, RoundOutcome, Summary};
use crate::round::{RoundEvent, RoundSequencer, RoundTiming, run_round};
use crate::tick::{DelayGenerator, TickSource};

/// Narration points of a full session, in the order they occur.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GameEvent {
    SessionStarted { rounds: u8 },
    LampTestStarted,
    LampTestFinished,
    RoundStarted { number: u8, of: u8 },
    Round(RoundEvent),
    SessionFinished(Summary),
}

/// A round handed out by [`Game::next_round`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RoundSlot {
    /// One-based round number.
    pub number: u8,
    pub of: u8,
    pub sequencer: RoundSequencer,
}

/// Game state that outlives individual rounds.
#[derive(Clone, Debug)]
pub struct Game {
    config: SessionConfig,
    delays: DelayGenerator,
    results: ResultsLog,
    rounds_issued: u8,
}

impl Game {
    pub const fn new(config: SessionConfig) -> Self {
        Self {
            delays: config.delay_generator(),
            config,
            results: ResultsLog::new(),
            rounds_issued: 0,
        }
    }

    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub const fn results(&self) -> &ResultsLog {
        &self.results
    }

    pub const fn round_count(&self) -> u8 {
        self.config.round_count()
    }

    /// Changes the number of rounds for the next session.
    pub fn set_round_count(&mut self, requested: u32) -> Result<u8, ConfigError> {
        self.config.set_round_count(requested)
    }

    /// Restarts the delay sequence from `seed`.
    pub fn reseed(&mut self, seed: u32) {
        self.config.seed = seed;
        self.delays.reseed(seed);
    }

    /// Clears the previous session's results. The delay generator keeps its
    /// state so consecutive sessions draw fresh delays.
    pub fn begin_session(&mut self) -> GameEvent {
        self.results.begin_session(self.config.round_count());
        self.rounds_issued = 0;
        GameEvent::SessionStarted {
            rounds: self.config.round_count(),
        }
    }

    /// Draws the next round's delay and returns its sequencer, or `None` once
    /// every configured round has been handed out.
    pub fn next_round(&mut self) -> Option<RoundSlot> {
        let of = self.config.round_count();
        if self.rounds_issued >= of {
            return None;
        }
        self.rounds_issued += 1;

        let delay = self
            .delays
            .random_delay(self.config.min_delay, self.config.max_delay);
        Some(RoundSlot {
            number: self.rounds_issued,
            of,
            sequencer: RoundSequencer::new(RoundTiming::from_config(&self.config), delay),
        })
    }

    pub fn record(&mut self, outcome: RoundOutcome) -> Result<(), RecordError> {
        self.results.record(outcome)
    }

    pub fn is_session_complete(&self) -> bool {
        self.results.is_complete()
    }

    pub fn summary(&self) -> Summary {
        self.results.summary()
    }

    /// Plays a full session by spinning on `clock`: lamp test, then every
    /// round back to back.
    pub fn play_blocking<T, C, I, F>(
        &mut self,
        clock: &T,
        capture: &C,
        indicators: &mut I,
        mut on_event: F,
    ) -> Result<Summary, RecordError>
    where
        T: TickSource + ?Sized,
        C: ResponseCapture + ?Sized,
        I: IndicatorDriver + ?Sized,
        F: FnMut(GameEvent),
    {
        on_event(self.begin_session());

        on_event(GameEvent::LampTestStarted);
        let mut lamp_test = LampTest::new(clock.now());
        while !lamp_test.drive(clock.now(), indicators) {
            core::hint::spin_loop();
        }
        on_event(GameEvent::LampTestFinished);

        while let Some(mut slot) = self.next_round() {
            on_event(GameEvent::RoundStarted {
                number: slot.number,
                of: slot.of,
            });
            let outcome = run_round(&mut slot.sequencer, clock, capture, indicators, |event| {
                on_event(GameEvent::Round(event))
            });
            self.record(outcome)?;
        }

        let summary = self.summary();
        on_event(GameEvent::SessionFinished(summary));
        Ok(summary)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick::DEFAULT_SEED;

    #[test]
    fn next_round_stops_after_configured_count() {
        let mut game = Game::new(SessionConfig::default().with_round_count(2).unwrap());
        game.begin_session();

        let first = game.next_round().unwrap();
        let second = game.next_round().unwrap();
        assert_eq!((first.number, first.of), (1, 2));
        assert_eq!((second.number, second.of), (2, 2));
        assert!(game.next_round().is_none());
    }

    #[test]
    fn delays_follow_the_seeded_generator() {
        let config = SessionConfig::default();
        let mut reference = DelayGenerator::new(DEFAULT_SEED);
        let mut game = Game::new(config);
        game.begin_session();

        for _ in 0..config.round_count() {
            let slot = game.next_round().unwrap();
            let expected = reference.random_delay(config.min_delay, config.max_delay);
            assert_eq!(slot.sequencer.delay(), expected);
        }
    }

    #[test]
    fn new_session_resets_results_but_not_delays() {
        let mut game = Game::new(SessionConfig::default().with_round_count(1).unwrap());
        game.begin_session();
        let first_delay = game.next_round().unwrap().sequencer.delay();
        game.record(RoundOutcome::no_response()).unwrap();
        assert!(game.is_session_complete());

        game.begin_session();
        assert!(game.results().is_empty());
        let second_delay = game.next_round().unwrap().sequencer.delay();

        let mut reference = DelayGenerator::default();
        let config = game.config();
        assert_eq!(first_delay, reference.random_delay(config.min_delay, config.max_delay));
        assert_eq!(second_delay, reference.random_delay(config.min_delay, config.max_delay));
    }

    #[test]
    fn round_count_change_applies_to_next_session() {
        let mut game = Game::default();
        assert_eq!(game.set_round_count(3), Ok(3));
        assert!(game.set_round_count(0).is_err());
        assert_eq!(game.round_count(), 3);
        assert_eq!(game.begin_session(), GameEvent::SessionStarted { rounds: 3 });
    }
}
