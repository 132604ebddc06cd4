use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::collections::VecDeque;

use reaction_core::config::SessionConfig;
use reaction_core::console::{Console, ConsoleAction, text};
use reaction_core::game::{Game, GameEvent};
use reaction_core::indicators::{Indicator, IndicatorDriver, IndicatorMask};
use reaction_core::latch::CaptureLatch;
use reaction_core::results::{Classification, Rating, RoundOutcome, Summary};
use reaction_core::round::{RoundEvent, RoundSequencer, RoundTiming, run_round};
use reaction_core::tick::{Tick, TickSource};

/// Simulated subject: presses `offsets` milliseconds after each stimulus.
#[derive(Clone, Debug)]
struct Press {
    offsets: Vec<u32>,
}

impl Press {
    fn none() -> Self {
        Self { offsets: Vec::new() }
    }

    fn after(ms: u32) -> Self {
        Self { offsets: vec![ms] }
    }

    fn bouncing(offsets: &[u32]) -> Self {
        Self {
            offsets: offsets.to_vec(),
        }
    }
}

/// Tick source that advances one millisecond per read and delivers scripted
/// edges to the latch once it sees a stimulus.
struct ScriptedClock<'a> {
    now: Cell<u32>,
    latch: &'a CaptureLatch,
    script: RefCell<VecDeque<Press>>,
    onset: Cell<Option<u32>>,
    current: RefCell<Press>,
}

impl<'a> ScriptedClock<'a> {
    fn new(start: u32, latch: &'a CaptureLatch, script: impl IntoIterator<Item = Press>) -> Self {
        Self {
            now: Cell::new(start),
            latch,
            script: RefCell::new(script.into_iter().collect()),
            onset: Cell::new(None),
            current: RefCell::new(Press::none()),
        }
    }
}

impl TickSource for ScriptedClock<'_> {
    fn now(&self) -> Tick {
        let previous = self.now.get();
        let now = previous.wrapping_add(1);
        self.now.set(now);

        if self.onset.get().is_none() && self.latch.is_armed() {
            // The sequencer armed with the previous reading.
            self.onset.set(Some(previous));
            let press = self.script.borrow_mut().pop_front().unwrap_or_else(Press::none);
            *self.current.borrow_mut() = press;
        }

        if let Some(onset) = self.onset.get() {
            let offset = now.wrapping_sub(onset);
            if self.current.borrow().offsets.contains(&offset) {
                self.latch.on_edge(Tick::from_millis(now));
            }
            if offset > 10_000 {
                self.onset.set(None);
            }
        }

        Tick::from_millis(now)
    }
}

/// Indicator driver that also remembers every transition.
#[derive(Default)]
struct RecordingIndicators {
    mask: IndicatorMask,
    history: Vec<(Indicator, bool)>,
}

impl IndicatorDriver for RecordingIndicators {
    fn set(&mut self, indicator: Indicator, lit: bool) {
        if self.mask.is_lit(indicator) != lit {
            self.history.push((indicator, lit));
        }
        self.mask.set(indicator, lit);
    }

    fn toggle(&mut self, indicator: Indicator) {
        let lit = !self.mask.is_lit(indicator);
        self.set(indicator, lit);
    }
}

fn three_round_game() -> Game {
    Game::new(SessionConfig::default().with_round_count(3).expect("3 rounds"))
}

#[test]
fn three_round_session_averages_valid_rounds() {
    let latch = CaptureLatch::new();
    let clock = ScriptedClock::new(0, &latch, [Press::none(), Press::after(180), Press::after(220)]);
    let mut indicators = RecordingIndicators::default();
    let mut game = three_round_game();
    let mut events = Vec::new();

    let summary = game
        .play_blocking(&clock, &latch, &mut indicators, |event| events.push(event))
        .expect("session fits in the log");

    let outcomes = game.results().outcomes();
    assert_eq!(
        outcomes,
        &[
            RoundOutcome::no_response(),
            RoundOutcome::valid(Duration::from_millis(180)),
            RoundOutcome::valid(Duration::from_millis(220)),
        ]
    );
    assert_eq!(summary.mean(), Some(Duration::from_millis(200)));
    assert_eq!(summary.rating(), Some(Rating::Good));
    assert!(matches!(summary, Summary::Mean { valid_rounds: 2, .. }));

    let stimuli = events
        .iter()
        .filter(|event| matches!(event, GameEvent::Round(RoundEvent::StimulusOn { .. })))
        .count();
    assert_eq!(stimuli, 3);
    assert_eq!(events.first(), Some(&GameEvent::SessionStarted { rounds: 3 }));
    assert_eq!(events.last(), Some(&GameEvent::SessionFinished(summary)));
    assert_eq!(indicators.mask, IndicatorMask::dark());
}

#[test]
fn feedback_lamp_matches_classification() {
    let latch = CaptureLatch::new();
    let clock = ScriptedClock::new(0, &latch, [Press::after(60), Press::after(300), Press::none()]);
    let mut indicators = RecordingIndicators::default();
    let mut game = three_round_game();

    game.play_blocking(&clock, &latch, &mut indicators, |_| {})
        .expect("session fits in the log");

    let classifications: Vec<_> = game
        .results()
        .outcomes()
        .iter()
        .map(|outcome| outcome.classification)
        .collect();
    assert_eq!(
        classifications,
        [Classification::TooFast, Classification::Valid, Classification::NoResponse]
    );

    let feedback: Vec<_> = indicators
        .history
        .iter()
        .filter(|(indicator, lit)| *lit && *indicator != Indicator::Ready)
        .map(|(indicator, _)| *indicator)
        .collect();
    // Lamp test lights failure then success once, then one feedback lamp per round.
    assert_eq!(
        feedback,
        [
            Indicator::Failure,
            Indicator::Success,
            Indicator::Failure,
            Indicator::Success,
            Indicator::Failure,
        ]
    );
}

#[test]
fn switch_bounce_keeps_first_edge_only() {
    let latch = CaptureLatch::new();
    let clock = ScriptedClock::new(0, &latch, [Press::bouncing(&[250, 251, 253, 260])]);
    let mut indicators = IndicatorMask::dark();
    let config = SessionConfig::without_pauses();
    let mut sequencer = RoundSequencer::new(RoundTiming::from_config(&config), Duration::from_millis(1_000));

    let outcome = run_round(&mut sequencer, &clock, &latch, &mut indicators, |_| {});
    assert_eq!(outcome, RoundOutcome::valid(Duration::from_millis(250)));
}

#[test]
fn round_spanning_counter_wrap_measures_correctly() {
    let latch = CaptureLatch::new();
    let clock = ScriptedClock::new(u32::MAX - 1_200, &latch, [Press::after(190)]);
    let mut indicators = IndicatorMask::dark();
    let config = SessionConfig::without_pauses();
    let mut sequencer = RoundSequencer::new(RoundTiming::from_config(&config), Duration::from_millis(1_100));

    let mut onset = None;
    let outcome = run_round(&mut sequencer, &clock, &latch, &mut indicators, |event| {
        if let RoundEvent::StimulusOn { onset: at } = event {
            onset = Some(at);
        }
    });

    assert_eq!(outcome, RoundOutcome::valid(Duration::from_millis(190)));
    let onset = onset.expect("stimulus was shown");
    assert!(onset.as_millis() > u32::MAX - 200 || onset.as_millis() < 200);
}

#[test]
fn console_narrates_a_full_session() {
    let latch = CaptureLatch::new();
    let clock = ScriptedClock::new(0, &latch, [Press::after(140)]);
    let mut indicators = IndicatorMask::dark();
    let config = SessionConfig::default().with_round_count(1).expect("1 round");
    let mut console = Console::new(Game::new(config));
    let mut out = String::new();

    console.start(&mut out).expect("string sink");
    let action = console.handle_byte(b'2', &mut out).expect("string sink");
    assert_eq!(action, ConsoleAction::Play);

    console
        .game_mut()
        .play_blocking(&clock, &latch, &mut indicators, |event| {
            text::write_game_event(&mut out, &event).expect("string sink");
        })
        .expect("session fits in the log");
    console.finish_session(&mut out).expect("string sink");

    assert!(out.contains("Testing LEDs... LED test complete.\r\n"));
    assert!(out.contains("Round 1 of 1 - Countdown: 3 2 1 \r\nRandom delay: "));
    assert!(out.contains("Red LED on! Press SW1!\r\nReaction time: 140 ms\r\n"));
    assert!(out.contains("Round complete. Next round starting...\r\n"));
    assert!(out.contains("Round 1: 140 ms\r\n"));
    assert!(out.contains("Excellent! Pro gamer level!\r\n"));
    assert!(out.ends_with("Press any key to continue..."));
}
