//! Game configuration: compile-time bounds plus the runtime session settings.

use core::fmt;
use core::time::Duration;

use crate::tick::{DEFAULT_SEED, DelayGenerator};

/// Largest number of rounds a session may be configured for.
pub const MAX_ROUNDS: usize = 10;
/// Round count used until the operator changes it.
pub const DEFAULT_ROUND_COUNT: u8 = 5;
/// Shortest randomized delay before the stimulus.
pub const MIN_DELAY_MS: u32 = 1_000;
/// Longest randomized delay before the stimulus.
pub const MAX_DELAY_MS: u32 = 3_000;
/// Time allowed for a response once the stimulus is lit.
pub const TIMEOUT_MS: u32 = 2_000;
/// Responses faster than this are treated as anticipation.
pub const ANTICIPATION_THRESHOLD_MS: u32 = 100;
/// Number of countdown announcements before the randomized delay.
pub const COUNTDOWN_STEPS: u8 = 3;
/// Spacing between countdown announcements.
pub const COUNTDOWN_STEP_MS: u32 = 2_000;
/// How long the success/failure indicator stays lit after a round.
pub const FEEDBACK_HOLD_MS: u32 = 2_000;
/// Pause between the end of one round and the start of the next.
pub const INTER_ROUND_PAUSE_MS: u32 = 2_000;

#[allow(clippy::cast_lossless, reason = "u64::from is not usable in const fn")]
const fn millis(value: u32) -> Duration {
    Duration::from_millis(value as u64)
}

/// Errors returned when applying operator configuration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// Requested round count falls outside `1..=MAX_ROUNDS`.
    RoundCountOutOfRange(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::RoundCountOutOfRange(value) => {
                write!(f, "round count {value} outside 1-{MAX_ROUNDS}")
            }
        }
    }
}

/// Settings that persist across rounds for the lifetime of the process.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SessionConfig {
    round_count: u8,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub timeout: Duration,
    pub anticipation_threshold: Duration,
    pub countdown_steps: u8,
    pub countdown_step: Duration,
    pub feedback_hold: Duration,
    pub inter_round_pause: Duration,
    pub seed: u32,
}

impl SessionConfig {
    pub const fn new() -> Self {
        Self {
            round_count: DEFAULT_ROUND_COUNT,
            min_delay: millis(MIN_DELAY_MS),
            max_delay: millis(MAX_DELAY_MS),
            timeout: millis(TIMEOUT_MS),
            anticipation_threshold: millis(ANTICIPATION_THRESHOLD_MS),
            countdown_steps: COUNTDOWN_STEPS,
            countdown_step: millis(COUNTDOWN_STEP_MS),
            feedback_hold: millis(FEEDBACK_HOLD_MS),
            inter_round_pause: millis(INTER_ROUND_PAUSE_MS),
            seed: DEFAULT_SEED,
        }
    }

    /// Configuration with every pause shortened to zero, keeping the
    /// measurement thresholds. Handy for scripted runs.
    pub const fn without_pauses() -> Self {
        let mut config = Self::new();
        config.countdown_steps = 0;
        config.countdown_step = Duration::ZERO;
        config.feedback_hold = Duration::ZERO;
        config.inter_round_pause = Duration::ZERO;
        config
    }

    pub const fn round_count(&self) -> u8 {
        self.round_count
    }

    /// Applies a new round count, leaving the previous value in place when the
    /// request is out of range.
    pub fn set_round_count(&mut self, requested: u32) -> Result<u8, ConfigError> {
        let valid = u8::try_from(requested)
            .ok()
            .filter(|count| (1..=MAX_ROUNDS).contains(&usize::from(*count)))
            .ok_or(ConfigError::RoundCountOutOfRange(requested))?;
        self.round_count = valid;
        Ok(valid)
    }

    /// Builder-style variant of [`Self::set_round_count`].
    pub fn with_round_count(mut self, requested: u32) -> Result<Self, ConfigError> {
        self.set_round_count(requested)?;
        Ok(self)
    }

    pub const fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Creates a delay generator seeded from this configuration.
    pub const fn delay_generator(&self) -> DelayGenerator {
        DelayGenerator::new(self.seed)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
