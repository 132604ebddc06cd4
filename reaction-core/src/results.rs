//! Round outcomes and the per-session results aggregator.

use core::fmt;
use core::time::Duration;

use heapless::Vec;

use crate::config::MAX_ROUNDS;

/// How a round was resolved.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Classification {
    /// Response at or above the anticipation threshold and before the timeout.
    Valid,
    /// Response below the anticipation threshold (false start).
    TooFast,
    /// Response after the timeout. The timeout preempts capture, so the
    /// sequencer never produces this; kept so stored logs can express it.
    TooSlow,
    /// No response before the timeout.
    NoResponse,
}

impl Classification {
    pub const fn is_valid(self) -> bool {
        matches!(self, Classification::Valid)
    }
}

/// Result of a single round.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RoundOutcome {
    pub elapsed: Duration,
    pub classification: Classification,
}

impl RoundOutcome {
    pub const fn valid(elapsed: Duration) -> Self {
        Self {
            elapsed,
            classification: Classification::Valid,
        }
    }

    pub const fn too_fast(elapsed: Duration) -> Self {
        Self {
            elapsed,
            classification: Classification::TooFast,
        }
    }

    pub const fn no_response() -> Self {
        Self {
            elapsed: Duration::ZERO,
            classification: Classification::NoResponse,
        }
    }
}

/// Qualitative rating bands, fastest first.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Rating {
    Excellent,
    VeryGood,
    Good,
    Ok,
    TooSlow,
}

/// Upper bounds (exclusive) for every band but the last.
pub const RATING_THRESHOLDS: [(Duration, Rating); 4] = [
    (Duration::from_millis(150), Rating::Excellent),
    (Duration::from_millis(200), Rating::VeryGood),
    (Duration::from_millis(250), Rating::Good),
    (Duration::from_millis(300), Rating::Ok),
];

impl Rating {
    /// Maps a mean reaction time onto its band.
    pub fn for_mean(mean: Duration) -> Self {
        RATING_THRESHOLDS
            .iter()
            .find(|(limit, _)| mean < *limit)
            .map_or(Rating::TooSlow, |(_, rating)| *rating)
    }

    pub const fn message(self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent! Pro gamer level!",
            Rating::VeryGood => "Very good! Above average!",
            Rating::Good => "Good! Average human reaction time.",
            Rating::Ok => "Ok. Not too bad.",
            Rating::TooSlow => "Too slow. Try to be faster!",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rating::Excellent => "excellent",
            Rating::VeryGood => "very good",
            Rating::Good => "good",
            Rating::Ok => "ok",
            Rating::TooSlow => "too slow",
        };
        f.write_str(label)
    }
}

/// Aggregate view over a session's outcomes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Summary {
    /// No valid responses were recorded.
    NoData,
    /// Mean of valid responses and its rating band.
    Mean {
        mean: Duration,
        rating: Rating,
        valid_rounds: usize,
    },
}

impl Summary {
    pub const fn mean(&self) -> Option<Duration> {
        match self {
            Summary::NoData => None,
            Summary::Mean { mean, .. } => Some(*mean),
        }
    }

    pub const fn rating(&self) -> Option<Rating> {
        match self {
            Summary::NoData => None,
            Summary::Mean { rating, .. } => Some(*rating),
        }
    }
}

/// Errors raised when recording outcomes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RecordError {
    /// The session already holds its configured number of rounds.
    LogFull,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::LogFull => f.write_str("results log full"),
        }
    }
}

/// Append-only, fixed-capacity log of the current session's outcomes.
#[derive(Clone, Debug, Default)]
pub struct ResultsLog {
    outcomes: Vec<RoundOutcome, MAX_ROUNDS>,
    limit: usize,
}

impl ResultsLog {
    pub const fn new() -> Self {
        Self {
            outcomes: Vec::new(),
            limit: 0,
        }
    }

    /// Clears previous outcomes and accepts up to `round_count` new ones.
    pub fn begin_session(&mut self, round_count: u8) {
        self.outcomes.clear();
        self.limit = usize::from(round_count).min(MAX_ROUNDS);
    }

    /// Appends an outcome, rejecting it once the session is complete.
    pub fn record(&mut self, outcome: RoundOutcome) -> Result<(), RecordError> {
        if self.outcomes.len() >= self.limit {
            return Err(RecordError::LogFull);
        }
        self.outcomes
            .push(outcome)
            .map_err(|_| RecordError::LogFull)
    }

    pub fn outcomes(&self) -> &[RoundOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Returns `true` once the configured number of rounds has been recorded.
    pub fn is_complete(&self) -> bool {
        self.outcomes.len() >= self.limit
    }

    /// Averages the valid outcomes only; other classifications are excluded.
    pub fn summary(&self) -> Summary {
        let (total, valid_rounds) = self
            .outcomes
            .iter()
            .filter(|outcome| outcome.classification.is_valid())
            .fold((Duration::ZERO, 0usize), |(total, count), outcome| {
                (total.saturating_add(outcome.elapsed), count + 1)
            });

        let Some(divisor) = u32::try_from(valid_rounds).ok().filter(|count| *count > 0) else {
            return Summary::NoData;
        };

        // Whole milliseconds, truncated.
        let mean_ms = (total / divisor).as_millis();
        let mean = Duration::from_millis(u64::try_from(mean_ms).unwrap_or(u64::MAX));
        Summary::Mean {
            mean,
            rating: Rating::for_mean(mean),
            valid_rounds,
        }
    }
}
