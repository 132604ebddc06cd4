use crate::indicators::IndicatorDriver;
use crate::latch::ResponseCapture;
use crate::results::RoundOutcome;
use crate::tick::TickSource;

use super::{RoundEvent, RoundSequencer, RoundState};

/// Spins `sequencer` on `clock` until the round finishes.
///
/// Every transition is handed to `on_event`, including the final
/// [`RoundEvent::Finished`]. A sequencer still in `Idle` is started first;
/// one that already completed returns its outcome immediately.
pub fn run_round<T, C, I, F>(
    sequencer: &mut RoundSequencer,
    clock: &T,
    capture: &C,
    indicators: &mut I,
    mut on_event: F,
) -> RoundOutcome
where
    T: TickSource + ?Sized,
    C: ResponseCapture + ?Sized,
    I: IndicatorDriver + ?Sized,
    F: FnMut(RoundEvent),
{
    match sequencer.state() {
        RoundState::Complete(outcome) => return outcome,
        RoundState::Idle => {
            // Only fails when not idle, which was just ruled out.
            let _ = sequencer.start(clock.now(), capture, indicators);
        }
        _ => {}
    }

    loop {
        match sequencer.drive(clock.now(), capture, indicators) {
            Some(RoundEvent::Finished(outcome)) => {
                on_event(RoundEvent::Finished(outcome));
                return outcome;
            }
            Some(event) => on_event(event),
            None => core::hint::spin_loop(),
        }
    }
}
