use core::fmt;

use embassy_futures::yield_now;
use embassy_stm32::usart::BufferedUartTx;
use embassy_time::{Duration, Timer};
use embedded_io_async::Write;
use reaction_core::console::{Console, ConsoleAction, text};
use reaction_core::game::{Game, GameEvent};
use reaction_core::indicators::{IndicatorDriver, LampTest};
use reaction_core::round::RoundEvent;
use reaction_core::{ResponseCapture, SessionConfig};

use crate::capture::{self, LATCH};
use crate::console::{ConsoleFrame, ConsoleInputReceiver, drain_stale_input};
use crate::hw::LedBank;
use crate::log;

const POLL_INTERVAL: Duration = Duration::from_millis(1);

#[embassy_executor::task]
pub async fn run(
    mut uart_tx: BufferedUartTx<'static>,
    input: ConsoleInputReceiver<'static>,
    mut leds: LedBank<'static>,
) -> ! {
    let mut console = Console::new(Game::new(SessionConfig::default()));
    let mut frame = ConsoleFrame::new();

    render(&mut frame, |out| console.start(out));
    flush(&mut uart_tx, &mut frame).await;

    loop {
        let byte = input.receive().await;
        let action = match console.handle_byte(byte, &mut frame) {
            Ok(action) => action,
            Err(fmt::Error) => {
                log::console_fault("frame overflow");
                ConsoleAction::None
            }
        };
        flush(&mut uart_tx, &mut frame).await;

        match action {
            ConsoleAction::None => {}
            ConsoleAction::Play => {
                play_session(console.game_mut(), &mut uart_tx, &mut frame, &mut leds).await;
                log::stale_input_dropped(drain_stale_input(&input));
                render(&mut frame, |out| console.finish_session(out));
                flush(&mut uart_tx, &mut frame).await;
            }
            ConsoleAction::Exit => {
                leds.all_off();
                LATCH.disarm();
                log::console_exited();
                core::future::pending::<()>().await;
            }
        }
    }
}

async fn play_session(
    game: &mut Game,
    uart_tx: &mut BufferedUartTx<'static>,
    frame: &mut ConsoleFrame,
    leds: &mut LedBank<'static>,
) {
    let started = game.begin_session();
    narrate(uart_tx, frame, &started).await;

    narrate(uart_tx, frame, &GameEvent::LampTestStarted).await;
    let mut lamp_test = LampTest::new(capture::now());
    while !lamp_test.drive(capture::now(), leds) {
        Timer::after(POLL_INTERVAL).await;
    }
    narrate(uart_tx, frame, &GameEvent::LampTestFinished).await;

    while let Some(mut slot) = game.next_round() {
        log::round_started(slot.number, slot.of, slot.sequencer.delay());
        narrate(
            uart_tx,
            frame,
            &GameEvent::RoundStarted {
                number: slot.number,
                of: slot.of,
            },
        )
        .await;

        if slot.sequencer.start(capture::now(), &LATCH, leds).is_err() {
            log::round_not_started(slot.number);
            continue;
        }

        let outcome = loop {
            match slot.sequencer.drive(capture::now(), &LATCH, leds) {
                Some(RoundEvent::Finished(outcome)) => break outcome,
                Some(event) => {
                    if let RoundEvent::Resolved(outcome) = event {
                        log::round_resolved(slot.number, &outcome);
                    }
                    narrate(uart_tx, frame, &GameEvent::Round(event)).await;
                }
                // Keep the timeout check tight while the stimulus is lit.
                None if slot.sequencer.state().is_waiting() => yield_now().await,
                None => Timer::after(POLL_INTERVAL).await,
            }
        };

        if game.record(outcome).is_err() {
            log::results_full(slot.number);
        }
    }

    let summary = game.summary();
    log::session_finished(&summary);
    narrate(uart_tx, frame, &GameEvent::SessionFinished(summary)).await;
}

async fn narrate(uart_tx: &mut BufferedUartTx<'static>, frame: &mut ConsoleFrame, event: &GameEvent) {
    render(frame, |out| text::write_game_event(out, event));
    flush(uart_tx, frame).await;
}

fn render<F>(frame: &mut ConsoleFrame, draw: F)
where
    F: FnOnce(&mut ConsoleFrame) -> fmt::Result,
{
    if draw(frame).is_err() {
        log::console_fault("frame overflow");
    }
}

async fn flush(uart_tx: &mut BufferedUartTx<'static>, frame: &mut ConsoleFrame) {
    if frame.is_empty() {
        return;
    }

    if uart_tx.write_all(frame.as_bytes()).await.is_err() {
        log::console_fault("UART write error");
    } else if uart_tx.flush().await.is_err() {
        log::console_fault("UART flush error");
    }
    frame.clear();
}
