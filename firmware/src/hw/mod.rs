//! Board wiring: SysTick millisecond timer, indicator LEDs, and the response
//! button.

use cortex_m::peripheral::SYST;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m_rt::exception;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Output;
use reaction_core::indicators::{Indicator, IndicatorDriver};
use reaction_core::tick::reload_value;

use crate::capture;

/// Core clock after `hal::init` with the default configuration (HSI16).
pub const CORE_CLOCK_HZ: u32 = 16_000_000;

/// Errors raised while bringing up board peripherals.
#[derive(Copy, Clone, Debug, Eq, PartialEq, defmt::Format)]
pub enum HwError {
    /// The core clock cannot produce a 1 ms SysTick period.
    ClockTooSlow,
}

/// Starts SysTick at one interrupt per millisecond.
pub fn start_tick_timer(mut syst: SYST, clock_hz: u32) -> Result<(), HwError> {
    let reload = reload_value(clock_hz).ok_or(HwError::ClockTooSlow)?;
    syst.disable_counter();
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(reload);
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();
    Ok(())
}

#[exception]
fn SysTick() {
    capture::on_tick();
}

/// Push-pull LED outputs for the three indicators.
pub struct LedBank<'d> {
    ready: Output<'d>,
    success: Output<'d>,
    failure: Output<'d>,
}

impl<'d> LedBank<'d> {
    pub fn new(ready: Output<'d>, success: Output<'d>, failure: Output<'d>) -> Self {
        let mut bank = Self {
            ready,
            success,
            failure,
        };
        bank.all_off();
        bank
    }

    fn output_mut(&mut self, indicator: Indicator) -> &mut Output<'d> {
        match indicator {
            Indicator::Ready => &mut self.ready,
            Indicator::Success => &mut self.success,
            Indicator::Failure => &mut self.failure,
        }
    }
}

impl IndicatorDriver for LedBank<'_> {
    fn set(&mut self, indicator: Indicator, lit: bool) {
        let output = self.output_mut(indicator);
        if lit {
            output.set_high();
        } else {
            output.set_low();
        }
    }

    fn toggle(&mut self, indicator: Indicator) {
        self.output_mut(indicator).toggle();
    }
}

/// Active-low push button with the internal pull-up enabled.
pub struct ResponseButton<'d> {
    input: ExtiInput<'d>,
}

impl<'d> ResponseButton<'d> {
    pub fn new(input: ExtiInput<'d>) -> Self {
        Self { input }
    }

    /// Waits for the next press (falling edge).
    pub async fn pressed(&mut self) {
        self.input.wait_for_falling_edge().await;
    }
}
