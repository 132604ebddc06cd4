use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_stm32::usart::{BufferedUart, Config as UartConfig, DataBits, Parity, StopBits};
use embassy_sync::channel::Channel;

use crate::console::{CONSOLE_BAUD, ConsoleInput};
use crate::hw::{self, CORE_CLOCK_HZ, LedBank, ResponseButton};

mod button_task;
mod console_rx_task;
mod game_task;

const UART_BUFFER_SIZE: usize = 256;

static mut UART_TX_BUFFER: [u8; UART_BUFFER_SIZE] = [0; UART_BUFFER_SIZE];
static mut UART_RX_BUFFER: [u8; UART_BUFFER_SIZE] = [0; UART_BUFFER_SIZE];

embassy_stm32::bind_interrupts!(struct UartIrqs {
    USART3_4_5_6_LPUART1 => embassy_stm32::usart::BufferedInterruptHandler<hal::peripherals::USART5>;
});

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static CONSOLE_INPUT: ConsoleInput = Channel::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA5,
        PA6,
        PA7,
        PB0,
        PB1,
        EXTI0,
        USART5,
        ..
    } = hal::init(config);

    let core = cortex_m::Peripherals::take().expect("core peripherals already taken");
    hw::start_tick_timer(core.SYST, CORE_CLOCK_HZ).expect("failed to start SysTick");

    let leds = LedBank::new(
        Output::new(PA5, Level::Low, Speed::Low),
        Output::new(PA6, Level::Low, Speed::Low),
        Output::new(PA7, Level::Low, Speed::Low),
    );
    let button = ResponseButton::new(ExtiInput::new(PA0, EXTI0, Pull::Up));

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = CONSOLE_BAUD;
    uart_config.data_bits = DataBits::DataBits8;
    uart_config.stop_bits = StopBits::STOP1;
    uart_config.parity = Parity::ParityNone;

    let uart = unsafe {
        BufferedUart::new(
            USART5,
            PB1,
            PB0,
            &mut UART_TX_BUFFER,
            &mut UART_RX_BUFFER,
            UartIrqs,
            uart_config,
        )
        .expect("failed to initialize console UART")
    };
    let (uart_tx, uart_rx) = uart.split();

    crate::log::boot(crate::capture::now().as_millis());

    spawner
        .spawn(button_task::run(button))
        .expect("failed to spawn button task");

    spawner
        .spawn(console_rx_task::run(uart_rx, CONSOLE_INPUT.sender()))
        .expect("failed to spawn console RX task");

    spawner
        .spawn(game_task::run(uart_tx, CONSOLE_INPUT.receiver(), leds))
        .expect("failed to spawn game task");

    core::future::pending::<()>().await;
}
