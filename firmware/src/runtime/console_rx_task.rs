use embassy_stm32::usart::BufferedUartRx;
use embassy_time::{Duration, Timer};
use embedded_io_async::Read;

use crate::console::ConsoleInputSender;
use crate::log;

#[embassy_executor::task]
pub async fn run(
    mut uart_rx: BufferedUartRx<'static>,
    input: ConsoleInputSender<'static>,
) -> ! {
    let mut ingress = [0u8; 16];
    loop {
        match uart_rx.read(&mut ingress).await {
            Ok(count) => {
                for byte in &ingress[..count] {
                    input.send(*byte).await;
                }
            }
            Err(_) => {
                log::console_fault("UART read error");
                Timer::after(Duration::from_millis(5)).await;
            }
        }
    }
}
