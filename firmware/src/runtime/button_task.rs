use reaction_core::latch::EdgeDisposition;

use crate::capture;
use crate::hw::ResponseButton;
use crate::log;

#[embassy_executor::task]
pub async fn run(mut button: ResponseButton<'static>) -> ! {
    loop {
        button.pressed().await;
        // Bounce and presses outside a stimulus window land here as `Ignored`.
        if let EdgeDisposition::Recorded(elapsed) = capture::on_button_edge() {
            log::edge_captured(elapsed);
        }
    }
}
