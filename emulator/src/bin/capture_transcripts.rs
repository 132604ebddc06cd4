use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

#[allow(dead_code)]
#[path = "../board.rs"]
mod board;
#[allow(dead_code)]
#[path = "../input.rs"]
mod input;
#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use board::{BotResponder, Ticker};
use input::{Input, SessionFlag};
use reaction_core::indicators::IndicatorMask;
use reaction_core::{Game, SessionConfig};
use session::{Session, TranscriptLogger};

const DEFAULT_PATH: &str = "transcripts/bot-session.log";
const BOT_REACTION: Duration = Duration::from_millis(180);
const SCRIPT_ROUNDS: u32 = 3;

/// Records a scripted three-round session answered by the bot.
fn main() -> io::Result<()> {
    let path = env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_PATH), PathBuf::from);

    let config = SessionConfig::without_pauses()
        .with_round_count(SCRIPT_ROUNDS)
        .map_err(|err| io::Error::other(err.to_string()))?;
    let transcript = TranscriptLogger::open(&path, "Scripted bot session")?;

    let _ticker = Ticker::spawn()?;
    let _bot = BotResponder::spawn(BOT_REACTION)?;

    let keyboard = SessionFlag::default();
    let (sender, receiver) = mpsc::channel();
    spawn_operator(sender, keyboard.clone())?;

    let mut session = Session::new(
        Game::new(config),
        io::sink(),
        Some(transcript),
        IndicatorMask::dark(),
        keyboard,
    );
    session.run(&receiver)?;

    println!("transcript written to {}", path.display());
    Ok(())
}

/// Starts a game, then views the results and exits once the game is over.
fn spawn_operator(inputs: Sender<Input>, keyboard: SessionFlag) -> io::Result<()> {
    thread::Builder::new()
        .name("operator".into())
        .spawn(move || {
            if send_all(&inputs, b"2").is_err() {
                return;
            }
            while !keyboard.is_active() {
                thread::sleep(Duration::from_millis(5));
            }
            while keyboard.is_active() {
                thread::sleep(Duration::from_millis(5));
            }
            // Let the session drain its stale input before typing again.
            thread::sleep(Duration::from_millis(100));
            let _ = send_all(&inputs, b" 3 4");
        })?;
    Ok(())
}

fn send_all(inputs: &Sender<Input>, bytes: &[u8]) -> Result<(), mpsc::SendError<Input>> {
    for byte in bytes {
        inputs.send(Input::Byte(*byte))?;
    }
    Ok(())
}
