mod board;
mod input;
mod session;

use std::env;
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use reaction_core::{Game, SessionConfig};

use board::{BotResponder, TerminalIndicators, Ticker};
use input::{RawModeGuard, SessionFlag};
use session::{Session, SessionEnd, TranscriptLogger};

const USAGE: &str = "Usage: reaction-emulator [--seed <n>] [--bot <ms>] [--transcript <path>]";

#[derive(Debug, Default)]
struct Options {
    seed: Option<u32>,
    bot: Option<Duration>,
    transcript: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    let options = parse_options(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let mut game = Game::new(SessionConfig::default());
    if let Some(seed) = options.seed {
        game.reseed(seed);
    }

    let transcript = match &options.transcript {
        Some(path) => Some(TranscriptLogger::open(
            path,
            "Reaction timer console transcript",
        )?),
        None => None,
    };

    let _ticker = Ticker::spawn()?;
    let _bot = options.bot.map(BotResponder::spawn).transpose()?;

    let end = {
        let _raw = RawModeGuard::enable()?;
        let keyboard = SessionFlag::default();
        let (sender, receiver) = mpsc::channel();
        input::spawn_keyboard(sender, keyboard.clone())?;

        let indicators = TerminalIndicators::new(io::stdout());
        let mut session = Session::new(game, io::stdout(), transcript, indicators, keyboard);
        session.run(&receiver)?
    };

    if end == SessionEnd::Interrupted {
        println!("Session closed.");
    }
    Ok(())
}

fn parse_options<I>(args: I) -> Result<Options, String>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg, None),
        };

        let mut value = || {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| format!("Expected value after {flag}"))
        };

        match flag.as_str() {
            "--seed" => {
                let raw = value()?;
                options.seed = Some(raw.parse().map_err(|_| format!("Invalid seed `{raw}`"))?);
            }
            "--bot" => {
                let raw = value()?;
                let millis: u64 = raw
                    .parse()
                    .map_err(|_| format!("Invalid bot reaction time `{raw}`"))?;
                options.bot = Some(Duration::from_millis(millis));
            }
            "--transcript" => options.transcript = Some(PathBuf::from(value()?)),
            other => return Err(format!("Unknown argument `{other}`")),
        }
    }

    Ok(options)
}
