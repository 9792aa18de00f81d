use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use grove_core::clock::SystemClock;
use grove_core::io::command::Command;
use grove_core::io::frame::make_frame;
use grove_core::{GameConfig, GameSummary, Session};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "groved",
    about = "Real-time game session driven from stdin, frames on stdout"
)]
struct Args {
    /// Path to a game config JSON document. Defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the config's random seed.
    #[arg(long, value_name = "NUMBER")]
    seed: Option<u64>,

    /// Milliseconds between scheduler pumps.
    #[arg(long = "tick-ms", default_value_t = 25u64)]
    tick_ms: u64,

    /// Milliseconds between frames written to stdout.
    #[arg(long = "frame-ms", default_value_t = 1_000u64)]
    frame_ms: u64,

    /// Leave the session paused until a `resume` command arrives.
    #[arg(long = "start-paused")]
    start_paused: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load_from_path(path)
            .with_context(|| format!("failed to load config {:?}", path))?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn handle_line(session: &mut Session, line: &str) -> Flow {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Flow::Continue;
    }
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(err) => {
            warn!(input = line, error = %err, "ignoring unreadable command");
            return Flow::Continue;
        }
    };
    match command {
        Command::Quit => return Flow::Quit,
        Command::Wait(_) => {
            warn!("wait only applies to batch runs; real time keeps going");
        }
        other => match other.apply(session) {
            Ok(()) => {}
            Err(err) if err.is_decline() => info!(command = ?other, %err, "purchase declined"),
            Err(err) => warn!(command = ?other, %err, "command refused"),
        },
    }
    Flow::Continue
}

async fn write_frame<W>(out: &mut W, session: &mut Session) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let events = session.drain_events();
    let line = make_frame(session, events).to_ndjson()?;
    out.write_all(line.as_bytes())
        .await
        .context("failed to write frame")?;
    out.flush().await.context("failed to flush frame")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let clock = SystemClock::new();
    let mut session = Session::new(config)?.with_game_over_sink(|summary: GameSummary| {
        info!(
            score = summary.score,
            days = summary.days,
            "the land is gone; send `reset` to play again"
        )
    });
    if !args.start_paused {
        session.resume();
    }

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let mut pump = interval(Duration::from_millis(args.tick_ms.max(1)));
    pump.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frames = interval(Duration::from_millis(args.frame_ms.max(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(tick_ms = args.tick_ms, frame_ms = args.frame_ms, "starting groved");
    loop {
        tokio::select! {
            _ = pump.tick() => session.pump(&clock),
            _ = frames.tick() => {
                session.pump(&clock);
                write_frame(&mut stdout, &mut session).await?;
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("failed to read stdin")? {
                    Some(line) => {
                        session.pump(&clock);
                        if handle_line(&mut session, &line) == Flow::Quit {
                            break;
                        }
                    }
                    None => {
                        info!("stdin closed; running until interrupted");
                        stdin_open = false;
                    }
                }
            }
            result = &mut shutdown => {
                result.context("failed to listen for ctrl-c")?;
                info!("interrupted");
                break;
            }
        }
    }

    session.pump(&clock);
    write_frame(&mut stdout, &mut session).await?;
    info!(score = session.state().score, days = session.state().days, "groved stopped");
    Ok(())
}
