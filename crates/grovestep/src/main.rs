use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use grove_core::io::command::{load_script, Command};
use grove_core::{run_script, GameConfig, Session};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "grovestep",
    about = "Batch runner for deterministic NDJSON game frames"
)]
struct Args {
    /// Path to a game config JSON document. Defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Command script, one command per line. Without one the session is
    /// simply resumed.
    #[arg(long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Override the config's random seed.
    #[arg(long, value_name = "NUMBER")]
    seed: Option<u64>,

    /// Keep simulating until this many milliseconds have passed.
    #[arg(long = "duration-ms", value_name = "MILLIS")]
    duration_ms: Option<u64>,

    /// Simulated milliseconds between frames.
    #[arg(long = "frame-ms", default_value_t = 1_000u64)]
    frame_ms: u64,

    /// Output NDJSON file path.
    #[arg(long)]
    out: PathBuf,
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

fn load_commands(args: &Args) -> Result<Vec<Command>> {
    match &args.script {
        Some(path) => load_script(path),
        None => Ok(vec![Command::Resume]),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let commands = load_commands(&args)?;
    let mut session = Session::new(config)?;

    let frame_file =
        File::create(&args.out).with_context(|| format!("failed to create {:?}", args.out))?;
    let mut frame_writer = BufWriter::new(frame_file);

    let mut frames = 0u64;
    run_script(
        &mut session,
        &commands,
        args.frame_ms,
        args.duration_ms,
        |frame| {
            let line = frame.to_ndjson()?;
            frame_writer.write_all(line.as_bytes())?;
            frames += 1;
            Ok(())
        },
    )?;
    frame_writer.flush()?;

    info!(
        frames,
        t = session.now(),
        score = session.state().score,
        game_over = session.is_over(),
        "run finished"
    );
    Ok(())
}
