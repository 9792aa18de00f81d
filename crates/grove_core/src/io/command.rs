use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};

use crate::clock::Millis;
use crate::error::GameError;
use crate::session::Session;

/// A player command, one per line in scripts and on the daemon's stdin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Reset,
    Plant(usize),
    Collect(usize),
    Spend,
    /// Let simulated time pass. Only meaningful to the batch runner.
    Wait(Millis),
    /// Stop the real-time driver.
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let argument = words.next();
        if let Some(extra) = words.next() {
            bail!("unexpected argument {:?} after {:?}", extra, verb);
        }

        let number = |what: &str| -> Result<u64> {
            let raw = argument.with_context(|| format!("{} needs {}", verb, what))?;
            raw.parse::<u64>()
                .with_context(|| format!("{} expects {}, got {:?}", verb, what, raw))
        };
        let bare = |command: Command| -> Result<Command> {
            match argument {
                Some(extra) => bail!("{} takes no argument, got {:?}", verb, extra),
                None => Ok(command),
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "pause" => bare(Command::Pause),
            "resume" => bare(Command::Resume),
            "reset" => bare(Command::Reset),
            "spend" => bare(Command::Spend),
            "quit" => bare(Command::Quit),
            "plant" => Ok(Command::Plant(number("a tile index")? as usize)),
            "collect" => Ok(Command::Collect(number("a tile index")? as usize)),
            "wait" => Ok(Command::Wait(number("a duration in milliseconds")?)),
            other => bail!("unknown command {:?}", other),
        }
    }
}

impl Command {
    /// Apply a session-level command. `Wait` and `Quit` belong to the driver
    /// and do nothing here.
    pub fn apply(self, session: &mut Session) -> Result<(), GameError> {
        match self {
            Command::Pause => session.pause(),
            Command::Resume => session.resume(),
            Command::Reset => session.reset(),
            Command::Plant(tile) => {
                session.purchase_tree(tile)?;
            }
            Command::Collect(tile) => {
                session.collect(tile)?;
            }
            Command::Spend => {
                session.spend_oxygen()?;
            }
            Command::Wait(_) | Command::Quit => {}
        }
        Ok(())
    }
}

/// Parse a command script. Blank lines and `#` comments are skipped.
pub fn parse_script(text: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = match line.split_once('#') {
            Some((before, _)) => before,
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        let command = line
            .parse::<Command>()
            .with_context(|| format!("script line {}", number + 1))?;
        commands.push(command);
    }
    Ok(commands)
}

pub fn load_script(path: &Path) -> Result<Vec<Command>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read script {:?}", path))?;
    parse_script(&text)
}
