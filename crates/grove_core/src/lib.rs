pub mod bounded;
pub mod clock;
pub mod config;
pub mod diff;
pub mod error;
pub mod event;
pub mod grid;
pub mod io;
pub mod kernels;
pub mod production;
pub mod reduce;
pub mod rng;
pub mod schedule;
pub mod session;
pub mod state;
pub mod trackers;

use anyhow::Result;
use tracing::warn;

pub use config::GameConfig;
pub use error::GameError;
pub use session::{GameOverSink, GameSummary, Session};

use clock::{Clock, ManualClock, Millis};
use io::command::Command;
use io::frame::{make_frame, Frame};

/// Batch driver over a [`ManualClock`]: advances simulated time and emits a
/// frame at every multiple of `frame_every`.
pub struct Runner {
    clock: ManualClock,
    frame_every: Millis,
    next_frame: Millis,
    /// Instant of the last frame, cleared once a command changes the session.
    last_frame: Option<Millis>,
}

impl Runner {
    pub fn new(session: &Session, frame_every: Millis) -> Self {
        let mut clock = ManualClock::new();
        clock.set(session.now());
        let frame_every = frame_every.max(1);
        Self {
            next_frame: session.now().saturating_add(frame_every),
            clock,
            frame_every,
            last_frame: None,
        }
    }

    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    /// Advance the session to `target`, emitting every frame boundary passed
    /// on the way.
    pub fn advance_to<F>(
        &mut self,
        session: &mut Session,
        target: Millis,
        emit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(Frame) -> Result<()>,
    {
        while self.next_frame <= target {
            self.clock.set(self.next_frame);
            session.pump(&self.clock);
            emit_frame(session, emit)?;
            self.last_frame = Some(self.next_frame);
            self.next_frame = self.next_frame.saturating_add(self.frame_every);
        }
        self.clock.set(target);
        session.pump(&self.clock);
        Ok(())
    }

    /// Apply one scripted command. Refused player actions are logged and
    /// skipped; the script keeps going.
    pub fn step<F>(
        &mut self,
        session: &mut Session,
        command: Command,
        emit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(Frame) -> Result<()>,
    {
        match command {
            Command::Wait(duration) => {
                let target = self.now().saturating_add(duration);
                self.advance_to(session, target, emit)?;
            }
            Command::Quit => {}
            other => match other.apply(session) {
                Ok(()) => self.last_frame = None,
                Err(err) => {
                    warn!(at = self.now(), command = ?other, error = %err, "command refused");
                }
            },
        }
        Ok(())
    }
}

fn emit_frame<F>(session: &mut Session, emit: &mut F) -> Result<()>
where
    F: FnMut(Frame) -> Result<()>,
{
    let events = session.drain_events();
    emit(make_frame(session, events))
}

/// Run a command script from the session's current time, then keep going
/// until `until` (if later), and finish with a closing frame unless the last
/// frame already shows the final instant.
///
/// Identical configs and scripts always produce identical frame streams.
pub fn run_script<F>(
    session: &mut Session,
    commands: &[Command],
    frame_every: Millis,
    until: Option<Millis>,
    mut emit: F,
) -> Result<()>
where
    F: FnMut(Frame) -> Result<()>,
{
    let mut runner = Runner::new(session, frame_every);
    for command in commands {
        if *command == Command::Quit {
            break;
        }
        runner.step(session, *command, &mut emit)?;
    }
    if let Some(until) = until {
        if until > runner.now() {
            runner.advance_to(session, until, &mut emit)?;
        }
    }
    if runner.last_frame == Some(runner.now()) {
        return Ok(());
    }
    emit_frame(session, &mut emit)
}
