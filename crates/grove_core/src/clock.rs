//! Time sources for driving a session.
//!
//! The scheduler never reads time on its own; the session is advanced to
//! whatever a [`Clock`] reports. Tests and the batch runner use a
//! [`ManualClock`], the real-time driver uses a [`SystemClock`].

use std::time::Instant;

/// Milliseconds since the clock's origin.
pub type Millis = u64;

pub trait Clock {
    fn now(&self) -> Millis;
}

/// A clock that only moves when told to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManualClock {
    now: Millis,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, by: Millis) -> Millis {
        self.now = self.now.saturating_add(by);
        self.now
    }

    /// Move the clock forward to `at`; earlier instants are ignored.
    pub fn set(&mut self, at: Millis) {
        self.now = self.now.max(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now
    }
}

/// Wall-clock time elapsed since construction.
#[derive(Clone, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
