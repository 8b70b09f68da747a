//! Port traits: the boundary between the dispatcher and the outside world.
//!
//! ```text
//!   Scheduler ──▶ TaskRunner ──▶ task bodies ──▶ DigitalIo ──▶ pins
//! ```
//!
//! The scheduler core only knows [`TaskRunner`]; the task bodies only know
//! [`DigitalIo`].  Adapters implement `DigitalIo` over real pins or an
//! in-memory simulation, so everything above the boundary runs on the host.

use core::fmt;

use crate::error::{IoError, TaskError};
use crate::schedule::TaskId;

// ───────────────────────────────────────────────────────────────
// Digital I/O boundary
// ───────────────────────────────────────────────────────────────

/// Logical digital channel.  Mapping to a physical pin is an adapter concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u8);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Logic level of a digital channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    High,
    #[default]
    Low,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }

    pub fn toggled(self) -> Self {
        match self {
            Level::High => Level::Low,
            Level::Low => Level::High,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::High => write!(f, "HIGH"),
            Level::Low => write!(f, "LOW"),
        }
    }
}

/// Read/write access to logical digital channels.
///
/// Both operations are synchronous and non-blocking, and only touch the
/// named channel.
pub trait DigitalIo {
    /// Sample the current level of `channel`.
    fn read_channel(&mut self, channel: ChannelId) -> Result<Level, IoError>;

    /// Drive `channel` to `level`.
    fn write_channel(&mut self, channel: ChannelId, level: Level) -> Result<(), IoError>;
}

impl<T: DigitalIo + ?Sized> DigitalIo for &mut T {
    fn read_channel(&mut self, channel: ChannelId) -> Result<Level, IoError> {
        (**self).read_channel(channel)
    }

    fn write_channel(&mut self, channel: ChannelId, level: Level) -> Result<(), IoError> {
        (**self).write_channel(channel, level)
    }
}

// ───────────────────────────────────────────────────────────────
// Task runner (decouples the scheduler from task bodies)
// ───────────────────────────────────────────────────────────────

/// Callback trait the scheduler invokes for every task listed at a tick.
///
/// The scheduler knows task *identities* only; whoever implements this
/// trait owns the task bodies and whatever state they share.  Each call
/// must run to completion without blocking.
pub trait TaskRunner {
    /// Run the task identified by `task` once.
    fn run(&mut self, task: TaskId) -> Result<(), TaskError>;
}

impl<T: TaskRunner + ?Sized> TaskRunner for &mut T {
    fn run(&mut self, task: TaskId) -> Result<(), TaskError> {
        (**self).run(task)
    }
}
