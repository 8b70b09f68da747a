//! Unified error types for the dispatcher.
//!
//! A single `Error` enum that every subsystem converts into, so the main
//! loop has exactly one thing to match on before halting.  All variants
//! are `Copy`; nothing on the dispatch path allocates to report a fault.

use core::fmt;

use crate::app::ports::ChannelId;
use crate::schedule::TaskId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
///
/// Apart from `Config`, every variant is a terminal state of the control
/// loop: the scheduler latches it and refuses to dispatch again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The schedule or timing configuration is malformed.
    Config(ConfigError),
    /// A task returned an error while its tick was being dispatched.
    TaskFault {
        task: TaskId,
        tick: u16,
        cause: TaskError,
    },
    /// A pulse arrived before the dispatch cycle for `tick` finished and
    /// the configured policy treats that as fatal.
    Overrun { tick: u16, pulses: u16 },
    /// The scheduler already latched a fault and will not dispatch.
    Halted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::TaskFault { task, tick, cause } => {
                write!(f, "task {task} faulted at tick {tick}: {cause}")
            }
            Self::Overrun { tick, pulses } => {
                write!(f, "overrun at tick {tick} ({pulses} pulse(s) during dispatch)")
            }
            Self::Halted => write!(f, "scheduler halted after fault"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Detected once at startup; any of these stops initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Tick interval is zero.
    ZeroInterval,
    /// Period is zero.
    ZeroPeriod,
    /// Period is not a whole number of tick intervals.
    PeriodNotMultiple { period: u16, interval: u16 },
    /// Entry tick lies outside `[0, PERIOD)`.
    TickOutOfRange(u16),
    /// Entry tick is not a multiple of the interval and would never fire.
    TickMisaligned(u16),
    /// Entry has no tasks.
    EmptyEntry(u16),
    /// Two entries share the same tick.
    DuplicateTick(u16),
    /// The same task appears twice in one entry.
    DuplicateTask { tick: u16, task: TaskId },
    /// More entries than the fixed-capacity table holds.
    TooManyEntries,
    /// More tasks in one entry than the fixed capacity allows.
    TooManyTasks(u16),
    /// Serialized config could not be decoded.
    Parse,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroInterval => write!(f, "tick interval must be non-zero"),
            Self::ZeroPeriod => write!(f, "period must be non-zero"),
            Self::PeriodNotMultiple { period, interval } => {
                write!(f, "period {period} is not a multiple of interval {interval}")
            }
            Self::TickOutOfRange(t) => write!(f, "tick {t} outside [0, period)"),
            Self::TickMisaligned(t) => write!(f, "tick {t} is not on an interval boundary"),
            Self::EmptyEntry(t) => write!(f, "entry at tick {t} has no tasks"),
            Self::DuplicateTick(t) => write!(f, "duplicate entry for tick {t}"),
            Self::DuplicateTask { tick, task } => {
                write!(f, "task {task} listed twice at tick {tick}")
            }
            Self::TooManyEntries => write!(f, "too many schedule entries"),
            Self::TooManyTasks(t) => write!(f, "too many tasks at tick {t}"),
            Self::Parse => write!(f, "config could not be decoded"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Task and I/O errors
// ---------------------------------------------------------------------------

/// Failure reported by a task body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// The digital I/O boundary rejected a read or write.
    Io(IoError),
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O: {e}"),
        }
    }
}

impl From<IoError> for TaskError {
    fn from(e: IoError) -> Self {
        Self::Io(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// No pin is bound to this logical channel.
    UnknownChannel(ChannelId),
    /// The channel exists but cannot be read (output-only).
    NotReadable(ChannelId),
    /// The channel exists but cannot be written (input-only).
    NotWritable(ChannelId),
    /// The underlying pin driver reported an error.
    Pin(ChannelId),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownChannel(ch) => write!(f, "unknown channel {}", ch.0),
            Self::NotReadable(ch) => write!(f, "channel {} is not readable", ch.0),
            Self::NotWritable(ch) => write!(f, "channel {} is not writable", ch.0),
            Self::Pin(ch) => write!(f, "pin driver error on channel {}", ch.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
