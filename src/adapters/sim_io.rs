//! In-memory digital I/O for host simulation and tests.
//!
//! Two channels are bound by default: the button input and the LED output
//! from [`crate::pins`].  Reads of an output return the last written level,
//! and writes to an input are rejected.  An optional press script lets the
//! host binary show the LED toggling without real hardware.

use heapless::FnvIndexMap;
use log::trace;

use crate::app::ports::{ChannelId, DigitalIo, Level};
use crate::error::IoError;
use crate::pins;

const MAX_CHANNELS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy)]
struct Channel {
    dir: Direction,
    level: Level,
}

/// Scripted button: held for `hold` reads, released for `release` reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressScript {
    pub channel: ChannelId,
    pub hold: u32,
    pub release: u32,
    pub pressed: Level,
}

pub struct SimIo {
    channels: FnvIndexMap<u8, Channel, MAX_CHANNELS>,
    script: Option<PressScript>,
    reads: u32,
    writes: u32,
}

impl Default for SimIo {
    fn default() -> Self {
        Self::new()
    }
}

impl SimIo {
    /// Button (idle HIGH, pull-up) and LED (LOW) channels.
    pub fn new() -> Self {
        let mut io = Self::empty();
        io.bind_input(pins::BUTTON_CHANNEL, Level::High);
        io.bind_output(pins::LED_CHANNEL, Level::Low);
        io
    }

    /// No channels bound.
    pub fn empty() -> Self {
        Self {
            channels: FnvIndexMap::new(),
            script: None,
            reads: 0,
            writes: 0,
        }
    }

    pub fn bind_input(&mut self, ch: ChannelId, level: Level) {
        let _ = self.channels.insert(
            ch.0,
            Channel {
                dir: Direction::Input,
                level,
            },
        );
    }

    pub fn bind_output(&mut self, ch: ChannelId, level: Level) {
        let _ = self.channels.insert(
            ch.0,
            Channel {
                dir: Direction::Output,
                level,
            },
        );
    }

    /// Drive an input channel from outside (the "user" pressing a button).
    pub fn set_input(&mut self, ch: ChannelId, level: Level) {
        if let Some(c) = self.channels.get_mut(&ch.0) {
            if c.dir == Direction::Input {
                c.level = level;
            }
        }
    }

    pub fn with_script(mut self, script: PressScript) -> Self {
        self.script = Some(script);
        self
    }

    /// Last level written to an output channel.
    pub fn output(&self, ch: ChannelId) -> Option<Level> {
        self.channels
            .get(&ch.0)
            .filter(|c| c.dir == Direction::Output)
            .map(|c| c.level)
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }

    pub fn writes(&self) -> u32 {
        self.writes
    }

    fn scripted_level(&self, ch: ChannelId) -> Option<Level> {
        let s = self.script.filter(|s| s.channel == ch)?;
        let cycle = s.hold + s.release;
        if cycle == 0 {
            return None;
        }
        Some(if self.reads % cycle < s.hold {
            s.pressed
        } else {
            s.pressed.toggled()
        })
    }
}

impl DigitalIo for SimIo {
    fn read_channel(&mut self, ch: ChannelId) -> Result<Level, IoError> {
        let scripted = self.scripted_level(ch);
        let c = self
            .channels
            .get_mut(&ch.0)
            .ok_or(IoError::UnknownChannel(ch))?;
        if let Some(level) = scripted {
            c.level = level;
        }
        self.reads = self.reads.wrapping_add(1);
        trace!("sim_io: read {} -> {}", ch, c.level);
        Ok(c.level)
    }

    fn write_channel(&mut self, ch: ChannelId, level: Level) -> Result<(), IoError> {
        let c = self
            .channels
            .get_mut(&ch.0)
            .ok_or(IoError::UnknownChannel(ch))?;
        if c.dir != Direction::Output {
            return Err(IoError::NotWritable(ch));
        }
        c.level = level;
        self.writes = self.writes.wrapping_add(1);
        trace!("sim_io: write {} <- {}", ch, level);
        Ok(())
    }
}
