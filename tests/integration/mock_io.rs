//! Mock digital I/O for integration tests.
//!
//! Records every read and write so tests can assert on the full access
//! history without touching real GPIO.

use tickloop::app::ports::{ChannelId, DigitalIo, Level};
use tickloop::error::IoError;
use tickloop::pins::{BUTTON_CHANNEL, LED_CHANNEL};

// ── I/O call record ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoCall {
    Read(ChannelId),
    Write(ChannelId, Level),
}

// ── MockIo ────────────────────────────────────────────────────

pub struct MockIo {
    pub calls: Vec<IoCall>,
    pub button: Level,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockIo {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            button: Level::High,
            fail_writes: false,
        }
    }

    pub fn reads(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, IoCall::Read(_)))
            .count()
    }

    pub fn led_writes(&self) -> Vec<Level> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                IoCall::Write(ch, level) if *ch == LED_CHANNEL => Some(*level),
                _ => None,
            })
            .collect()
    }
}

impl DigitalIo for MockIo {
    fn read_channel(&mut self, ch: ChannelId) -> Result<Level, IoError> {
        self.calls.push(IoCall::Read(ch));
        if ch == BUTTON_CHANNEL {
            Ok(self.button)
        } else {
            Err(IoError::NotReadable(ch))
        }
    }

    fn write_channel(&mut self, ch: ChannelId, level: Level) -> Result<(), IoError> {
        self.calls.push(IoCall::Write(ch, level));
        if ch != LED_CHANNEL {
            return Err(IoError::NotWritable(ch));
        }
        if self.fail_writes {
            return Err(IoError::Pin(ch));
        }
        Ok(())
    }
}
