//! The three application tasks and the state they share.
//!
//! ```text
//!  ButtonTask ──▶ last_button ──▶ AppTask ──▶ led_target ──▶ LedTask
//!   (reads pin)                 (pure logic)               (writes pin)
//! ```
//!
//! Each body is a few instructions long, never blocks, and only returns an
//! error when the I/O boundary does.  All three run in the main-loop
//! context, one at a time, so the shared state needs no synchronisation.

use log::debug;

use crate::app::ports::{ChannelId, DigitalIo, Level, TaskRunner};
use crate::config::SchedulerConfig;
use crate::error::TaskError;
use crate::pins;
use crate::schedule::TaskId;

/// State passed between the tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlState {
    /// Level seen by the most recent `ButtonTask`.
    pub last_button: Level,
    /// Whether `AppTask` last saw the button pressed (edge detection).
    pub was_pressed: bool,
    /// LED level decided by `AppTask`, applied by `LedTask`.
    pub led_target: Level,
    /// Presses counted by `AppTask`.
    pub presses: u32,
}

/// Channel bindings and polarity for the control tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskBindings {
    pub button: ChannelId,
    pub led: ChannelId,
    pub button_active_low: bool,
}

impl Default for TaskBindings {
    fn default() -> Self {
        Self {
            button: pins::BUTTON_CHANNEL,
            led: pins::LED_CHANNEL,
            button_active_low: true,
        }
    }
}

impl TaskBindings {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            button_active_low: config.button_active_low,
            ..Self::default()
        }
    }
}

/// Owns the I/O boundary and the shared state; dispatches by [`TaskId`].
pub struct ControlTasks<IO: DigitalIo> {
    io: IO,
    bindings: TaskBindings,
    state: ControlState,
}

impl<IO: DigitalIo> ControlTasks<IO> {
    pub fn new(io: IO, bindings: TaskBindings) -> Self {
        Self {
            io,
            bindings,
            state: ControlState::default(),
        }
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// Sample the button and record its level.
    pub fn button_task(&mut self) -> Result<(), TaskError> {
        self.state.last_button = self.io.read_channel(self.bindings.button)?;
        Ok(())
    }

    /// Toggle the LED target on each new press.  Touches no hardware.
    pub fn app_task(&mut self) {
        let pressed = if self.bindings.button_active_low {
            self.state.last_button == Level::Low
        } else {
            self.state.last_button == Level::High
        };
        if pressed && !self.state.was_pressed {
            self.state.led_target = self.state.led_target.toggled();
            self.state.presses = self.state.presses.wrapping_add(1);
            debug!("AppTask: press #{} -> LED {}", self.state.presses, self.state.led_target);
        }
        self.state.was_pressed = pressed;
    }

    /// Drive the LED to the decided target.
    pub fn led_task(&mut self) -> Result<(), TaskError> {
        self.io
            .write_channel(self.bindings.led, self.state.led_target)?;
        Ok(())
    }
}

impl<IO: DigitalIo> TaskRunner for ControlTasks<IO> {
    fn run(&mut self, task: TaskId) -> Result<(), TaskError> {
        match task {
            TaskId::Button => self.button_task(),
            TaskId::App => {
                self.app_task();
                Ok(())
            }
            TaskId::Led => self.led_task(),
        }
    }
}
