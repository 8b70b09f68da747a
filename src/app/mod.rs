//! Application core: task bodies and the ports they run behind.
//!
//! The scheduler dispatches through [`ports::TaskRunner`]; the task bodies
//! in [`tasks`] reach hardware only through [`ports::DigitalIo`], keeping
//! this layer fully testable without real peripherals.

pub mod ports;
pub mod tasks;
