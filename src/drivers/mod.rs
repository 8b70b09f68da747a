//! Tick source and watchdog drivers.

pub mod hw_timer;
pub mod watchdog;
