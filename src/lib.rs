//! Tickloop: a cooperative, time-triggered task dispatcher.
//!
//! A periodic timer pulse advances a tick counter and raises a pending
//! flag; the main loop notices the flag, looks the tick up in a static
//! schedule table and runs the listed tasks to completion.  Pure logic is
//! host-testable; ESP-IDF specifics are guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod schedule;
pub mod scheduler;
pub mod tick;

pub mod adapters;
pub mod drivers;

pub use error::{Error, Result};
