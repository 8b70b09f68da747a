//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter    | Implements  | Connects to                      |
//! |------------|-------------|----------------------------------|
//! | `gpio`     | DigitalIo   | embedded-hal `InputPin`/`OutputPin` |
//! | `sim_io`   | DigitalIo   | in-memory levels (host, tests)   |
//! | `log_sink` | `log` bridge | tracing-subscriber on stderr (host) |

pub mod gpio;
#[cfg(not(target_os = "espidf"))]
pub mod log_sink;
pub mod sim_io;
