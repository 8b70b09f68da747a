//! Host log sink.
//!
//! On ESP-IDF the `log` facade is backed by `esp_idf_logger` (UART /
//! USB-CDC).  Everywhere else records go through `tracing-subscriber`'s
//! fmt layer on stderr; its `tracing-log` bridge picks up the crate's
//! `log::info!` and friends unchanged.
//!
//! The filter comes from `TICKLOOP_LOG` in `EnvFilter` syntax
//! (`debug`, `tickloop::scheduler=trace`, ...), default `info`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LEVEL_ENV: &str = "TICKLOOP_LOG";

const DEFAULT_FILTER: &str = "info";

/// Build the filter from `directives`, falling back to `info` when they
/// are missing or malformed.
pub fn filter_for(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the stderr subscriber.  Safe to call more than once; later
/// calls leave the first installation in place.
pub fn init() {
    let directives = std::env::var(LEVEL_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(directives.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true)
        .try_init();
}
