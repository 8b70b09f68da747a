//! Fuzz target: schedule configuration decoding and validation
//!
//! Feeds arbitrary bytes through both config decoders and, when they
//! decode, through table construction.  Verifies:
//! - No panics under arbitrary byte inputs
//! - Every table that builds has sorted, unique, aligned ticks in range
//! - Lookups on a built table never panic for any tick
//!
//! cargo fuzz run fuzz_schedule_config

#![no_main]

use libfuzzer_sys::fuzz_target;
use tickloop::config::SchedulerConfig;
use tickloop::schedule::ScheduleTable;

fn check(config: &SchedulerConfig) {
    if config.validate().is_err() {
        return;
    }
    let Ok(table) = ScheduleTable::from_config(config) else {
        return;
    };
    let entries = table.entries();
    for w in entries.windows(2) {
        assert!(w[0].tick() < w[1].tick(), "entries not sorted/unique");
    }
    for e in entries {
        assert!(e.tick() < table.period());
        assert_eq!(e.tick() % table.interval(), 0);
        assert!(!e.tasks().is_empty());
    }
    for tick in (0..=table.period()).step_by(usize::from(table.interval())) {
        let _ = table.lookup(tick);
    }
}

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = SchedulerConfig::from_postcard(data) {
        check(&config);
    }
    if let Ok(text) = core::str::from_utf8(data) {
        if let Ok(config) = SchedulerConfig::from_json(text) {
            check(&config);
        }
    }
});
