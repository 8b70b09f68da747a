//! Dispatcher configuration.
//!
//! Everything here is fixed at build/boot time: the tick interval, the
//! period, how a time unit maps onto the hardware timer, and the schedule
//! itself.  Loaded once from JSON (development, host) or a postcard blob
//! (flash-resident), validated, then turned into a
//! [`ScheduleTable`](crate::schedule::ScheduleTable).  There is no run-time
//! mutation path.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schedule::{MAX_ENTRIES, MAX_TASKS_PER_ENTRY, TaskId};

/// What to do when a pulse arrives while a dispatch cycle is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrunPolicy {
    /// Log and count the overrun, keep dispatching the newest tick.
    #[default]
    Warn,
    /// Treat the overrun as a fatal deadline violation.
    Fault,
}

/// One `(tick, [task, ...])` row of the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConfig {
    pub tick: u16,
    pub tasks: heapless::Vec<TaskId, MAX_TASKS_PER_ENTRY>,
}

impl EntryConfig {
    pub fn new(tick: u16, tasks: &[TaskId]) -> Result<Self, ConfigError> {
        let mut list = heapless::Vec::new();
        list.extend_from_slice(tasks)
            .map_err(|_| ConfigError::TooManyTasks(tick))?;
        Ok(Self { tick, tasks: list })
    }
}

/// Core dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    // --- Timing ---
    /// Time units added to the tick on every pulse
    pub tick_interval: u16,
    /// Tick value at which the cycle rolls over to 0
    pub period: u16,
    /// Length of one time unit in microseconds (hardware timer only)
    pub time_unit_us: u32,

    // --- Fault handling ---
    /// Reaction to a pulse arriving mid-dispatch
    pub overrun_policy: OverrunPolicy,
    /// Watchdog timeout for the dispatch loop (milliseconds)
    pub watchdog_timeout_ms: u32,

    // --- I/O ---
    /// Button reads LOW when pressed (pull-up wiring)
    pub button_active_low: bool,

    // --- Schedule ---
    pub schedule: heapless::Vec<EntryConfig, MAX_ENTRIES>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let rows: [(u16, &[TaskId]); 6] = [
            (20, &[TaskId::Button]),
            (40, &[TaskId::Button, TaskId::Led]),
            (60, &[TaskId::Button, TaskId::App]),
            (80, &[TaskId::Button, TaskId::Led]),
            (100, &[TaskId::Button]),
            // Rollover pulse (tick 120).
            (0, &[TaskId::Button, TaskId::App, TaskId::Led]),
        ];
        let mut schedule = heapless::Vec::new();
        for (tick, tasks) in rows {
            if let Ok(entry) = EntryConfig::new(tick, tasks) {
                let _ = schedule.push(entry);
            }
        }

        Self {
            // Timing
            tick_interval: 10,
            period: 120,
            time_unit_us: 1_000, // 1 ms → 10 ms pulses, 120 ms cycle

            // Fault handling
            overrun_policy: OverrunPolicy::Warn,
            watchdog_timeout_ms: 5_000,

            // I/O
            button_active_low: true,

            schedule,
        }
    }
}

impl SchedulerConfig {
    /// Parse a JSON document.  Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| {
            log::warn!("config: JSON decode failed: {}", e);
            ConfigError::Parse
        })
    }

    /// Decode a postcard blob produced by [`to_postcard`](Self::to_postcard).
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(bytes).map_err(|e| {
            log::warn!("config: postcard decode failed: {}", e);
            ConfigError::Parse
        })
    }

    pub fn to_postcard(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|_| ConfigError::Parse)
    }

    /// Pulse period of the hardware timer in microseconds.
    pub fn pulse_period_us(&self) -> u64 {
        u64::from(self.tick_interval) * u64::from(self.time_unit_us)
    }

    /// Dispatch cycles covering `periods` full schedule periods, or `None`
    /// if the interval is zero or the count does not fit in a `u64`.
    pub fn dispatch_cycles_for(&self, periods: u64) -> Option<u64> {
        let per_period = self.period.checked_div(self.tick_interval)?;
        periods.checked_mul(u64::from(per_period))
    }

    /// Check the non-schedule fields.  Schedule rows are checked when the
    /// table is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval == 0 || self.time_unit_us == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.period == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.period % self.tick_interval != 0 {
            return Err(ConfigError::PeriodNotMultiple {
                period: self.period,
                interval: self.tick_interval,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SchedulerConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.period % c.tick_interval, 0);
        assert_eq!(c.schedule.len(), 6);
        assert_eq!(c.pulse_period_us(), 10_000);
        assert_eq!(c.overrun_policy, OverrunPolicy::Warn);
    }

    #[test]
    fn json_roundtrip() {
        let c = SchedulerConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2 = SchedulerConfig::from_json(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn json_uses_task_names() {
        let text = r#"{
            "tick_interval": 5,
            "period": 20,
            "overrun_policy": "fault",
            "schedule": [
                { "tick": 5,  "tasks": ["button"] },
                { "tick": 10, "tasks": ["button", "app", "led"] }
            ]
        }"#;
        let c = SchedulerConfig::from_json(text).unwrap();
        assert_eq!(c.tick_interval, 5);
        assert_eq!(c.period, 20);
        assert_eq!(c.overrun_policy, OverrunPolicy::Fault);
        assert_eq!(
            c.schedule[1].tasks.as_slice(),
            &[TaskId::Button, TaskId::App, TaskId::Led]
        );
        // Unspecified fields keep their defaults.
        assert_eq!(c.time_unit_us, 1_000);
        assert!(c.button_active_low);
    }

    #[test]
    fn unknown_task_name_is_parse_error() {
        let text = r#"{ "schedule": [ { "tick": 10, "tasks": ["pump"] } ] }"#;
        assert_eq!(SchedulerConfig::from_json(text), Err(ConfigError::Parse));
    }

    #[test]
    fn postcard_roundtrip() {
        let c = SchedulerConfig::default();
        let bytes = c.to_postcard().unwrap();
        let c2 = SchedulerConfig::from_postcard(&bytes).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn truncated_postcard_is_rejected() {
        let bytes = SchedulerConfig::default().to_postcard().unwrap();
        assert_eq!(
            SchedulerConfig::from_postcard(&bytes[..bytes.len() / 2]),
            Err(ConfigError::Parse)
        );
    }

    #[test]
    fn validate_rejects_bad_timing() {
        let mut c = SchedulerConfig::default();
        c.tick_interval = 7;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::PeriodNotMultiple { .. })
        ));
        c.tick_interval = 0;
        assert_eq!(c.validate(), Err(ConfigError::ZeroInterval));
    }

    #[test]
    fn entry_capacity_is_enforced() {
        let many = [TaskId::Led; MAX_TASKS_PER_ENTRY + 1];
        assert_eq!(
            EntryConfig::new(10, &many),
            Err(ConfigError::TooManyTasks(10))
        );
    }

    #[test]
    fn dispatch_cycles_cover_whole_periods() {
        let mut c = SchedulerConfig::default();
        assert_eq!(c.dispatch_cycles_for(0), Some(0));
        assert_eq!(c.dispatch_cycles_for(2), Some(24));
        assert_eq!(c.dispatch_cycles_for(u64::MAX), None);
        c.tick_interval = 0;
        assert_eq!(c.dispatch_cycles_for(1), None);
    }
}
