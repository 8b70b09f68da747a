//! Static schedule table: which tasks run at which tick.
//!
//! The table is built once from configuration, validated, and never
//! mutated afterwards.  Lookup is a pure binary search over entries sorted
//! by tick.
//!
//! Reference schedule (period 120, interval 10):
//!
//! | Tick    | Tasks (in order)        |
//! |---------|-------------------------|
//! | 20, 100 | Button                  |
//! | 40, 80  | Button, Led             |
//! | 60      | Button, App             |
//! | 0 (120) | Button, App, Led        |

use core::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{EntryConfig, SchedulerConfig};
use crate::error::ConfigError;

/// Maximum number of entries in a schedule table.
pub const MAX_ENTRIES: usize = 32;
/// Maximum number of tasks listed at a single tick.
pub const MAX_TASKS_PER_ENTRY: usize = 8;

// ═══════════════════════════════════════════════════════════════
//  Task identity
// ═══════════════════════════════════════════════════════════════

/// Identity of a task body.  Equality is by identity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskId {
    /// Samples the button channel.
    Button,
    /// Decides the LED target from the last button sample.
    App,
    /// Drives the LED channel to the decided target.
    Led,
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Button => write!(f, "ButtonTask"),
            Self::App => write!(f, "AppTask"),
            Self::Led => write!(f, "LedTask"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Table
// ═══════════════════════════════════════════════════════════════

/// Ordered task list for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    tick: u16,
    tasks: heapless::Vec<TaskId, MAX_TASKS_PER_ENTRY>,
}

impl ScheduleEntry {
    pub fn tick(&self) -> u16 {
        self.tick
    }

    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }
}

/// Immutable tick → task-list mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTable {
    period: u16,
    interval: u16,
    /// Sorted by tick, ticks unique.
    entries: heapless::Vec<ScheduleEntry, MAX_ENTRIES>,
}

impl ScheduleTable {
    /// Validate `config` and build the table from it.
    pub fn from_config(config: &SchedulerConfig) -> Result<Self, ConfigError> {
        let mut builder = ScheduleTableBuilder::new(config.period, config.tick_interval);
        for EntryConfig { tick, tasks } in &config.schedule {
            builder = builder.entry(*tick, tasks);
        }
        builder.build()
    }

    /// The reference schedule, period 120 and interval 10.
    pub fn reference() -> Self {
        let mut entries = heapless::Vec::new();
        let rows: [(u16, &[TaskId]); 6] = [
            (0, &[TaskId::Button, TaskId::App, TaskId::Led]),
            (20, &[TaskId::Button]),
            (40, &[TaskId::Button, TaskId::Led]),
            (60, &[TaskId::Button, TaskId::App]),
            (80, &[TaskId::Button, TaskId::Led]),
            (100, &[TaskId::Button]),
        ];
        for (tick, tasks) in rows {
            let mut list = heapless::Vec::new();
            // Capacities are far above the reference sizes.
            let _ = list.extend_from_slice(tasks);
            let _ = entries.push(ScheduleEntry { tick, tasks: list });
        }
        Self {
            period: 120,
            interval: 10,
            entries,
        }
    }

    /// Ordered tasks for `tick`; empty when nothing is scheduled.
    ///
    /// `tick == period` is the rollover pulse and maps to entry 0.  Any other
    /// value outside `[0, period)` has no entry.
    pub fn lookup(&self, tick: u16) -> &[TaskId] {
        let key = if tick == self.period { 0 } else { tick };
        match self.entries.binary_search_by_key(&key, |e| e.tick) {
            Ok(i) => self.entries[i].tasks(),
            Err(_) => &[],
        }
    }

    pub fn period(&self) -> u16 {
        self.period
    }

    pub fn interval(&self) -> u16 {
        self.interval
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// Total task invocations over one full period.
    pub fn runs_per_period(&self) -> usize {
        self.entries.iter().map(|e| e.tasks.len()).sum()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Builder
// ═══════════════════════════════════════════════════════════════

/// Collects entries, then validates them all at once in [`build`](Self::build).
#[derive(Debug)]
pub struct ScheduleTableBuilder {
    period: u16,
    interval: u16,
    entries: heapless::Vec<ScheduleEntry, MAX_ENTRIES>,
    /// First error seen while collecting (capacity overflow).
    overflow: Option<ConfigError>,
}

impl ScheduleTableBuilder {
    pub fn new(period: u16, interval: u16) -> Self {
        Self {
            period,
            interval,
            entries: heapless::Vec::new(),
            overflow: None,
        }
    }

    /// Append an entry.  Order of calls does not matter.
    #[must_use]
    pub fn entry(mut self, tick: u16, tasks: &[TaskId]) -> Self {
        if self.overflow.is_some() {
            return self;
        }
        let mut list = heapless::Vec::new();
        if list.extend_from_slice(tasks).is_err() {
            self.overflow = Some(ConfigError::TooManyTasks(tick));
            return self;
        }
        if self.entries.push(ScheduleEntry { tick, tasks: list }).is_err() {
            self.overflow = Some(ConfigError::TooManyEntries);
        }
        self
    }

    pub fn build(mut self) -> Result<ScheduleTable, ConfigError> {
        if let Some(e) = self.overflow {
            return Err(e);
        }
        if self.interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.period == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.period % self.interval != 0 {
            return Err(ConfigError::PeriodNotMultiple {
                period: self.period,
                interval: self.interval,
            });
        }

        for entry in &self.entries {
            if entry.tick >= self.period {
                return Err(ConfigError::TickOutOfRange(entry.tick));
            }
            if entry.tick % self.interval != 0 {
                return Err(ConfigError::TickMisaligned(entry.tick));
            }
            if entry.tasks.is_empty() {
                return Err(ConfigError::EmptyEntry(entry.tick));
            }
            for (i, task) in entry.tasks.iter().enumerate() {
                if entry.tasks[..i].contains(task) {
                    return Err(ConfigError::DuplicateTask {
                        tick: entry.tick,
                        task: *task,
                    });
                }
            }
        }

        self.entries.sort_unstable_by_key(|e| e.tick);
        if let Some(pair) = self.entries.windows(2).find(|w| w[0].tick == w[1].tick) {
            return Err(ConfigError::DuplicateTick(pair[1].tick));
        }

        let table = ScheduleTable {
            period: self.period,
            interval: self.interval,
            entries: self.entries,
        };
        info!(
            "Schedule: {} entries, {} runs per period (period={}, interval={})",
            table.entries.len(),
            table.runs_per_period(),
            table.period,
            table.interval
        );
        Ok(table)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
