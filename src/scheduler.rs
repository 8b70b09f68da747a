//! Dispatch loop: the main-loop side of the time-triggered scheduler.
//!
//! The tick source only raises a flag.  The scheduler notices it, looks the
//! tick up in the [`ScheduleTable`], and hands each listed task to a
//! [`TaskRunner`] strictly in table order before acknowledging the tick.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Tick Source                           │
//! │           (esp_timer callback / host ticker thread)          │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ SchedulerState::pulse()
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Scheduler::poll()                                           │
//! │    take pending tick ─▶ ScheduleTable::lookup(tick)          │
//! │    ─▶ TaskRunner::run(task) for each, in order               │
//! │    ─▶ complete (clear flag, reset rollover tick)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A task error or (optionally) an overrun latches the scheduler in a
//! fault state.  Nothing after that is dispatched; the caller is expected
//! to halt or reset the device.

use core::ops::ControlFlow;
use std::sync::Arc;

use log::{error, info, trace, warn};

use crate::app::ports::TaskRunner;
use crate::config::{OverrunPolicy, SchedulerConfig};
use crate::error::{Error, Result};
use crate::schedule::{MAX_TASKS_PER_ENTRY, ScheduleTable, TaskId};
use crate::tick::{Completion, SchedulerState};

// ═══════════════════════════════════════════════════════════════
//  Reports
// ═══════════════════════════════════════════════════════════════

/// What one dispatch cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Tick value that was dispatched (may equal the period on rollover).
    pub tick: u16,
    /// Tasks run, in order.
    pub tasks: heapless::Vec<TaskId, MAX_TASKS_PER_ENTRY>,
    /// Pulses that arrived while the tasks were running.
    pub overrun_pulses: Option<u16>,
}

/// Running totals since the scheduler was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Dispatch cycles executed (including ticks with no tasks).
    pub dispatch_cycles: u64,
    /// Individual task invocations.
    pub task_runs: u64,
    /// Cycles during which at least one pulse arrived.
    pub overruns: u32,
    /// Pending ticks overwritten by a newer pulse before dispatch claimed them.
    pub missed_ticks: u32,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// The cooperative dispatcher.
///
/// Owns the schedule table and the consumer side of the shared tick state.
/// Hand [`state()`](Self::state) to the tick source.
pub struct Scheduler {
    table: ScheduleTable,
    state: Arc<SchedulerState>,
    overrun_policy: OverrunPolicy,
    stats: SchedulerStats,
    /// Latched terminal fault, if any.
    fault: Option<Error>,
}

impl Scheduler {
    pub fn new(table: ScheduleTable, overrun_policy: OverrunPolicy) -> Self {
        let state = Arc::new(SchedulerState::new(table.period(), table.interval()));
        Self {
            table,
            state,
            overrun_policy,
            stats: SchedulerStats::default(),
            fault: None,
        }
    }

    /// Validate `config`, build its table, and wrap it in a scheduler.
    pub fn from_config(config: &SchedulerConfig) -> Result<Self> {
        config.validate()?;
        let table = ScheduleTable::from_config(config)?;
        Ok(Self::new(table, config.overrun_policy))
    }

    /// Shared tick state; the tick source keeps a clone and calls `pulse()`.
    pub fn state(&self) -> Arc<SchedulerState> {
        Arc::clone(&self.state)
    }

    pub fn table(&self) -> &ScheduleTable {
        &self.table
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            missed_ticks: self.state.missed_ticks(),
            ..self.stats
        }
    }

    /// The latched fault, if the scheduler has halted.
    pub fn fault(&self) -> Option<Error> {
        self.fault
    }

    pub fn is_halted(&self) -> bool {
        self.fault.is_some()
    }

    /// Run one dispatch cycle if a tick is pending.
    ///
    /// Returns `Ok(None)` when nothing is pending.  On a task error the
    /// remaining tasks for that tick are skipped, the flag is left raised,
    /// and the scheduler latches the fault.
    pub fn poll(&mut self, tasks: &mut impl TaskRunner) -> Result<Option<DispatchReport>> {
        if self.fault.is_some() {
            return Err(Error::Halted);
        }
        let Some(claim) = self.state.take() else {
            return Ok(None);
        };

        let tick = claim.tick;
        let list = self.table.lookup(tick);
        for &task in list {
            if let Err(cause) = tasks.run(task) {
                return Err(latch(&mut self.fault, Error::TaskFault { task, tick, cause }));
            }
        }
        self.stats.dispatch_cycles += 1;
        self.stats.task_runs += list.len() as u64;

        let mut report = DispatchReport {
            tick,
            tasks: heapless::Vec::new(),
            overrun_pulses: None,
        };
        // Entries are capacity-checked at build time.
        let _ = report.tasks.extend_from_slice(list);

        match self.state.complete(claim) {
            Completion::Clean => {
                trace!("dispatch: tick={} tasks={:?}", tick, list);
            }
            Completion::Overrun { pulses } => {
                self.stats.overruns += 1;
                report.overrun_pulses = Some(pulses);
                match self.overrun_policy {
                    OverrunPolicy::Warn => {
                        warn!(
                            "dispatch: overrun at tick {} ({} pulse(s) during {} task(s))",
                            tick,
                            pulses,
                            list.len()
                        );
                    }
                    OverrunPolicy::Fault => {
                        return Err(latch(&mut self.fault, Error::Overrun { tick, pulses }));
                    }
                }
            }
        }

        Ok(Some(report))
    }

    /// Poll until `idle` breaks or a fault latches.
    ///
    /// `idle` runs on every iteration where nothing was pending; use it to
    /// feed a watchdog, yield, or decide to stop.
    pub fn run_until(
        &mut self,
        tasks: &mut impl TaskRunner,
        mut idle: impl FnMut(&Self) -> ControlFlow<()>,
    ) -> Result<()> {
        info!(
            "Scheduler: running (period={}, interval={}, {} entries)",
            self.table.period(),
            self.table.interval(),
            self.table.entries().len()
        );
        loop {
            if self.poll(tasks)?.is_none() && idle(self).is_break() {
                break;
            }
        }
        let s = self.stats();
        info!(
            "Scheduler: stopped after {} cycles, {} task runs, {} overruns, {} missed ticks",
            s.dispatch_cycles, s.task_runs, s.overruns, s.missed_ticks
        );
        Ok(())
    }
}

/// Record `fault` as terminal.
fn latch(slot: &mut Option<Error>, fault: Error) -> Error {
    error!("Scheduler: FAULT, halting dispatch: {}", fault);
    *slot = Some(fault);
    fault
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
