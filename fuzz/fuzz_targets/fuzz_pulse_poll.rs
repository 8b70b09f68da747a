//! Fuzz target: pulse / poll interleavings on the reference schedule
//!
//! Each input byte is an operation: even = timer pulse, odd = poll.
//! Verifies:
//! - The tick never exceeds the period and is always interval-aligned
//! - Every dispatched task list equals the table lookup for its tick
//! - A completed dispatch never leaves the rollover tick in place
//!
//! cargo fuzz run fuzz_pulse_poll

#![no_main]

use libfuzzer_sys::fuzz_target;
use tickloop::app::ports::TaskRunner;
use tickloop::config::OverrunPolicy;
use tickloop::error::TaskError;
use tickloop::schedule::{ScheduleTable, TaskId};
use tickloop::scheduler::Scheduler;

struct Recorder(Vec<TaskId>);

impl TaskRunner for Recorder {
    fn run(&mut self, task: TaskId) -> Result<(), TaskError> {
        self.0.push(task);
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let mut s = Scheduler::new(ScheduleTable::reference(), OverrunPolicy::Warn);
    let st = s.state();
    let mut runner = Recorder(Vec::new());

    for &op in data {
        if op % 2 == 0 {
            st.pulse();
        } else {
            runner.0.clear();
            if let Some(report) = s.poll(&mut runner).expect("no task can fail") {
                assert_eq!(report.tasks.as_slice(), s.table().lookup(report.tick));
                assert_eq!(runner.0.as_slice(), report.tasks.as_slice());
                assert!(st.tick() < st.period());
            }
        }
        assert!(st.tick() <= st.period());
        assert_eq!(st.tick() % st.interval(), 0);
    }
});
