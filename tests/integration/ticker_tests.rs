//! Real-time tests: the host ticker thread drives `run_until`.

use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use super::mock_io::MockIo;

use tickloop::app::tasks::{ControlTasks, TaskBindings};
use tickloop::config::SchedulerConfig;
use tickloop::drivers::hw_timer::start_tick_timer;
use tickloop::scheduler::Scheduler;

#[test]
fn ticker_drives_two_periods() {
    let config = SchedulerConfig {
        time_unit_us: 100, // 1 ms pulses
        ..SchedulerConfig::default()
    };
    let mut s = Scheduler::from_config(&config).unwrap();
    let mut t = ControlTasks::new(MockIo::new(), TaskBindings::from_config(&config));

    let timer = start_tick_timer(s.state(), config.pulse_period_us()).unwrap();
    let give_up = Instant::now() + Duration::from_secs(10);
    s.run_until(&mut t, |s| {
        if s.stats().dispatch_cycles >= 24 || Instant::now() > give_up {
            return ControlFlow::Break(());
        }
        std::thread::sleep(Duration::from_micros(100));
        ControlFlow::Continue(())
    })
    .unwrap();
    drop(timer);

    let stats = s.stats();
    assert!(stats.dispatch_cycles >= 24, "only {} cycles", stats.dispatch_cycles);
    assert!(stats.task_runs > 0);
    assert!(!s.is_halted());
    assert!(s.state().tick() <= config.period);
    assert!(t.io().reads() > 0);
}
