//! Integration tests for the pulse → scheduler → tasks → I/O pipeline.
//!
//! Pulses are injected by hand so every interleaving is deterministic.

use super::mock_io::{IoCall, MockIo};

use tickloop::Error;
use tickloop::app::ports::Level;
use tickloop::app::tasks::{ControlTasks, TaskBindings};
use tickloop::config::SchedulerConfig;
use tickloop::error::{IoError, TaskError};
use tickloop::pins::{BUTTON_CHANNEL, LED_CHANNEL};
use tickloop::schedule::TaskId;
use tickloop::scheduler::Scheduler;

fn make_stack() -> (Scheduler, ControlTasks<MockIo>) {
    let config = SchedulerConfig::default();
    let scheduler = Scheduler::from_config(&config).unwrap();
    let tasks = ControlTasks::new(MockIo::new(), TaskBindings::from_config(&config));
    (scheduler, tasks)
}

/// One pulse followed by one poll.
fn step(s: &mut Scheduler, t: &mut ControlTasks<MockIo>) -> Result<Vec<TaskId>, Error> {
    s.state().pulse();
    Ok(s.poll(t)?.map(|r| r.tasks.to_vec()).unwrap_or_default())
}

// ── One full period drives the hardware in table order ───────

#[test]
fn full_period_io_sequence() {
    let (mut s, mut t) = make_stack();
    for _ in 0..12 {
        step(&mut s, &mut t).unwrap();
    }

    let r = IoCall::Read(BUTTON_CHANNEL);
    let w = IoCall::Write(LED_CHANNEL, Level::Low);
    // 20: B | 40: B L | 60: B A | 80: B L | 100: B | 120: B A L
    assert_eq!(t.io().calls, vec![r, r, w, r, r, w, r, r, w]);
    assert_eq!(s.state().tick(), 0);
    assert!(!s.state().is_pending());
}

// ── A press reaches the LED through AppTask ──────────────────

#[test]
fn press_toggles_led_after_app_runs() {
    let (mut s, mut t) = make_stack();
    t.io_mut().button = Level::Low;

    for _ in 0..12 {
        step(&mut s, &mut t).unwrap();
    }
    // AppTask first runs at 60; LedTask at 40 still drives the old target.
    assert_eq!(t.io().led_writes(), vec![Level::Low, Level::High, Level::High]);
    assert_eq!(t.state().presses, 1);

    // Holding the button through a second period does not toggle again.
    for _ in 0..12 {
        step(&mut s, &mut t).unwrap();
    }
    assert_eq!(t.state().led_target, Level::High);
    assert_eq!(t.state().presses, 1);
}

// ── Load shedding: only the newest tick is dispatched ────────

#[test]
fn late_poll_sheds_intermediate_ticks() {
    let (mut s, mut t) = make_stack();
    let st = s.state();
    st.pulse(); // 10
    st.pulse(); // 20
    st.pulse(); // 30 (no entry)
    st.pulse(); // 40
    let report = s.poll(&mut t).unwrap().unwrap();
    assert_eq!(report.tick, 40);
    assert_eq!(report.tasks.as_slice(), &[TaskId::Button, TaskId::Led]);
    assert_eq!(s.stats().missed_ticks, 3);
    assert_eq!(s.stats().dispatch_cycles, 1);
    // Tick 20's ButtonTask never ran on its own.
    assert_eq!(t.io().reads(), 1);
}

// ── Fail-fast on an I/O fault ────────────────────────────────

#[test]
fn led_fault_reports_task_and_tick() {
    let (mut s, mut t) = make_stack();
    t.io_mut().fail_writes = true;
    for _ in 0..3 {
        step(&mut s, &mut t).unwrap(); // 10, 20, 30
    }
    let err = step(&mut s, &mut t).unwrap_err(); // 40: Button, Led
    assert_eq!(
        err,
        Error::TaskFault {
            task: TaskId::Led,
            tick: 40,
            cause: TaskError::Io(IoError::Pin(LED_CHANNEL)),
        }
    );
    assert!(s.is_halted());
    // The failing tick stays pending; nothing else is dispatched.
    assert!(s.state().is_pending());
    let calls_before = t.io().calls.len();
    assert_eq!(step(&mut s, &mut t), Err(Error::Halted));
    assert_eq!(t.io().calls.len(), calls_before);
}

// ── Custom schedule from JSON ────────────────────────────────

#[test]
fn json_schedule_drives_dispatch() {
    let config = SchedulerConfig::from_json(
        r#"{
            "tick_interval": 5,
            "period": 15,
            "schedule": [
                { "tick": 0, "tasks": ["led"] },
                { "tick": 5, "tasks": ["button", "app"] }
            ]
        }"#,
    )
    .unwrap();
    let mut s = Scheduler::from_config(&config).unwrap();
    let mut t = ControlTasks::new(MockIo::new(), TaskBindings::from_config(&config));

    let seen: Vec<Vec<TaskId>> = (0..6).map(|_| step(&mut s, &mut t).unwrap()).collect();
    assert_eq!(
        seen,
        vec![
            vec![TaskId::Button, TaskId::App], // 5
            vec![],                            // 10
            vec![TaskId::Led],                 // 15 → 0
            vec![TaskId::Button, TaskId::App], // 5
            vec![],                            // 10
            vec![TaskId::Led],                 // 15 → 0
        ]
    );
}

#[test]
fn invalid_schedule_never_builds() {
    let config = SchedulerConfig::from_json(
        r#"{ "schedule": [ { "tick": 25, "tasks": ["button"] } ] }"#,
    )
    .unwrap();
    assert!(matches!(
        Scheduler::from_config(&config),
        Err(Error::Config(_))
    ));
}

// ── Scripted simulation, as the host binary runs it ──────────

#[test]
fn scripted_sim_io_toggles_led_each_press() {
    use tickloop::adapters::sim_io::{PressScript, SimIo};

    let config = SchedulerConfig::default();
    let mut s = Scheduler::from_config(&config).unwrap();
    // ButtonTask runs 6 times per period: held one period, released one.
    let io = SimIo::new().with_script(PressScript {
        channel: BUTTON_CHANNEL,
        hold: 6,
        release: 6,
        pressed: Level::Low,
    });
    let mut t = ControlTasks::new(io, TaskBindings::from_config(&config));

    let mut leds = Vec::new();
    for _ in 0..4 {
        for _ in 0..12 {
            s.state().pulse();
            s.poll(&mut t).unwrap();
        }
        leds.push(t.io().output(LED_CHANNEL));
    }
    assert_eq!(t.state().presses, 2);
    assert_eq!(
        leds,
        vec![
            Some(Level::High), // pressed in period 1
            Some(Level::High), // released
            Some(Level::Low),  // pressed again
            Some(Level::Low),
        ]
    );
}
