//! Tickloop main entry point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Tick source (esp_timer / host thread)                       │
//! │      │ pulse(): tick += interval, pending = 1                │
//! │      ▼                                                       │
//! │  SchedulerState (one packed AtomicU32)                       │
//! │      │ poll(): claim, look up, run, complete                 │
//! │      ▼                                                       │
//! │  Scheduler ──▶ ControlTasks ──▶ DigitalIo (HalIo / SimIo)    │
//! │  idle hook: feed watchdog, yield                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Host usage: `tickloop [config.json|config.bin] [periods]`.  With no
//! `periods` the loop runs until a fault.
#![deny(unused_must_use)]

use std::ops::ControlFlow;

use anyhow::{Context, Result};
use log::{error, info};

use tickloop::app::ports::DigitalIo;
use tickloop::app::tasks::{ControlTasks, TaskBindings};
use tickloop::config::SchedulerConfig;
use tickloop::drivers::hw_timer::start_tick_timer;
use tickloop::drivers::watchdog::Watchdog;
use tickloop::scheduler::Scheduler;

fn main() -> Result<()> {
    // ── 1. Bootstrap + logging ────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    tickloop::adapters::log_sink::init();

    info!("╔══════════════════════════════════════╗");
    info!("║  Tickloop v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration + schedule table ─────────────────────
    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1).map(String::as_str))?;
    let periods: Option<u64> = match args.get(2) {
        Some(s) => Some(s.parse().with_context(|| format!("bad period count '{s}'"))?),
        None => None,
    };

    let mut scheduler = Scheduler::from_config(&config).context("schedule rejected")?;

    // ── 3. I/O boundary + tasks ───────────────────────────────
    let io = build_io()?;
    let mut tasks = ControlTasks::new(io, TaskBindings::from_config(&config));

    // ── 4. Tick source ────────────────────────────────────────
    let _timer = start_tick_timer(scheduler.state(), config.pulse_period_us())
        .context("tick timer")?;
    let mut watchdog = Watchdog::new(config.watchdog_timeout_ms);

    // ── 5. Dispatch loop ──────────────────────────────────────
    let cycle_limit = periods
        .map(|p| {
            config
                .dispatch_cycles_for(p)
                .with_context(|| format!("{p} periods is too many dispatch cycles"))
        })
        .transpose()?;
    info!(
        "Dispatching: {} us pulses, period {} ({})",
        config.pulse_period_us(),
        config.period,
        match cycle_limit {
            Some(n) => format!("{n} dispatch cycles"),
            None => "until fault".into(),
        }
    );

    let outcome = scheduler.run_until(&mut tasks, |s| {
        watchdog.feed();
        if cycle_limit.is_some_and(|n| s.stats().dispatch_cycles >= n) {
            return ControlFlow::Break(());
        }
        idle_wait();
        ControlFlow::Continue(())
    });

    let stats = scheduler.stats();
    info!(
        "Stopped: cycles={} task_runs={} overruns={} missed_ticks={} presses={} led={}",
        stats.dispatch_cycles,
        stats.task_runs,
        stats.overruns,
        stats.missed_ticks,
        tasks.state().presses,
        tasks.state().led_target,
    );
    #[cfg(not(target_os = "espidf"))]
    if watchdog.stalls() > 0 {
        error!("Watchdog(sim): {} stalled feeds", watchdog.stalls());
    }

    if let Err(e) = outcome {
        error!("Dispatcher halted: {}", e);
        return Err(e).context("dispatcher halted");
    }
    Ok(())
}

/// Load the configuration: JSON for `*.json`, postcard otherwise, defaults
/// when no path is given.
fn load_config(path: Option<&str>) -> Result<SchedulerConfig> {
    let Some(path) = path else {
        info!("Config: built-in defaults");
        return Ok(SchedulerConfig::default());
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading {path}"))?;
    let config = if path.ends_with(".json") {
        let text = std::str::from_utf8(&bytes).with_context(|| format!("{path} is not UTF-8"))?;
        SchedulerConfig::from_json(text)
    } else {
        SchedulerConfig::from_postcard(&bytes)
    }
    .with_context(|| format!("parsing {path}"))?;
    info!("Config: loaded {} ({} schedule rows)", path, config.schedule.len());
    Ok(config)
}

#[cfg(target_os = "espidf")]
fn build_io() -> Result<impl DigitalIo> {
    use esp_idf_hal::gpio::{AnyIOPin, PinDriver, Pull};
    use tickloop::adapters::gpio::HalIo;
    use tickloop::pins;

    // SAFETY: each GPIO number is claimed exactly once, here, at boot.
    let (button_pin, led_pin) = unsafe {
        (AnyIOPin::new(pins::BUTTON_GPIO), AnyIOPin::new(pins::LED_GPIO))
    };
    let mut button = PinDriver::input(button_pin)?;
    button.set_pull(Pull::Up)?;
    let led = PinDriver::output(led_pin)?;
    info!(
        "GPIO: button=GPIO{} led=GPIO{}",
        pins::BUTTON_GPIO,
        pins::LED_GPIO
    );
    Ok(HalIo::new(button, pins::BUTTON_CHANNEL, led, pins::LED_CHANNEL))
}

#[cfg(not(target_os = "espidf"))]
fn build_io() -> Result<impl DigitalIo> {
    use tickloop::adapters::sim_io::{PressScript, SimIo};
    use tickloop::app::ports::Level;
    use tickloop::pins;

    info!("GPIO(sim): scripted button presses");
    Ok(SimIo::new().with_script(PressScript {
        channel: pins::BUTTON_CHANNEL,
        hold: 12,
        release: 12,
        pressed: Level::Low,
    }))
}

#[cfg(target_os = "espidf")]
fn idle_wait() {
    esp_idf_hal::task::do_yield();
}

#[cfg(not(target_os = "espidf"))]
fn idle_wait() {
    std::thread::sleep(std::time::Duration::from_micros(200));
}
