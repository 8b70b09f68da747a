//! Tick Source: a periodic timer that calls [`SchedulerState::pulse`].
//!
//! On ESP-IDF this is an `esp_timer` periodic timer dispatched from the
//! esp_timer task (not ISR); the callback touches nothing but the packed
//! atomic in [`SchedulerState`].  On the host a named std thread sleeps to
//! absolute deadlines so the pulse rate does not drift with scheduling
//! jitter.
//!
//! The returned [`TickTimer`] owns the timer; dropping it stops pulses.

use std::fmt;
use std::sync::Arc;

use log::info;

use crate::tick::SchedulerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// A pulse period of 0 µs was requested.
    ZeroPeriod,
    /// `esp_timer_create` / `esp_timer_start_periodic` failed.
    Esp(i32),
    /// The host ticker thread could not be spawned.
    Spawn,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPeriod => write!(f, "tick timer period is zero"),
            Self::Esp(rc) => write!(f, "esp_timer error (rc={rc})"),
            Self::Spawn => write!(f, "failed to spawn ticker thread"),
        }
    }
}

impl std::error::Error for TimerError {}

// ── ESP-IDF ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn tick_cb(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is `Arc::as_ptr` of the state held by the owning
    // `TickTimer`, which stops and deletes the timer before releasing it.
    let state = unsafe { &*(arg as *const SchedulerState) };
    state.pulse();
}

#[cfg(target_os = "espidf")]
pub struct TickTimer {
    handle: esp_timer_handle_t,
    _state: Arc<SchedulerState>,
}

/// Start pulsing `state` every `period_us` microseconds.
#[cfg(target_os = "espidf")]
pub fn start_tick_timer(state: Arc<SchedulerState>, period_us: u64) -> Result<TickTimer, TimerError> {
    if period_us == 0 {
        return Err(TimerError::ZeroPeriod);
    }
    let args = esp_timer_create_args_t {
        callback: Some(tick_cb),
        arg: Arc::as_ptr(&state) as *mut core::ffi::c_void,
        dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
        name: b"tick\0".as_ptr() as *const _,
        skip_unhandled_events: false,
    };
    let mut handle: esp_timer_handle_t = core::ptr::null_mut();
    // SAFETY: `args` outlives the call; `handle` is written by esp_timer.
    let ret = unsafe { esp_timer_create(&args, &mut handle) };
    if ret != ESP_OK {
        log::error!("hw_timer: create failed (rc={})", ret);
        return Err(TimerError::Esp(ret));
    }
    // SAFETY: `handle` was just created and is not running.
    let ret = unsafe { esp_timer_start_periodic(handle, period_us) };
    if ret != ESP_OK {
        log::error!("hw_timer: start failed (rc={})", ret);
        // SAFETY: timer never started.
        unsafe { esp_timer_delete(handle) };
        return Err(TimerError::Esp(ret));
    }
    info!("hw_timer: tick every {} us", period_us);
    Ok(TickTimer {
        handle,
        _state: state,
    })
}

#[cfg(target_os = "espidf")]
impl Drop for TickTimer {
    fn drop(&mut self) {
        // SAFETY: `handle` is valid until deleted here; stop before delete.
        unsafe {
            esp_timer_stop(self.handle);
            esp_timer_delete(self.handle);
        }
        info!("hw_timer: stopped");
    }
}

// ── Host ──────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(not(target_os = "espidf"))]
use std::thread::JoinHandle;
#[cfg(not(target_os = "espidf"))]
use std::time::{Duration, Instant};

#[cfg(not(target_os = "espidf"))]
pub struct TickTimer {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// Start pulsing `state` every `period_us` microseconds.
#[cfg(not(target_os = "espidf"))]
pub fn start_tick_timer(state: Arc<SchedulerState>, period_us: u64) -> Result<TickTimer, TimerError> {
    if period_us == 0 {
        return Err(TimerError::ZeroPeriod);
    }
    let period = Duration::from_micros(period_us);
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);

    let thread = std::thread::Builder::new()
        .name("tick".into())
        .spawn(move || {
            let mut deadline = Instant::now() + period;
            while !flag.load(Ordering::Acquire) {
                let now = Instant::now();
                if deadline > now {
                    std::thread::sleep(deadline - now);
                }
                if flag.load(Ordering::Acquire) {
                    break;
                }
                let p = state.pulse();
                if p.shed {
                    log::debug!("hw_timer(sim): tick {} shed a pending tick", p.tick);
                }
                deadline += period;
            }
        })
        .map_err(|_| TimerError::Spawn)?;

    info!("hw_timer(sim): tick every {} us", period_us);
    Ok(TickTimer {
        stop,
        thread: Some(thread),
    })
}

#[cfg(not(target_os = "espidf"))]
impl Drop for TickTimer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
        info!("hw_timer(sim): stopped");
    }
}
