//! Shared tick state between the tick source and the dispatch loop.
//!
//! ```text
//! ┌──────────────┐  pulse()   ┌──────────────────────┐  take()/complete()  ┌──────────────┐
//! │ Timer ISR /  │───────────▶│  SchedulerState      │────────────────────▶│  Scheduler   │
//! │ timer task   │            │  (one AtomicU32)     │                     │  (main loop) │
//! └──────────────┘            └──────────────────────┘                     └──────────────┘
//! ```
//!
//! Tick, flags, and a pulse sequence number live in one 32-bit word so that
//! every read sees a consistent state and every update is a single atomic
//! operation.  The producer never blocks, allocates, or calls into tasks.
//!
//! Layout of the state word:
//!
//! | Bits   | Field                             |
//! |--------|-----------------------------------|
//! | 0..16  | tick (time units since rollover)  |
//! | 16..30 | pulse sequence (wrapping, 14 bit) |
//! | 30     | claimed: dispatch of tick running |
//! | 31     | pending-dispatch flag             |
//!
//! Every pulse clears `claimed`, so a completion can only succeed if no
//! pulse at all landed during dispatch.  The sequence number only sizes
//! the overrun: the reported pulse count is modulo 2^14.

use core::sync::atomic::{AtomicU32, Ordering};

const TICK_MASK: u32 = 0xFFFF;
const SEQ_SHIFT: u32 = 16;
const SEQ_MASK: u32 = 0x3FFF;
const CLAIMED_BIT: u32 = 1 << 30;
const PENDING_BIT: u32 = 1 << 31;

#[inline]
const fn pack(snap: Snapshot) -> u32 {
    let mut word = snap.tick as u32 | ((snap.seq as u32 & SEQ_MASK) << SEQ_SHIFT);
    if snap.claimed {
        word |= CLAIMED_BIT;
    }
    if snap.pending {
        word |= PENDING_BIT;
    }
    word
}

#[inline]
const fn unpack(word: u32) -> Snapshot {
    Snapshot {
        tick: (word & TICK_MASK) as u16,
        seq: ((word >> SEQ_SHIFT) & SEQ_MASK) as u16,
        claimed: word & CLAIMED_BIT != 0,
        pending: word & PENDING_BIT != 0,
    }
}

/// A consistent view of the state word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Time units since the last rollover.  May equal the period between
    /// the rollover pulse and its dispatch.
    pub tick: u16,
    /// Pulse sequence number (wraps at 2^14).
    pub seq: u16,
    /// The dispatcher has claimed this tick and is running its tasks.
    pub claimed: bool,
    /// A pulse is waiting to be dispatched.
    pub pending: bool,
}

/// What a single pulse did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    /// Tick value now visible to the dispatcher.
    pub tick: u16,
    /// The previous tick was still pending, unclaimed, and is now lost.
    pub shed: bool,
}

/// A pending dispatch claimed by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Claim {
    pub tick: u16,
    pub seq: u16,
}

/// Result of acknowledging a claimed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Completion {
    /// Flag cleared; no pulse arrived while the tasks ran.
    Clean,
    /// `pulses` pulses arrived while the tasks ran; the flag stays raised
    /// for the newest tick.
    Overrun { pulses: u16 },
}

/// Tick counter and pending flag, shared between the two execution contexts.
///
/// The tick source is the only caller of [`pulse`](Self::pulse); the
/// scheduler is the only caller of `take`/`complete`.
#[derive(Debug)]
pub struct SchedulerState {
    word: AtomicU32,
    missed: AtomicU32,
    period: u16,
    interval: u16,
}

impl SchedulerState {
    /// Fresh state: tick 0, flag clear.
    ///
    /// `period` must be a non-zero multiple of a non-zero `interval`; the
    /// schedule table enforces this before a scheduler is built.
    pub const fn new(period: u16, interval: u16) -> Self {
        Self {
            word: AtomicU32::new(0),
            missed: AtomicU32::new(0),
            period,
            interval,
        }
    }

    pub fn period(&self) -> u16 {
        self.period
    }

    pub fn interval(&self) -> u16 {
        self.interval
    }

    /// Advance the tick by one interval and raise the pending flag.
    ///
    /// Safe to call from interrupt context: one lock-free read-modify-write
    /// plus a relaxed counter bump.  If the previous pulse is still pending
    /// and not yet claimed, its tick is overwritten and only the newest
    /// value will be dispatched.
    pub fn pulse(&self) -> Pulse {
        let period = self.period;
        let interval = self.interval;
        let update = |word: u32| {
            let cur = unpack(word);
            // A stored PERIOD means the rollover dispatch was shed; wrap now.
            let base = if cur.tick >= period { cur.tick - period } else { cur.tick };
            Some(pack(Snapshot {
                tick: base + interval,
                seq: cur.seq.wrapping_add(1),
                claimed: false,
                pending: true,
            }))
        };
        let (Ok(prev) | Err(prev)) =
            self.word
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, update);

        let before = unpack(prev);
        let shed = before.pending && !before.claimed;
        if shed {
            self.missed.fetch_add(1, Ordering::Relaxed);
        }
        let tick = update(prev).map_or(0, |w| unpack(w).tick);
        Pulse { tick, shed }
    }

    /// Current state word, decoded.
    pub fn snapshot(&self) -> Snapshot {
        unpack(self.word.load(Ordering::Acquire))
    }

    /// Current tick value.
    pub fn tick(&self) -> u16 {
        self.snapshot().tick
    }

    /// Whether a pulse is waiting for dispatch.
    pub fn is_pending(&self) -> bool {
        self.snapshot().pending
    }

    /// Pending ticks overwritten by a newer pulse before the dispatcher
    /// claimed them.
    pub fn missed_ticks(&self) -> u32 {
        self.missed.load(Ordering::Relaxed)
    }

    /// Claim the pending dispatch, if any.  The flag stays raised until
    /// [`complete`](Self::complete); a pulse landing from here on no longer
    /// counts the claimed tick as missed.
    pub(crate) fn take(&self) -> Option<Claim> {
        let prev = self
            .word
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let cur = unpack(word);
                cur.pending.then(|| pack(Snapshot { claimed: true, ..cur }))
            })
            .ok()?;
        let snap = unpack(prev);
        Some(Claim {
            tick: snap.tick,
            seq: snap.seq,
        })
    }

    /// Clear the flag for `claim`, resetting a rollover tick to 0.
    ///
    /// Only succeeds if no pulse landed since `take`; otherwise the newer
    /// tick stays pending and unclaimed.
    pub(crate) fn complete(&self, claim: Claim) -> Completion {
        let expected = pack(Snapshot {
            tick: claim.tick,
            seq: claim.seq,
            claimed: true,
            pending: true,
        });
        let tick = if claim.tick >= self.period { 0 } else { claim.tick };
        let cleared = pack(Snapshot {
            tick,
            seq: claim.seq,
            claimed: false,
            pending: false,
        });

        match self
            .word
            .compare_exchange(expected, cleared, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Completion::Clean,
            Err(actual) => {
                let pulses = unpack(actual).seq.wrapping_sub(claim.seq) & SEQ_MASK as u16;
                // A whole sequence cycle reads as 0.
                Completion::Overrun {
                    pulses: pulses.max(1),
                }
            }
        }
    }
}
