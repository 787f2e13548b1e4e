//! Millisecond clock source.
//!
//! A periodic 1 ms timer interrupt calls [`SystemClock::advance`]; the
//! control loop reads [`SystemClock::now`].  The counter is a single
//! `AtomicU32`, so the interrupt's increment and the loop's read are each
//! one untorn access on 32-bit targets and no critical section is needed.
//!
//! ```text
//!  timer ISR ──advance()──▶ SYSTEM_CLOCK ──now()──▶ Controller::tick()
//! ```
//!
//! The counter wraps after ~49.7 days.  [`Instant`] compares by signed
//! difference, so any deadline less than 2^31 ms away stays correctly
//! ordered across the wrap.

use core::sync::atomic::{AtomicU32, Ordering};

/// Longest delay that still orders correctly against "now": the signed
/// difference in [`Instant::has_reached`] only spans 2^31 - 1 ms.
pub const MAX_DELAY_MS: u32 = i32::MAX as u32;

/// Milliseconds since boot (wrapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Instant(u32);

impl Instant {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// The instant `ms` milliseconds after `self`.
    #[must_use]
    pub const fn after(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }

    /// `true` once `self` is at or past `deadline`.
    pub const fn has_reached(self, deadline: Instant) -> bool {
        (self.0.wrapping_sub(deadline.0) as i32) >= 0
    }

    /// Milliseconds from `earlier` to `self`.  Zero if `earlier` is
    /// actually later.
    pub const fn millis_since(self, earlier: Instant) -> u32 {
        let delta = self.0.wrapping_sub(earlier.0) as i32;
        if delta < 0 { 0 } else { delta as u32 }
    }
}

/// Monotonic millisecond counter shared between the timer interrupt and
/// the control loop.
pub struct SystemClock {
    millis: AtomicU32,
}

impl SystemClock {
    pub const fn new() -> Self {
        Self {
            millis: AtomicU32::new(0),
        }
    }

    /// Advance by one tick.  This is the only operation the interrupt
    /// performs.
    pub fn advance(&self) {
        self.millis.fetch_add(1, Ordering::Release);
    }

    /// Advance by `ms` ticks at once (simulated clocks).
    pub fn advance_by(&self, ms: u32) {
        self.millis.fetch_add(ms, Ordering::Release);
    }

    /// Current time.
    pub fn now(&self) -> Instant {
        Instant(self.millis.load(Ordering::Acquire))
    }

    /// Overwrite the counter.  Only for simulation and tests.
    pub fn set(&self, now: Instant) {
        self.millis.store(now.0, Ordering::Release);
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide clock advanced by [`crate::drivers::hw_timer`].
pub static SYSTEM_CLOCK: SystemClock = SystemClock::new();
