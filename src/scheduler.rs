//! Cooperative task scheduler.
//!
//! A fixed-capacity table of deferred or repeating actions keyed by
//! absolute due time.  The control loop calls [`Scheduler::poll`] once per
//! iteration; every task whose due time has been reached runs exactly once
//! in that call.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  slot │ gen │ action               │ due     │ repeat         │
//! ├───────┼─────┼──────────────────────┼─────────┼────────────────┤
//! │   0   │  3  │ SetRelay(Open, on)   │ 10_250  │ none           │
//! │   1   │  1  │ (free)               │         │                │
//! │   2   │  7  │ Transition(Open)     │ 10_750  │ none           │
//! │   3   │  0  │ ServiceToggle        │ 12_750  │ 2_750 ms       │
//! └──────────────────────────────────────────────────────────────┘
//!        TaskHandle = (slot, gen)   ── stale gen ⇒ cancel is a no-op
//! ```
//!
//! Actions are plain `Copy` values, so the table needs no heap and no
//! function pointers.  What an action *does* is decided by the closure
//! handed to `poll`.

use log::{debug, warn};

use crate::clock::{Instant, MAX_DELAY_MS};
use crate::error::ScheduleError;

// ═══════════════════════════════════════════════════════════════
//  Task types
// ═══════════════════════════════════════════════════════════════

/// Opaque reference to a scheduled task.
///
/// Carries the slot's generation at scheduling time, so a handle outlives
/// its task harmlessly: once the slot is freed (fired or cancelled) and
/// reused, the old handle no longer matches anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    slot: u8,
    generation: u16,
}

impl TaskHandle {
    /// Slot index inside the task table.
    pub fn slot(self) -> usize {
        self.slot as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct Task<A> {
    action: A,
    due: Instant,
    repeat_ms: Option<u32>,
    /// Created or re-armed since the current poll began.
    fresh: bool,
}

#[derive(Debug, Clone, Copy)]
struct Slot<A> {
    generation: u16,
    task: Option<Task<A>>,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// The scheduler engine.
///
/// Owns `N` task slots for its whole lifetime.  Callers only ever hold
/// [`TaskHandle`]s.
pub struct Scheduler<A: Copy, const N: usize> {
    slots: [Slot<A>; N],
    /// Time of the most recent poll; "now" for `schedule`.
    now: Instant,
}

impl<A: Copy + core::fmt::Debug, const N: usize> Scheduler<A, N> {
    const SLOTS_FIT_HANDLE: () = assert!(N > 0 && N <= u8::MAX as usize);

    pub fn new() -> Self {
        let () = Self::SLOTS_FIT_HANDLE;
        Self {
            slots: [Slot {
                generation: 0,
                task: None,
            }; N],
            now: Instant::ZERO,
        }
    }

    /// Set "now" without running anything.  Used once at start-up.
    pub fn resync(&mut self, now: Instant) {
        self.now = now;
    }

    /// The scheduler's current notion of "now".
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Schedule `action` to run `delay_ms` after now, optionally
    /// repeating every `repeat_ms` thereafter.
    ///
    /// A delay of 0 makes the task eligible on the next poll.  Fails with
    /// [`ScheduleError::CapacityExceeded`] when every slot is live; an
    /// active task is never overwritten.  Delays and intervals above
    /// [`MAX_DELAY_MS`] fail with [`ScheduleError::DelayTooLong`].
    pub fn schedule(
        &mut self,
        action: A,
        delay_ms: u32,
        repeat_ms: Option<u32>,
    ) -> Result<TaskHandle, ScheduleError> {
        if delay_ms > MAX_DELAY_MS || repeat_ms.is_some_and(|r| r > MAX_DELAY_MS) {
            warn!("Scheduler: {:?} delay {}ms out of range", action, delay_ms);
            return Err(ScheduleError::DelayTooLong);
        }
        let Some(index) = self.slots.iter().position(|s| s.task.is_none()) else {
            warn!("Scheduler: table full, dropping {:?}", action);
            return Err(ScheduleError::CapacityExceeded);
        };

        let due = self.now.after(delay_ms);
        let slot = &mut self.slots[index];
        slot.task = Some(Task {
            action,
            due,
            repeat_ms,
            fresh: true,
        });
        debug!(
            "Scheduler: {:?} at slot {} due {}ms",
            action,
            index,
            due.as_millis()
        );

        Ok(TaskHandle {
            slot: index as u8,
            generation: slot.generation,
        })
    }

    /// Cancel a task.  Cancelling a task that already fired, was already
    /// cancelled, or never existed does nothing.
    pub fn cancel(&mut self, handle: TaskHandle) {
        let Some(slot) = self.slots.get_mut(handle.slot()) else {
            return;
        };
        if slot.generation == handle.generation && slot.task.is_some() {
            Self::free(slot);
        }
    }

    /// Cancel every live task.
    pub fn cancel_all(&mut self) {
        for slot in &mut self.slots {
            if slot.task.is_some() {
                Self::free(slot);
            }
        }
    }

    /// Run every task due at `now`.
    ///
    /// Only tasks that were live when the poll began are considered.  Each
    /// is re-armed or freed *before* `run` sees its action, so `run` may
    /// freely schedule or cancel through the `&mut Self` it receives.
    /// Tasks it schedules wait for the next poll; tasks it cancels never
    /// run.  Returns the number of actions run.
    pub fn poll<F>(&mut self, now: Instant, mut run: F) -> usize
    where
        F: FnMut(&mut Self, A),
    {
        self.now = now;
        for task in self.slots.iter_mut().filter_map(|s| s.task.as_mut()) {
            task.fresh = false;
        }
        let mut fired = 0;

        for index in 0..N {
            let Some(task) = self.slots[index].task else {
                continue;
            };
            if task.fresh || !now.has_reached(task.due) {
                continue;
            }

            let slot = &mut self.slots[index];
            match task.repeat_ms {
                Some(interval) => {
                    slot.task = Some(Task {
                        due: task.due.after(interval),
                        fresh: true,
                        ..task
                    });
                }
                None => Self::free(slot),
            }

            run(self, task.action);
            fired += 1;
        }

        fired
    }

    /// Whether `handle` still refers to a live task.
    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.slots
            .get(handle.slot())
            .is_some_and(|s| s.generation == handle.generation && s.task.is_some())
    }

    /// Number of live tasks.
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|s| s.task.is_some()).count()
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        N - self.pending()
    }

    /// Total slot count.
    pub const fn capacity(&self) -> usize {
        N
    }

    fn free(slot: &mut Slot<A>) {
        slot.task = None;
        slot.generation = slot.generation.wrapping_add(1);
    }
}

impl<A: Copy + core::fmt::Debug, const N: usize> Default for Scheduler<A, N> {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
