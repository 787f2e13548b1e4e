//! Scheduled actions and the context threaded through state entry handlers.
//!
//! `Action` is the tagged variant stored in every scheduler slot.
//! `EntryContext` is what an entry handler may touch: the task table, the
//! set of handles the machine owns, the configuration, and the lock
//! outputs.

use heapless::Vec;

use crate::app::ports::LockPort;
use crate::config::{DoorConfig, TASK_CAPACITY};
use crate::error::ScheduleError;
use crate::scheduler::{Scheduler, TaskHandle};

use super::DoorState;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The two lock actuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relay {
    /// Retracts the bolt.
    Open,
    /// Throws the bolt.
    Close,
}

/// Every side effect the scheduler can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Energise or release one relay.
    SetRelay { relay: Relay, energised: bool },
    /// Terminal task: enter the given state.
    Transition(DoorState),
    /// One step of the service-mode lock/unlock cycle.
    ServiceToggle,
}

/// The task table sized for the door controller.
pub type TaskTable = Scheduler<Action, TASK_CAPACITY>;

/// Handles of every task the machine scheduled for the current phase.
pub type Inflight = Vec<TaskHandle, TASK_CAPACITY>;

// ---------------------------------------------------------------------------
// EntryContext
// ---------------------------------------------------------------------------

/// Borrowed view handed to each state's entry handler.
pub struct EntryContext<'a> {
    pub config: &'a DoorConfig,
    pub scheduler: &'a mut TaskTable,
    pub inflight: &'a mut Inflight,
    pub lock: &'a mut dyn LockPort,
    /// Service mode drives Open → Closing itself; no hold timer.
    pub service_mode: bool,
}

impl EntryContext<'_> {
    /// Schedule a task and remember its handle.
    pub fn schedule(&mut self, action: Action, delay_ms: u32) -> Result<TaskHandle, ScheduleError> {
        track(self.scheduler, self.inflight, action, delay_ms)
    }

    /// Drive one relay directly.
    pub fn set_relay(&mut self, relay: Relay, on: bool) {
        match relay {
            Relay::Open => self.lock.set_open_relay(on),
            Relay::Close => self.lock.set_close_relay(on),
        }
    }

    /// Release both relays.
    pub fn release_relays(&mut self) {
        self.lock.set_open_relay(false);
        self.lock.set_close_relay(false);
    }
}

/// Schedule a one-shot task and record its handle in `inflight`.
pub(crate) fn track(
    scheduler: &mut TaskTable,
    inflight: &mut Inflight,
    action: Action,
    delay_ms: u32,
) -> Result<TaskHandle, ScheduleError> {
    let handle = scheduler.schedule(action, delay_ms, None)?;
    if let Err(handle) = inflight.push(handle) {
        scheduler.cancel(handle);
        return Err(ScheduleError::CapacityExceeded);
    }
    Ok(handle)
}

/// Cancel everything in `inflight`.  Handles that already fired are
/// skipped by the scheduler.
pub(crate) fn cancel_inflight(scheduler: &mut TaskTable, inflight: &mut Inflight) {
    for &handle in inflight.iter() {
        scheduler.cancel(handle);
    }
    inflight.clear();
}
