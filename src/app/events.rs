//! Outbound application events.
//!
//! The [`Controller`](super::service::Controller) and the door machine emit
//! these through the [`EventSink`](super::ports::EventSink) port.

use crate::fsm::DoorState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorEvent {
    /// The controller has started (carries initial state).
    Started(DoorState),

    /// The door machine transitioned between states.
    StateChanged { from: DoorState, to: DoorState },

    /// A press arrived while locking; it will be honoured once Closed.
    OpenDeferred,

    /// A press while Open restarted the hold timer.
    HoldExtended,

    /// Not enough free task slots to schedule work for the given state.
    /// Retried on the next loop iteration.
    ScheduleRejected(DoorState),

    /// The service button was held long enough to latch service mode.
    ServiceModeEntered,
}
