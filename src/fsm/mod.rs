//! Door state machine driven by scheduler tasks.
//!
//! Classic embedded table-driven FSM:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  StateTable                                          │
//! │  ┌──────────┬────────────┬─────────────────────────┐ │
//! │  │ DoorState│ indicator  │ on_enter                │ │
//! │  ├──────────┼────────────┼─────────────────────────┤ │
//! │  │ Closed   │ Locked     │ fn(ctx) -> Result<..>   │ │
//! │  │ Opening  │ Unlocking  │ fn(ctx) -> Result<..>   │ │
//! │  │ Open     │ Unlocked   │ fn(ctx) -> Result<..>   │ │
//! │  │ Closing  │ Locking    │ fn(ctx) -> Result<..>   │ │
//! │  └──────────┴────────────┴─────────────────────────┘ │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! State changes happen only in [`DoorMachine::apply`] when a scheduled
//! [`Action::Transition`] fires.  The input path
//! ([`DoorMachine::request_open`]) never switches state directly; it
//! schedules, cancels or defers tasks.  That separation is what lets an
//! Open hold timer be cancelled and re-armed cleanly.

pub mod context;
pub mod states;

use core::fmt;

use log::{debug, info, warn};

use crate::app::events::DoorEvent;
use crate::app::ports::{EventSink, LockPort};
use crate::config::DoorConfig;
use crate::drivers::indicator::Indicator;
use crate::error::ScheduleError;
use crate::scheduler::TaskHandle;
use context::{Action, EntryContext, Inflight, Relay, TaskTable, cancel_inflight, track};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// The four lock states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DoorState {
    Closed = 0,
    Opening = 1,
    Open = 2,
    Closing = 3,
}

impl DoorState {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 4;

    pub const ALL: [DoorState; Self::COUNT] = [
        DoorState::Closed,
        DoorState::Opening,
        DoorState::Open,
        DoorState::Closing,
    ];
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "Closed",
            Self::Opening => "Opening",
            Self::Open => "Open",
            Self::Closing => "Closing",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Entry handler.  Runs once each time the state is entered.  An `Err`
/// means the state's tasks could not all be scheduled; the machine rolls
/// back and retries on the next loop iteration.
pub type StateEntryFn = fn(&mut EntryContext<'_>) -> Result<(), ScheduleError>;

/// Static descriptor for a single door state.
pub struct StateDescriptor {
    pub id: DoorState,
    pub name: &'static str,
    pub indicator: Indicator,
    pub on_enter: StateEntryFn,
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// The door state machine.
///
/// Owns the state table, the current state, and the handles of every task
/// it has scheduled for the current phase.  The task table itself belongs
/// to the caller and is lent in on every call.
pub struct DoorMachine {
    table: [StateDescriptor; DoorState::COUNT],
    config: DoorConfig,
    current: DoorState,
    /// Every task this machine scheduled since the last transition.
    inflight: Inflight,
    /// Outstanding `Transition(Opening)` scheduled from Closed.
    start_task: Option<TaskHandle>,
    /// Repeating service-mode toggle.
    service_task: Option<TaskHandle>,
    /// Press seen during Closing; honoured once Closed.
    pending_open: bool,
    /// State whose entry ran out of task slots.
    deferred_entry: Option<DoorState>,
    service_mode: bool,
    /// Last sampled button level, for edge-triggered events.
    was_pressed: bool,
}

impl DoorMachine {
    /// Construct a machine that will start in `initial`.  Nothing runs
    /// until [`start`](Self::start).
    pub fn new(config: DoorConfig, initial: DoorState) -> Self {
        let table = states::build_state_table();
        debug_assert!(table.iter().enumerate().all(|(i, d)| d.id as usize == i));
        Self {
            table,
            config,
            current: initial,
            inflight: Inflight::new(),
            start_task: None,
            service_task: None,
            pending_open: false,
            deferred_entry: None,
            service_mode: false,
            was_pressed: false,
        }
    }

    /// Run the entry handler of the initial state.
    pub fn start(
        &mut self,
        scheduler: &mut TaskTable,
        lock: &mut impl LockPort,
        sink: &mut impl EventSink,
    ) {
        info!("Door FSM starting in state: {}", self.name(self.current));
        self.enter(self.current, scheduler, lock, sink);
    }

    // -----------------------------------------------------------------------
    // Scheduled actions
    // -----------------------------------------------------------------------

    /// Execute one action handed out by [`TaskTable::poll`].
    pub fn apply(
        &mut self,
        action: Action,
        scheduler: &mut TaskTable,
        lock: &mut impl LockPort,
        sink: &mut impl EventSink,
    ) {
        match action {
            Action::SetRelay { relay, energised } => match relay {
                Relay::Open => lock.set_open_relay(energised),
                Relay::Close => lock.set_close_relay(energised),
            },
            Action::Transition(next) => self.transition(next, scheduler, lock, sink),
            Action::ServiceToggle => self.service_toggle(scheduler, lock, sink),
        }
    }

    // -----------------------------------------------------------------------
    // Request arbitration
    // -----------------------------------------------------------------------

    /// Arbitrate the sampled button level against the current state.
    /// Called once per loop iteration, after the scheduler poll.
    pub fn request_open(
        &mut self,
        pressed: bool,
        scheduler: &mut TaskTable,
        lock: &mut impl LockPort,
        sink: &mut impl EventSink,
    ) {
        let rising = pressed && !self.was_pressed;
        self.was_pressed = pressed;

        if self.service_mode {
            return;
        }

        match self.current {
            DoorState::Closed => {
                if !(pressed || self.pending_open) || self.start_pending(scheduler) {
                    return;
                }
                match track(
                    scheduler,
                    &mut self.inflight,
                    Action::Transition(DoorState::Opening),
                    0,
                ) {
                    Ok(handle) => {
                        if self.pending_open {
                            info!("CLOSED: honouring open request deferred during Closing");
                        }
                        self.start_task = Some(handle);
                        self.pending_open = false;
                    }
                    Err(e) => {
                        warn!("CLOSED: open request not scheduled ({}), retrying", e);
                        sink.emit(&DoorEvent::ScheduleRejected(DoorState::Opening));
                    }
                }
            }

            // A burst in flight is never restarted.
            DoorState::Opening => {}

            DoorState::Open => {
                if !pressed {
                    return;
                }
                // Renewed presence: drop the pending close (hold task and
                // anything else queued for this phase) and start the hold
                // over from now.
                cancel_inflight(scheduler, &mut self.inflight);
                let hold = self.config.open_hold_ms;
                match track(
                    scheduler,
                    &mut self.inflight,
                    Action::Transition(DoorState::Closing),
                    hold,
                ) {
                    Ok(_) => {
                        self.deferred_entry = None;
                        if rising {
                            debug!("OPEN: hold reset to {}ms", hold);
                            sink.emit(&DoorEvent::HoldExtended);
                        }
                    }
                    Err(e) => {
                        warn!("OPEN: hold timer not re-armed ({}), retrying", e);
                        self.deferred_entry = Some(DoorState::Open);
                        sink.emit(&DoorEvent::ScheduleRejected(DoorState::Open));
                    }
                }
            }

            // A half-thrown bolt always finishes locking first.
            DoorState::Closing => {
                if pressed && !self.pending_open {
                    self.pending_open = true;
                    info!("CLOSING: open request deferred until locked");
                    sink.emit(&DoorEvent::OpenDeferred);
                }
            }
        }
    }

    /// Re-run an entry handler that previously ran out of task slots.
    /// Called once per loop iteration, before arbitration.
    pub fn retry_deferred(
        &mut self,
        scheduler: &mut TaskTable,
        lock: &mut impl LockPort,
        sink: &mut impl EventSink,
    ) {
        let Some(state) = self.deferred_entry else {
            return;
        };
        if state != self.current {
            self.deferred_entry = None;
            return;
        }
        debug!("{}: retrying deferred entry", self.name(state));
        self.enter(state, scheduler, lock, sink);
    }

    // -----------------------------------------------------------------------
    // Service mode
    // -----------------------------------------------------------------------

    /// Latch service mode: drop every pending task and start cycling the
    /// lock on a repeating timer.  Idempotent.
    ///
    /// Needs one free slot once the machine's own tasks are cancelled.
    /// Without it nothing changes and the caller retries on a later loop
    /// iteration.
    pub fn enter_service_mode(
        &mut self,
        scheduler: &mut TaskTable,
        lock: &mut impl LockPort,
        sink: &mut impl EventSink,
    ) {
        if self.service_mode {
            return;
        }

        let reclaimable = self
            .inflight
            .iter()
            .filter(|h| scheduler.is_scheduled(**h))
            .count();
        if scheduler.available() + reclaimable == 0 {
            warn!("SERVICE: no free task slot, will retry");
            sink.emit(&DoorEvent::ScheduleRejected(self.current));
            return;
        }

        cancel_inflight(scheduler, &mut self.inflight);
        self.start_task = None;
        self.pending_open = false;
        self.deferred_entry = None;
        lock.set_open_relay(false);
        lock.set_close_relay(false);

        let period = self.config.service_period_ms();
        match scheduler.schedule(Action::ServiceToggle, 0, Some(period)) {
            Ok(handle) => {
                self.service_task = Some(handle);
                self.service_mode = true;
                lock.set_indicator(self.indicator_for(self.current));
                warn!("SERVICE: mode latched, cycling every {}ms", period);
                sink.emit(&DoorEvent::ServiceModeEntered);
            }
            Err(e) => {
                // The phase's tasks are gone; re-enter the state next loop.
                warn!("SERVICE: toggle not scheduled ({}), will retry", e);
                self.deferred_entry = Some(self.current);
                sink.emit(&DoorEvent::ScheduleRejected(self.current));
            }
        }
    }

    fn service_toggle(
        &mut self,
        scheduler: &mut TaskTable,
        lock: &mut impl LockPort,
        sink: &mut impl EventSink,
    ) {
        let next = match self.current {
            DoorState::Closed | DoorState::Closing => DoorState::Opening,
            DoorState::Open | DoorState::Opening => DoorState::Closing,
        };
        info!("SERVICE: toggle -> {}", self.name(next));
        self.transition(next, scheduler, lock, sink);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The current state.
    pub fn current_state(&self) -> DoorState {
        self.current
    }

    /// Whether a press during Closing is waiting to be honoured.
    pub fn pending_open(&self) -> bool {
        self.pending_open
    }

    pub fn in_service_mode(&self) -> bool {
        self.service_mode
    }

    /// Whether an entry is waiting for free task slots.
    pub fn has_deferred_entry(&self) -> bool {
        self.deferred_entry.is_some()
    }

    /// Handles scheduled for the current phase (some may have fired).
    pub fn inflight(&self) -> &[TaskHandle] {
        &self.inflight
    }

    /// The repeating service toggle, once service mode is latched.
    pub fn service_task(&self) -> Option<TaskHandle> {
        self.service_task
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn name(&self, state: DoorState) -> &'static str {
        self.table[state as usize].name
    }

    fn start_pending(&self, scheduler: &TaskTable) -> bool {
        self.start_task.is_some_and(|h| scheduler.is_scheduled(h))
    }

    fn indicator_for(&self, state: DoorState) -> Indicator {
        if self.service_mode {
            Indicator::Service {
                unlocked: matches!(state, DoorState::Open | DoorState::Closing),
            }
        } else {
            self.table[state as usize].indicator
        }
    }

    fn transition(
        &mut self,
        next: DoorState,
        scheduler: &mut TaskTable,
        lock: &mut impl LockPort,
        sink: &mut impl EventSink,
    ) {
        let from = self.current;
        info!("Door transition: {} -> {}", self.name(from), self.name(next));

        // Whatever is left of the previous phase must not fire into the new one.
        cancel_inflight(scheduler, &mut self.inflight);
        self.start_task = None;
        self.current = next;
        sink.emit(&DoorEvent::StateChanged { from, to: next });

        self.enter(next, scheduler, lock, sink);
    }

    fn enter(
        &mut self,
        state: DoorState,
        scheduler: &mut TaskTable,
        lock: &mut impl LockPort,
        sink: &mut impl EventSink,
    ) {
        self.deferred_entry = None;
        lock.set_indicator(self.indicator_for(state));

        let on_enter = self.table[state as usize].on_enter;
        let mut ctx = EntryContext {
            config: &self.config,
            scheduler: &mut *scheduler,
            inflight: &mut self.inflight,
            lock: &mut *lock,
            service_mode: self.service_mode,
        };
        let result = on_enter(&mut ctx);

        if let Err(e) = result {
            cancel_inflight(scheduler, &mut self.inflight);
            lock.set_open_relay(false);
            lock.set_close_relay(false);
            warn!("{}: entry failed ({}), retrying next loop", self.name(state), e);
            self.deferred_entry = Some(state);
            sink.emit(&DoorEvent::ScheduleRejected(state));
        }
    }
}
