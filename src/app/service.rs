//! Application service: the lock controller loop body.
//!
//! [`Controller`] owns the task table, the door machine and the service
//! button detector.  It exposes one loop body, [`Controller::tick`]; all
//! I/O flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!   InputPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │       Controller          │
//!   LockPort  ◀── │ Scheduler · DoorMachine   │
//!                 └──────────────────────────┘
//! ```

use log::{debug, info};

use crate::clock::Instant;
use crate::config::DoorConfig;
use crate::drivers::button::HoldDetector;
use crate::error::ConfigError;
use crate::fsm::context::TaskTable;
use crate::fsm::{DoorMachine, DoorState};

use super::events::DoorEvent;
use super::ports::{EventSink, InputPort, LockPort};

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// The main-loop body of the lock controller.
pub struct Controller {
    config: DoorConfig,
    scheduler: TaskTable,
    machine: DoorMachine,
    service_button: HoldDetector,
    /// Latest time handed to the scheduler; never moves backwards.
    last_now: Instant,
    tick_count: u64,
}

impl Controller {
    /// Construct the controller from a validated configuration.
    ///
    /// Does **not** drive any output; call [`start`](Self::start) next.
    pub fn new(config: DoorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        // Booting into Closing throws the bolt, so the lock always starts
        // from a known position.
        let initial = if config.lock_on_boot {
            DoorState::Closing
        } else {
            DoorState::Closed
        };

        Ok(Self {
            config,
            scheduler: TaskTable::new(),
            machine: DoorMachine::new(config, initial),
            service_button: HoldDetector::new(config.service_hold_ms),
            last_now: Instant::ZERO,
            tick_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Anchor the scheduler at `now` and enter the initial state.
    pub fn start(&mut self, now: Instant, hw: &mut impl LockPort, sink: &mut impl EventSink) {
        self.last_now = now;
        self.scheduler.resync(now);
        self.machine.start(&mut self.scheduler, hw, sink);
        sink.emit(&DoorEvent::Started(self.machine.current_state()));
        info!(
            "Controller started in {} at {}ms",
            self.machine.current_state(),
            now.as_millis()
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration: poll due tasks → sample inputs → service
    /// button → deferred entry retry → request arbitration.
    ///
    /// `hw` implements both [`LockPort`] and [`InputPort`] behind a single
    /// mutable borrow.
    pub fn tick(
        &mut self,
        now: Instant,
        hw: &mut (impl LockPort + InputPort),
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Monotonic time
        let now = if now.has_reached(self.last_now) {
            now
        } else {
            debug!(
                "clock went backwards ({} < {}), holding",
                now.as_millis(),
                self.last_now.as_millis()
            );
            self.last_now
        };
        let elapsed = now.millis_since(self.last_now);
        self.last_now = now;

        // 2. Due tasks
        let machine = &mut self.machine;
        self.scheduler
            .poll(now, |sched, action| machine.apply(action, sched, hw, sink));

        // 3. Inputs
        let input = hw.sample();

        // 4. Service button (re-attempted until the machine accepts it)
        self.service_button.update(input.service_held, elapsed);
        if self.service_button.is_latched() && !self.machine.in_service_mode() {
            self.machine
                .enter_service_mode(&mut self.scheduler, hw, sink);
        }

        // 5. Entry that ran out of slots last time
        self.machine.retry_deferred(&mut self.scheduler, hw, sink);

        // 6. Arbitration
        self.machine
            .request_open(input.open_requested, &mut self.scheduler, hw, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current door state.
    pub fn state(&self) -> DoorState {
        self.machine.current_state()
    }

    /// Whether a press during Closing is waiting to be honoured.
    pub fn pending_open(&self) -> bool {
        self.machine.pending_open()
    }

    pub fn in_service_mode(&self) -> bool {
        self.machine.in_service_mode()
    }

    /// Live tasks in the scheduler.
    pub fn scheduled_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    /// Loop iterations executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &DoorConfig {
        &self.config
    }
}
