//! Mock hardware adapter for integration tests.
//!
//! Records every lock call with the simulated time it happened at, so
//! tests can assert on the full command history without touching real
//! GPIO/PWM registers.

use doorlock::app::events::DoorEvent;
use doorlock::app::ports::{EventSink, InputPort, InputSample, LockPort};
use doorlock::app::service::Controller;
use doorlock::clock::Instant;
use doorlock::config::DoorConfig;
use doorlock::drivers::indicator::Indicator;
use doorlock::fsm::DoorState;

// ── Lock call record ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCall {
    OpenRelay(bool),
    CloseRelay(bool),
    Indicator(Indicator),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub now_ms: u32,
    pub calls: Vec<(u32, LockCall)>,
    pub input: InputSample,
    pub open_relay: bool,
    pub close_relay: bool,
    pub open_pulses: usize,
    pub close_pulses: usize,
    /// Set if both relays were ever energised together.
    pub overlap: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            calls: Vec::new(),
            input: InputSample::default(),
            open_relay: false,
            close_relay: false,
            open_pulses: 0,
            close_pulses: 0,
            overlap: false,
        }
    }

    pub fn last_indicator(&self) -> Option<Indicator> {
        self.calls.iter().rev().find_map(|(_, c)| match c {
            LockCall::Indicator(i) => Some(*i),
            _ => None,
        })
    }

    /// Times at which the open relay was energised.
    pub fn open_rises(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter(|(_, c)| *c == LockCall::OpenRelay(true))
            .map(|(t, _)| *t)
            .collect()
    }

    pub fn reset_counts(&mut self) {
        self.open_pulses = 0;
        self.close_pulses = 0;
        self.calls.clear();
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl LockPort for MockHardware {
    fn set_open_relay(&mut self, on: bool) {
        if on && !self.open_relay {
            self.open_pulses += 1;
        }
        self.open_relay = on;
        self.overlap |= self.open_relay && self.close_relay;
        self.calls.push((self.now_ms, LockCall::OpenRelay(on)));
    }

    fn set_close_relay(&mut self, on: bool) {
        if on && !self.close_relay {
            self.close_pulses += 1;
        }
        self.close_relay = on;
        self.overlap |= self.open_relay && self.close_relay;
        self.calls.push((self.now_ms, LockCall::CloseRelay(on)));
    }

    fn set_indicator(&mut self, indicator: Indicator) {
        self.calls.push((self.now_ms, LockCall::Indicator(indicator)));
    }
}

impl InputPort for MockHardware {
    fn sample(&mut self) -> InputSample {
        self.input
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<(u32, DoorEvent)>,
    pub now_ms: u32,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, event: DoorEvent) -> usize {
        self.events.iter().filter(|(_, e)| *e == event).count()
    }

    /// Sequence of states entered, in order.
    pub fn states_entered(&self) -> Vec<DoorState> {
        self.events
            .iter()
            .filter_map(|(_, e)| match e {
                DoorEvent::StateChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &DoorEvent) {
        self.events.push((self.now_ms, *event));
    }
}

// ── Simulation harness ────────────────────────────────────────

/// Short timings so whole cycles fit in a few hundred simulated ms.
#[allow(dead_code)]
pub fn test_config() -> DoorConfig {
    DoorConfig {
        pulse_width_ms: 10,
        pulse_gap_ms: 5,
        open_ticks: 3,
        close_ticks: 2,
        open_hold_ms: 100,
        lock_on_boot: false,
        service_hold_ms: 50,
        service_interval_ms: 20,
        ..DoorConfig::default()
    }
}

/// Controller plus mocks, driven one millisecond per step.
pub struct Sim {
    pub ctl: Controller,
    pub hw: MockHardware,
    pub sink: RecordingSink,
    pub now: u32,
}

#[allow(dead_code)]
impl Sim {
    /// Build and start at t=0.
    pub fn new(config: DoorConfig) -> Self {
        Self::new_at(config, 0)
    }

    /// Build and start at `t0` ms.
    pub fn new_at(config: DoorConfig, t0: u32) -> Self {
        let mut sim = Self {
            ctl: Controller::new(config).expect("valid test config"),
            hw: MockHardware::new(),
            sink: RecordingSink::default(),
            now: t0,
        };
        sim.hw.now_ms = t0;
        sim.sink.now_ms = t0;
        sim.ctl
            .start(Instant::from_millis(t0), &mut sim.hw, &mut sim.sink);
        sim
    }

    /// One loop iteration at the current time, then advance 1 ms.
    pub fn step(&mut self) {
        self.hw.now_ms = self.now;
        self.sink.now_ms = self.now;
        self.ctl
            .tick(Instant::from_millis(self.now), &mut self.hw, &mut self.sink);
        self.now = self.now.wrapping_add(1);
    }

    pub fn run_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.step();
        }
    }

    /// Hold the open button for `ms` steps, then release.
    pub fn press(&mut self, ms: u32) {
        self.hw.input.open_requested = true;
        self.run_ms(ms);
        self.hw.input.open_requested = false;
    }

    /// Hold the service button for `ms` steps, then release.
    pub fn hold_service(&mut self, ms: u32) {
        self.hw.input.service_held = true;
        self.run_ms(ms);
        self.hw.input.service_held = false;
    }

    /// Step until the controller reports `state`; returns the loop time at
    /// which it first did.
    pub fn run_until(&mut self, state: DoorState, limit_ms: u32) -> Option<u32> {
        for _ in 0..limit_ms {
            let t = self.now;
            self.step();
            if self.ctl.state() == state {
                return Some(t);
            }
        }
        None
    }
}
