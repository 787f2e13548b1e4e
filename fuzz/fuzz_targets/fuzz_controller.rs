//! Fuzz target: `Controller::tick` under arbitrary inputs and clock jitter
//!
//! Each input byte is one loop iteration: low nibble is the clock step,
//! bit 4 the open button, bit 5 the service button.  Checks:
//! - No panics
//! - The open and close relays are never energised together
//! - Scheduled tasks never exceed `TASK_CAPACITY`
//!
//! cargo fuzz run fuzz_controller

#![no_main]

use libfuzzer_sys::fuzz_target;
use doorlock::app::events::DoorEvent;
use doorlock::app::ports::{EventSink, InputPort, InputSample, LockPort};
use doorlock::app::service::Controller;
use doorlock::clock::Instant;
use doorlock::config::{DoorConfig, TASK_CAPACITY};
use doorlock::drivers::indicator::Indicator;

#[derive(Default)]
struct Board {
    input: InputSample,
    open: bool,
    close: bool,
}

impl LockPort for Board {
    fn set_open_relay(&mut self, on: bool) {
        self.open = on;
        assert!(!(self.open && self.close), "relay overlap");
    }
    fn set_close_relay(&mut self, on: bool) {
        self.close = on;
        assert!(!(self.open && self.close), "relay overlap");
    }
    fn set_indicator(&mut self, _: Indicator) {}
}

impl InputPort for Board {
    fn sample(&mut self) -> InputSample {
        self.input
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _: &DoorEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let config = DoorConfig {
        pulse_width_ms: 4,
        pulse_gap_ms: 2,
        open_ticks: 2,
        close_ticks: 2,
        open_hold_ms: 30,
        service_hold_ms: 20,
        service_interval_ms: 8,
        ..DoorConfig::default()
    };
    let Ok(mut ctl) = Controller::new(config) else {
        return;
    };
    let mut board = Board::default();
    let mut now = u32::MAX - 64;
    ctl.start(Instant::from_millis(now), &mut board, &mut Discard);

    for b in data {
        now = now.wrapping_add(u32::from(b & 0x0F));
        board.input.open_requested = b & 0x10 != 0;
        board.input.service_held = b & 0x20 != 0;
        ctl.tick(Instant::from_millis(now), &mut board, &mut Discard);
        assert!(ctl.scheduled_tasks() <= TASK_CAPACITY);
    }
});
