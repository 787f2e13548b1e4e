//! HardwareAdapter over mock `embedded-hal` pins.
//!
//! Pins share their level with the test through `Rc<Cell<_>>`, so the
//! test can press buttons and watch relay outputs while the adapter owns
//! the pin objects.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

use doorlock::adapters::hardware::HardwareAdapter;
use doorlock::adapters::log_sink::LogEventSink;
use doorlock::app::ports::{InputPort, LockPort};
use doorlock::app::service::Controller;
use doorlock::clock::{Instant, SystemClock};
use doorlock::drivers::button::{ButtonInput, Polarity};
use doorlock::drivers::indicator::{Indicator, IndicatorEngine, IndicatorLeds};
use doorlock::drivers::relay::RelayOutput;
use doorlock::fsm::DoorState;

use super::mock_hw::test_config;

// ── Shared mock pins ──────────────────────────────────────────

#[derive(Clone, Default)]
struct SharedPin(Rc<Cell<bool>>);

impl SharedPin {
    fn high(level: bool) -> Self {
        Self(Rc::new(Cell::new(level)))
    }

    fn is_set_high(&self) -> bool {
        self.0.get()
    }

    fn drive(&self, level: bool) {
        self.0.set(level);
    }
}

impl digital::ErrorType for SharedPin {
    type Error = Infallible;
}

impl OutputPin for SharedPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

impl InputPin for SharedPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

#[derive(Clone, Default)]
struct SharedPwm(Rc<Cell<u16>>);

impl pwm::ErrorType for SharedPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SharedPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.0.set(duty);
        Ok(())
    }
}

struct Board {
    open_relay: SharedPin,
    close_relay: SharedPin,
    button: SharedPin,
    service: SharedPin,
    red: SharedPwm,
    green: SharedPwm,
}

type Adapter =
    HardwareAdapter<SharedPin, SharedPin, SharedPin, SharedPin, SharedPwm, SharedPwm>;

fn build() -> (Board, Adapter) {
    let board = Board {
        open_relay: SharedPin::default(),
        close_relay: SharedPin::default(),
        button: SharedPin::high(false),
        // Active-low: idle high.
        service: SharedPin::high(true),
        red: SharedPwm::default(),
        green: SharedPwm::default(),
    };
    let config = test_config();
    let hw = HardwareAdapter::new(
        RelayOutput::active_high(board.open_relay.clone(), "open"),
        RelayOutput::active_high(board.close_relay.clone(), "close"),
        ButtonInput::new(board.button.clone(), Polarity::ActiveHigh),
        ButtonInput::new(board.service.clone(), Polarity::ActiveLow),
        IndicatorEngine::new(
            config.indicator_fade_ms,
            config.indicator_dead_ms,
            config.indicator_max_level,
        ),
        IndicatorLeds::new(board.red.clone(), board.green.clone()),
    );
    (board, hw)
}

// ── Tests ─────────────────────────────────────────────────────

#[test]
fn sample_applies_button_polarity() {
    let (board, mut hw) = build();
    let idle = hw.sample();
    assert!(!idle.open_requested);
    assert!(!idle.service_held);

    board.button.drive(true);
    board.service.drive(false);
    let pressed = hw.sample();
    assert!(pressed.open_requested);
    assert!(pressed.service_held);
}

#[test]
fn relays_are_interlocked() {
    let (board, mut hw) = build();
    hw.set_open_relay(true);
    hw.set_close_relay(true);
    assert!(!board.open_relay.is_set_high());
    assert!(board.close_relay.is_set_high());
    assert_eq!(hw.relays(), (false, true));
}

#[test]
fn controller_drives_pins_through_a_cycle() {
    let (board, mut hw) = build();
    let clock = SystemClock::new();
    let mut sink = LogEventSink::new();
    let mut ctl = Controller::new(test_config()).unwrap();
    ctl.start(clock.now(), &mut hw, &mut sink);

    board.button.drive(true);
    let mut saw_open_pin_high = false;
    for _ in 0..60 {
        ctl.tick(clock.now(), &mut hw, &mut sink);
        hw.update_leds(1);
        board.button.drive(false);
        saw_open_pin_high |= board.open_relay.is_set_high();
        assert!(
            !(board.open_relay.is_set_high() && board.close_relay.is_set_high()),
            "both coils energised"
        );
        clock.advance();
    }

    assert!(saw_open_pin_high);
    assert_eq!(ctl.state(), DoorState::Open);
    assert_eq!(hw.indicator(), Indicator::Unlocked);
    assert!(!board.open_relay.is_set_high());
    assert_eq!(board.red.0.get(), 0);
}

#[test]
fn unlocked_indicator_breathes_green() {
    let (board, mut hw) = build();
    hw.set_indicator(Indicator::Unlocked);
    let config = test_config();
    let levels = hw.update_leds(config.indicator_fade_ms / 2);
    assert_eq!(levels.green, config.indicator_max_level);
    assert_eq!(board.green.0.get(), u16::from(config.indicator_max_level));
    assert_eq!(board.red.0.get(), 0);
}

#[test]
fn simulated_clock_set_and_advance() {
    let clock = SystemClock::new();
    clock.set(Instant::from_millis(1_000));
    clock.advance_by(5);
    assert_eq!(clock.now(), Instant::from_millis(1_005));
}
