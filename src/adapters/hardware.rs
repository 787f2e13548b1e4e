//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the relay outputs, both buttons and the indicator, exposing them
//! through [`LockPort`] and [`InputPort`].  Everything is generic over
//! `embedded-hal` 1.0 traits, so the same adapter runs on ESP-IDF pin
//! drivers and on mock pins in tests.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::{InputPort, InputSample, LockPort};
use crate::drivers::button::ButtonInput;
use crate::drivers::indicator::{Indicator, IndicatorEngine, IndicatorLeds, Levels};
use crate::drivers::relay::RelayOutput;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<OP, CP, BP, SP, R, G> {
    open_relay: RelayOutput<OP>,
    close_relay: RelayOutput<CP>,
    open_button: ButtonInput<BP>,
    service_button: ButtonInput<SP>,
    indicator: IndicatorEngine,
    leds: IndicatorLeds<R, G>,
}

impl<OP, CP, BP, SP, R, G> HardwareAdapter<OP, CP, BP, SP, R, G>
where
    OP: OutputPin,
    CP: OutputPin,
    BP: InputPin,
    SP: InputPin,
    R: SetDutyCycle,
    G: SetDutyCycle,
{
    pub fn new(
        open_relay: RelayOutput<OP>,
        close_relay: RelayOutput<CP>,
        open_button: ButtonInput<BP>,
        service_button: ButtonInput<SP>,
        indicator: IndicatorEngine,
        leds: IndicatorLeds<R, G>,
    ) -> Self {
        Self {
            open_relay,
            close_relay,
            open_button,
            service_button,
            indicator,
            leds,
        }
    }

    /// Advance the indicator pattern by `delta_ms` and push the levels to
    /// the LEDs.  Called once per loop iteration, after the controller.
    pub fn update_leds(&mut self, delta_ms: u32) -> Levels {
        let levels = self.indicator.tick(delta_ms);
        self.leds.write(levels);
        levels
    }

    pub fn relays(&self) -> (bool, bool) {
        (self.open_relay.is_on(), self.close_relay.is_on())
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator.active()
    }
}

// ── LockPort implementation ───────────────────────────────────

impl<OP, CP, BP, SP, R, G> LockPort for HardwareAdapter<OP, CP, BP, SP, R, G>
where
    OP: OutputPin,
    CP: OutputPin,
    BP: InputPin,
    SP: InputPin,
    R: SetDutyCycle,
    G: SetDutyCycle,
{
    fn set_open_relay(&mut self, on: bool) {
        // Never both coils at once.
        if on {
            self.close_relay.set(false);
        }
        self.open_relay.set(on);
    }

    fn set_close_relay(&mut self, on: bool) {
        if on {
            self.open_relay.set(false);
        }
        self.close_relay.set(on);
    }

    fn set_indicator(&mut self, indicator: Indicator) {
        self.indicator.set(indicator);
    }
}

// ── InputPort implementation ──────────────────────────────────

impl<OP, CP, BP, SP, R, G> InputPort for HardwareAdapter<OP, CP, BP, SP, R, G>
where
    OP: OutputPin,
    CP: OutputPin,
    BP: InputPin,
    SP: InputPin,
    R: SetDutyCycle,
    G: SetDutyCycle,
{
    fn sample(&mut self) -> InputSample {
        InputSample {
            open_requested: self.open_button.is_pressed(),
            service_held: self.service_button.is_pressed(),
        }
    }
}
