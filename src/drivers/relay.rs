//! Lock relay output.
//!
//! One coil of the bolt actuator, driven through a GPIO (directly or via a
//! transistor stage).  The pin can be active-high (default board) or
//! active-low.

use embedded_hal::digital::OutputPin;
use log::warn;

/// Relay output over any `embedded-hal` output pin.
pub struct RelayOutput<P> {
    pin: P,
    /// If true, relay ON = pin LOW
    inverted: bool,
    /// Current logical state (true = energised)
    on: bool,
    name: &'static str,
}

impl<P: OutputPin> RelayOutput<P> {
    /// Create a relay output and force it off.
    pub fn new(pin: P, inverted: bool, name: &'static str) -> Self {
        let mut relay = Self {
            pin,
            inverted,
            on: true,
            name,
        };
        relay.set(false);
        relay
    }

    pub fn active_high(pin: P, name: &'static str) -> Self {
        Self::new(pin, false, name)
    }

    pub fn active_low(pin: P, name: &'static str) -> Self {
        Self::new(pin, true, name)
    }

    /// Energise or release the coil.  Repeating the current level is a
    /// no-op on the pin.
    pub fn set(&mut self, on: bool) {
        if on == self.on {
            return;
        }
        let result = if on != self.inverted {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.on = on,
            Err(e) => warn!("relay {}: pin write failed: {:?}", self.name, e),
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
