//! Push-button inputs and the service-button hold detector.
//!
//! ## Hardware
//!
//! | Input          | Level        | Notes                              |
//! |----------------|--------------|------------------------------------|
//! | Open button    | active-high  | push button or presence contact    |
//! | Service button | active-low   | boot button on the controller PCB  |
//!
//! Samples are taken once per control loop iteration and treated as
//! already debounced.  The service button is additionally integrated by
//! [`HoldDetector`], which rejects contact bounce on its own.

use embedded_hal::digital::InputPin;
use log::{info, warn};

/// Electrical level that means "pressed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

/// A button read through any `embedded-hal` input pin.
pub struct ButtonInput<P> {
    pin: P,
    polarity: Polarity,
}

impl<P: InputPin> ButtonInput<P> {
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Self { pin, polarity }
    }

    /// Current level.  A failed read counts as "not pressed".
    pub fn is_pressed(&mut self) -> bool {
        let level = match self.polarity {
            Polarity::ActiveHigh => self.pin.is_high(),
            Polarity::ActiveLow => self.pin.is_low(),
        };
        level.unwrap_or_else(|e| {
            warn!("button read failed: {:?}", e);
            false
        })
    }
}

// ---------------------------------------------------------------------------
// HoldDetector
// ---------------------------------------------------------------------------

/// Integrating hold counter.
///
/// While held, the elapsed time is added; while released it is subtracted
/// (saturating at zero) instead of reset, so a bouncing contact still
/// accumulates.  Latches once the counter exceeds the threshold and stays
/// latched until [`reset`](Self::reset).
#[derive(Debug, Clone, Copy)]
pub struct HoldDetector {
    threshold_ms: u32,
    held_ms: u32,
    latched: bool,
}

impl HoldDetector {
    pub const fn new(threshold_ms: u32) -> Self {
        Self {
            threshold_ms,
            held_ms: 0,
            latched: false,
        }
    }

    /// Feed one sample covering `elapsed_ms`.  Returns `true` exactly once,
    /// on the update that latches.
    pub fn update(&mut self, held: bool, elapsed_ms: u32) -> bool {
        if self.latched {
            return false;
        }
        if held {
            self.held_ms = self.held_ms.saturating_add(elapsed_ms);
        } else {
            self.held_ms = self.held_ms.saturating_sub(elapsed_ms);
        }
        if self.held_ms > self.threshold_ms {
            self.latched = true;
            info!("service button held {}ms, latched", self.held_ms);
            return true;
        }
        false
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Accumulated hold time.
    pub fn held_ms(&self) -> u32 {
        self.held_ms
    }

    pub fn reset(&mut self) {
        self.held_ms = 0;
        self.latched = false;
    }
}
