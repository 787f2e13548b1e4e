//! Two-colour lock indicator.
//!
//! Generates time-varying red/green levels for the indicator LEDs.  The
//! main loop calls [`IndicatorEngine::tick`] each control cycle and feeds
//! the result to [`IndicatorLeds::write`].
//!
//! ## Patterns
//!
//! | Indicator          | Red                    | Green                  |
//! |--------------------|------------------------|------------------------|
//! | Locked             | breathing + dead time  | off                    |
//! | Unlocking          | off                    | fast blink (4 Hz)      |
//! | Unlocked           | off                    | breathing + dead time  |
//! | Locking            | fast blink (4 Hz)      | off                    |
//! | Service{unlocked}  | solid                  | solid while unlocked   |

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

/// What the indicator should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Locked,
    Unlocking,
    Unlocked,
    Locking,
    /// Service mode; green mirrors the bolt position.
    Service { unlocked: bool },
}

/// Red and green brightness, each 0–255.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Levels {
    pub red: u8,
    pub green: u8,
}

const BLINK_PERIOD_MS: u32 = 250;

/// Indicator pattern engine. Stack-allocated, no heap.
pub struct IndicatorEngine {
    fade_ms: u32,
    dead_ms: u32,
    max_level: u8,
    phase_ms: u32,
    active: Indicator,
}

impl IndicatorEngine {
    /// `fade_ms` is one full ramp up and down, `dead_ms` the dark pause
    /// after it.
    pub fn new(fade_ms: u32, dead_ms: u32, max_level: u8) -> Self {
        Self {
            fade_ms: fade_ms.max(2),
            dead_ms,
            max_level,
            phase_ms: 0,
            active: Indicator::Locked,
        }
    }

    /// Select a pattern.  The phase restarts only when the pattern changes.
    pub fn set(&mut self, indicator: Indicator) {
        if indicator != self.active {
            self.active = indicator;
            self.phase_ms = 0;
        }
    }

    pub fn active(&self) -> Indicator {
        self.active
    }

    /// Advance the pattern phase and return the current levels.
    /// `delta_ms` is the time since the last call.
    pub fn tick(&mut self, delta_ms: u32) -> Levels {
        self.phase_ms = self.phase_ms.wrapping_add(delta_ms);
        self.levels()
    }

    /// Levels at the current phase without advancing.
    pub fn levels(&self) -> Levels {
        let max = self.max_level;
        match self.active {
            Indicator::Locked => Levels {
                red: self.breathe(),
                green: 0,
            },
            Indicator::Unlocked => Levels {
                red: 0,
                green: self.breathe(),
            },
            Indicator::Unlocking => Levels {
                red: 0,
                green: self.blink(),
            },
            Indicator::Locking => Levels {
                red: self.blink(),
                green: 0,
            },
            Indicator::Service { unlocked } => Levels {
                red: max,
                green: if unlocked { max } else { 0 },
            },
        }
    }

    fn blink(&self) -> u8 {
        if self.phase_ms % BLINK_PERIOD_MS < BLINK_PERIOD_MS / 2 {
            self.max_level
        } else {
            0
        }
    }

    /// Triangular ramp 0→max→0 over `fade_ms`, then dark for `dead_ms`.
    fn breathe(&self) -> u8 {
        let cycle = self.fade_ms + self.dead_ms;
        let pos = u64::from(self.phase_ms % cycle);
        let fade = u64::from(self.fade_ms);
        if pos >= fade {
            return 0;
        }
        let half = fade / 2;
        let max = u64::from(self.max_level);
        let level = if pos < half {
            pos * max / half
        } else {
            (fade - pos) * max / half
        };
        level.min(max) as u8
    }
}

// ---------------------------------------------------------------------------
// PWM output
// ---------------------------------------------------------------------------

/// The two indicator LEDs on PWM channels.
pub struct IndicatorLeds<R, G> {
    red: R,
    green: G,
    last: Option<Levels>,
}

impl<R: SetDutyCycle, G: SetDutyCycle> IndicatorLeds<R, G> {
    pub fn new(red: R, green: G) -> Self {
        Self {
            red,
            green,
            last: None,
        }
    }

    /// Write levels to both channels.  Unchanged levels are not rewritten.
    pub fn write(&mut self, levels: Levels) {
        if self.last == Some(levels) {
            return;
        }
        if let Err(e) = self.red.set_duty_cycle_fraction(u16::from(levels.red), 255) {
            warn!("red LED duty write failed: {:?}", e);
        }
        if let Err(e) = self.green.set_duty_cycle_fraction(u16::from(levels.green), 255) {
            warn!("green LED duty write failed: {:?}", e);
        }
        self.last = Some(levels);
    }
}
