//! Door-lock configuration parameters
//!
//! All tunable parameters for the lock controller.  Values are fixed at
//! build time through [`DoorConfig::default`]; nothing is mutable at run
//! time.

use serde::{Deserialize, Serialize};

use crate::clock::MAX_DELAY_MS;

/// Upper bound on pulses per burst.  Bounds worst-case scheduler occupancy.
pub const MAX_BURST_TICKS: u8 = 5;

/// Task-table capacity: one full burst (at most two tasks per pulse plus
/// the terminal transition) and headroom for the start, hold and service
/// tasks.
pub const TASK_CAPACITY: usize = 2 * MAX_BURST_TICKS as usize + 4;

/// Core lock configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorConfig {
    // --- Relay bursts ---
    /// How long each relay pulse stays energised (milliseconds)
    pub pulse_width_ms: u32,
    /// Dead time between consecutive pulses (milliseconds)
    pub pulse_gap_ms: u32,
    /// Pulses per unlock burst (1..=MAX_BURST_TICKS)
    pub open_ticks: u8,
    /// Pulses per lock burst (1..=MAX_BURST_TICKS)
    pub close_ticks: u8,

    // --- Hold ---
    /// How long the door stays unlocked after the last press (milliseconds)
    pub open_hold_ms: u32,
    /// Lock the door at boot so the bolt starts in a known position
    pub lock_on_boot: bool,

    // --- Service mode ---
    /// Service button hold time before service mode latches (milliseconds)
    pub service_hold_ms: u32,
    /// Pause between automatic lock/unlock cycles in service mode (milliseconds)
    pub service_interval_ms: u32,

    // --- Indicator ---
    /// One fade up + fade down of the breathing pattern (milliseconds)
    pub indicator_fade_ms: u32,
    /// Dark pause after each breath (milliseconds)
    pub indicator_dead_ms: u32,
    /// Maximum LED brightness (0-255)
    pub indicator_max_level: u8,

    // --- Timing ---
    /// Control loop period (milliseconds)
    pub loop_interval_ms: u32,
}

impl DoorConfig {
    /// Build-time defaults.
    pub const DEFAULT: Self = Self {
        // Relay bursts
        pulse_width_ms: 150,
        pulse_gap_ms: 100,
        open_ticks: 3,
        close_ticks: 3,

        // Hold
        open_hold_ms: 60_000, // 1 min
        lock_on_boot: true,

        // Service mode
        service_hold_ms: 5_000,
        service_interval_ms: 2_000,

        // Indicator
        indicator_fade_ms: 2_000,
        indicator_dead_ms: 1_000,
        indicator_max_level: 255,

        // Timing
        loop_interval_ms: 1, // 1 kHz
    };

    /// Total length of a burst of `ticks` pulses, terminal included.
    /// Saturates; [`validate`](Self::validate) keeps real values in range.
    pub const fn burst_duration_ms(&self, ticks: u8) -> u32 {
        (ticks as u32).saturating_mul(self.pulse_width_ms.saturating_add(self.pulse_gap_ms))
    }

    /// Length of the longer of the two bursts.
    pub const fn longest_burst_ms(&self) -> u32 {
        let open = self.burst_duration_ms(self.open_ticks);
        let close = self.burst_duration_ms(self.close_ticks);
        if open > close { open } else { close }
    }

    /// Period of the repeating service-mode toggle: a full burst plus the
    /// configured pause.
    pub const fn service_period_ms(&self) -> u32 {
        self.longest_burst_ms().saturating_add(self.service_interval_ms)
    }

    /// Reject parameter combinations the scheduler or state machine cannot
    /// honour.
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        use crate::error::ConfigError::ValidationFailed;

        if self.pulse_width_ms == 0 {
            return Err(ValidationFailed("pulse_width_ms must be > 0"));
        }
        // A zero gap would put a pulse's disable and the next enable on the
        // same millisecond, where task order is unspecified.
        if self.pulse_gap_ms == 0 {
            return Err(ValidationFailed("pulse_gap_ms must be > 0"));
        }
        if self.open_ticks == 0 || self.open_ticks > MAX_BURST_TICKS {
            return Err(ValidationFailed("open_ticks must be 1..=MAX_BURST_TICKS"));
        }
        if self.close_ticks == 0 || self.close_ticks > MAX_BURST_TICKS {
            return Err(ValidationFailed("close_ticks must be 1..=MAX_BURST_TICKS"));
        }
        if self.open_hold_ms == 0 {
            return Err(ValidationFailed("open_hold_ms must be > 0"));
        }

        // Every scheduled delay must stay inside the clock's ordering range.
        let in_range = |ms: Option<u32>| ms.is_some_and(|ms| ms <= MAX_DELAY_MS);
        let period = self.pulse_width_ms.checked_add(self.pulse_gap_ms);
        if !in_range(period) {
            return Err(ValidationFailed("pulse_width_ms + pulse_gap_ms out of range"));
        }
        let ticks = u32::from(self.open_ticks.max(self.close_ticks));
        let burst = period.and_then(|p| p.checked_mul(ticks));
        if !in_range(burst) {
            return Err(ValidationFailed("burst duration out of range"));
        }
        if self.open_hold_ms > MAX_DELAY_MS {
            return Err(ValidationFailed("open_hold_ms out of range"));
        }
        if !in_range(burst.and_then(|b| b.checked_add(self.service_interval_ms))) {
            return Err(ValidationFailed("service period out of range"));
        }

        if self.open_hold_ms < self.longest_burst_ms() {
            return Err(ValidationFailed("open_hold_ms must cover a full burst"));
        }
        if self.service_interval_ms == 0 {
            return Err(ValidationFailed("service_interval_ms must be > 0"));
        }
        if self.indicator_fade_ms < 2 {
            return Err(ValidationFailed("indicator_fade_ms must be >= 2"));
        }
        if self.loop_interval_ms == 0 {
            return Err(ValidationFailed("loop_interval_ms must be > 0"));
        }
        Ok(())
    }
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
