//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (relays, buttons, indicator, event sinks) implement these
//! traits.  The [`Controller`](super::service::Controller) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::drivers::indicator::Indicator;

// ───────────────────────────────────────────────────────────────
// Lock port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive the lock.
///
/// Every call is idempotent and side-effect only.  Pin errors are the
/// adapter's problem; they never reach the domain.
pub trait LockPort {
    /// Energise (`true`) or release the relay that retracts the bolt.
    fn set_open_relay(&mut self, on: bool);

    /// Energise (`true`) or release the relay that throws the bolt.
    fn set_close_relay(&mut self, on: bool);

    /// Select the indicator pattern.
    fn set_indicator(&mut self, indicator: Indicator);
}

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One debounced reading of the operator inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSample {
    /// The open button (or presence sensor) is active.
    pub open_requested: bool,
    /// The service button is held down.
    pub service_held: bool,
}

/// Read-side port: sampled once per loop iteration.
pub trait InputPort {
    fn sample(&mut self) -> InputSample;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`DoorEvent`](super::events::DoorEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::DoorEvent);
}
