//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured door events to the
//! ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::DoorEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`DoorEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &DoorEvent) {
        match event {
            DoorEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
            DoorEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            DoorEvent::OpenDeferred => {
                info!("INPUT | open deferred until locked");
            }
            DoorEvent::HoldExtended => {
                info!("INPUT | hold extended");
            }
            DoorEvent::ScheduleRejected(state) => {
                warn!("SCHED | no room for {} tasks, retrying", state);
            }
            DoorEvent::ServiceModeEntered => {
                warn!("SERVICE | latched, cycling lock");
            }
        }
    }
}
