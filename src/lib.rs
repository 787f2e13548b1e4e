//! Door-lock relay firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod fsm;
pub mod scheduler;

// Hardware-facing modules compile on the host too; only the tick timer
// has ESP-IDF-specific code.
pub mod adapters;
pub mod drivers;
