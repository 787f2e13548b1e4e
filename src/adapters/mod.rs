//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements  | Connects to                          |
//! |------------|-------------|--------------------------------------|
//! | `hardware` | LockPort    | relay GPIOs, LED PWM channels        |
//! |            | InputPort   | open and service button GPIOs        |
//! | `log_sink` | EventSink   | Serial log output                    |

pub mod hardware;
pub mod log_sink;
