//! Lock peripherals: relays, buttons, indicator LEDs and the tick timer.

pub mod button;
pub mod hw_timer;
pub mod indicator;
pub mod relay;
